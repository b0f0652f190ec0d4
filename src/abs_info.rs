use std::{fmt, mem};

use crate::raw::input::input_absinfo;

/// Information about an absolute axis.
///
/// Contains the axis' current value, as well as its range.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct AbsInfo(pub(crate) input_absinfo);

impl AbsInfo {
    /// Creates a new [`AbsInfo`] with a minimum and maximum value.
    ///
    /// All other fields start out as zero.
    #[inline]
    pub const fn new(minimum: i32, maximum: i32) -> Self {
        Self(input_absinfo {
            minimum,
            maximum,
            ..unsafe { mem::zeroed() }
        })
    }

    /// Returns a copy of `self` with the given axis value.
    ///
    /// The value is not clamped to the minimum/maximum.
    #[inline]
    pub const fn with_raw_value(mut self, value: i32) -> Self {
        self.0.value = value;
        self
    }

    /// Returns the axis' current value, clamped to the valid range.
    #[inline]
    pub fn value(&self) -> i32 {
        let [min, max] = [self.minimum(), self.maximum()];
        let [min, max] = if min <= max { [min, max] } else { [max, min] };
        self.raw_value().clamp(min, max)
    }

    #[inline]
    pub const fn raw_value(&self) -> i32 {
        self.0.value
    }

    #[inline]
    pub const fn minimum(&self) -> i32 {
        self.0.minimum
    }

    #[inline]
    pub const fn maximum(&self) -> i32 {
        self.0.maximum
    }

    /// Maps the current value onto `[-1, 1]`, with [`AbsInfo::minimum`] at `-1`.
    ///
    /// Degenerate axes (where minimum and maximum coincide) read as `0`.
    pub fn normalized(&self) -> f32 {
        let (min, max) = (i64::from(self.minimum()), i64::from(self.maximum()));
        if min == max {
            return 0.0;
        }
        let value = i64::from(self.value());
        let t = (value - min) as f64 / (max - min) as f64;
        (t * 2.0 - 1.0).clamp(-1.0, 1.0) as f32
    }
}

impl fmt::Debug for AbsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsInfo")
            .field("value", &self.raw_value())
            .field("minimum", &self.minimum())
            .field("maximum", &self.maximum())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize() {
        let info = AbsInfo::new(0, 255);
        assert_eq!(info.with_raw_value(0).normalized(), -1.0);
        assert_eq!(info.with_raw_value(255).normalized(), 1.0);
        assert!(info.with_raw_value(128).normalized().abs() < 0.01);
        // out-of-range values are clamped first
        assert_eq!(info.with_raw_value(1000).normalized(), 1.0);

        let full = AbsInfo::new(-32768, 32767);
        assert_eq!(full.with_raw_value(-32768).normalized(), -1.0);
        assert_eq!(full.with_raw_value(32767).normalized(), 1.0);

        assert_eq!(AbsInfo::new(5, 5).with_raw_value(5).normalized(), 0.0);
    }
}
