//! Force-feedback effects.
//!
//! A virtual device receives effects from the kernel as [`Effect`]s, each tagged with the
//! [`EffectId`] the kernel allocated on the virtual device. The effect is then forwarded unchanged
//! (apart from the ID) to whichever physical device plays that [`EffectType`].
//!
//! Only the effect parameters needed to construct effects in code ([`Rumble`], [`Periodic`],
//! [`Constant`]) have builders here. Everything else is passed through opaquely.

use std::{fmt, mem};

use crate::raw::input::{ff_constant_effect, ff_effect, ff_periodic_effect, ff_rumble_effect};

ffi_enum! {
    /// Force feedback feature flags.
    ///
    /// These flags are advertised by devices in their `EV_FF` capability bitmap and indicate
    /// support for specific effect types, waveforms, or control mechanisms.
    pub enum Feature: u16 {
        RUMBLE     = 0x50,
        PERIODIC   = 0x51,
        CONSTANT   = 0x52,
        SPRING     = 0x53,
        FRICTION   = 0x54,
        DAMPER     = 0x55,
        INERTIA    = 0x56,
        RAMP       = 0x57,

        SQUARE     = 0x58,
        TRIANGLE   = 0x59,
        SINE       = 0x5a,
        SAW_UP     = 0x5b,
        SAW_DOWN   = 0x5c,
        CUSTOM     = 0x5d,

        /// Device supports a global force-feedback gain.
        GAIN       = 0x60,
        /// Device supports an auto-center feature.
        AUTOCENTER = 0x61,
    }
}
ffi_enum_debug!(Feature, "FF_");

impl Feature {
    /// `FF_MAX`
    pub const MAX: Self = Self(0x7f);
}

ffi_enum! {
    /// A force-feedback effect type.
    ///
    /// Every effect type has a corresponding [`Feature`] with the same code that indicates support
    /// for it.
    pub enum EffectType: u16 {
        RUMBLE   = Feature::RUMBLE.0,
        PERIODIC = Feature::PERIODIC.0,
        CONSTANT = Feature::CONSTANT.0,
        SPRING   = Feature::SPRING.0,
        FRICTION = Feature::FRICTION.0,
        DAMPER   = Feature::DAMPER.0,
        INERTIA  = Feature::INERTIA.0,
        RAMP     = Feature::RAMP.0,
    }
}
ffi_enum_debug!(EffectType, "FF_");

impl EffectType {
    /// All effect types, in code order.
    pub const ALL: [Self; 8] = [
        Self::RUMBLE,
        Self::PERIODIC,
        Self::CONSTANT,
        Self::SPRING,
        Self::FRICTION,
        Self::DAMPER,
        Self::INERTIA,
        Self::RAMP,
    ];

    /// Returns the [`EffectType`] for `code`, if it names one.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.0 == code)
    }

    /// The [`Feature`] flag that advertises support for this effect type.
    #[inline]
    pub const fn feature(self) -> Feature {
        Feature(self.0)
    }
}

ffi_enum! {
    /// List of waveform types for [`Periodic`] effects.
    pub enum Waveform: u16 {
        SQUARE   = Feature::SQUARE.0,
        TRIANGLE = Feature::TRIANGLE.0,
        SINE     = Feature::SINE.0,
        SAW_UP   = Feature::SAW_UP.0,
        SAW_DOWN = Feature::SAW_DOWN.0,
        /// Custom waveform data, stored in a buffer the effect points to.
        CUSTOM   = Feature::CUSTOM.0,
    }
}
ffi_enum_debug!(Waveform, "FF_");

/// Identifier for uploaded effects.
///
/// IDs are allocated per device by the kernel. An ID of `-1` requests allocation of a new ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectId(pub(crate) i16);

impl EffectId {
    /// The ID used when uploading a new effect.
    pub const NEW: Self = Self(-1);

    #[inline]
    pub const fn from_raw(raw: i16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i16 {
        self.0
    }

    /// Returns the ID as a slot index, or `None` for negative IDs.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

/// A force-feedback effect.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Effect {
    pub(crate) raw: ff_effect,
}

impl Effect {
    /// Creates an effect of the given type with all parameters zeroed.
    fn null(ty: EffectType) -> Self {
        let mut this: Self = unsafe { mem::zeroed() };
        this.raw.type_ = ty.0;
        this.raw.id = EffectId::NEW.0;
        this
    }

    #[inline]
    pub fn effect_type(&self) -> EffectType {
        EffectType(self.raw.type_)
    }

    #[inline]
    pub fn id(&self) -> EffectId {
        EffectId(self.raw.id)
    }

    /// Changes the [`EffectId`] stored in this [`Effect`].
    ///
    /// [`EffectId::NEW`] uploads the effect as a new one, an existing ID reconfigures an already
    /// uploaded effect.
    #[inline]
    pub fn with_id(mut self, id: EffectId) -> Self {
        self.raw.id = id.0;
        self
    }

    /// If this is a [`Periodic`] effect, returns its waveform.
    pub fn waveform(&self) -> Option<Waveform> {
        if self.effect_type() == EffectType::PERIODIC {
            // Safety: the type tag says `periodic` is the active union field.
            Some(Waveform(unsafe { self.raw.u.periodic.waveform }))
        } else {
            None
        }
    }

    /// Returns whether this effect references caller-owned custom waveform data.
    ///
    /// Such effects can't be forwarded, since the data lives in another process.
    pub fn is_custom_periodic(&self) -> bool {
        self.waveform() == Some(Waveform::CUSTOM)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("type", &self.effect_type())
            .field("id", &self.id())
            .field("waveform", &self.waveform())
            .finish_non_exhaustive()
    }
}

/// A rumble effect with a strong and a weak motor.
#[derive(Clone, Copy)]
pub struct Rumble(ff_rumble_effect);

impl Rumble {
    #[inline]
    pub const fn new(strong_magnitude: u16, weak_magnitude: u16) -> Self {
        Self(ff_rumble_effect {
            strong_magnitude,
            weak_magnitude,
        })
    }
}

impl fmt::Debug for Rumble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rumble")
            .field("strong_magnitude", &self.0.strong_magnitude)
            .field("weak_magnitude", &self.0.weak_magnitude)
            .finish()
    }
}

impl From<Rumble> for Effect {
    #[inline]
    fn from(value: Rumble) -> Self {
        let mut effect = Effect::null(EffectType::RUMBLE);
        effect.raw.u.rumble = value.0;
        effect
    }
}

/// A periodic waveform effect.
#[derive(Clone, Copy)]
pub struct Periodic(ff_periodic_effect);

impl Periodic {
    /// Creates a [`Periodic`] effect with a fixed [`Waveform`].
    ///
    /// `period` is in milliseconds.
    pub fn simple(waveform: Waveform, period: u16, magnitude: i16) -> Self {
        let mut raw: ff_periodic_effect = unsafe { mem::zeroed() };
        raw.waveform = waveform.0;
        raw.period = period;
        raw.magnitude = magnitude;
        Self(raw)
    }
}

impl fmt::Debug for Periodic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Periodic")
            .field("waveform", &Waveform(self.0.waveform))
            .field("period", &self.0.period)
            .field("magnitude", &self.0.magnitude)
            .finish_non_exhaustive()
    }
}

impl From<Periodic> for Effect {
    #[inline]
    fn from(value: Periodic) -> Self {
        let mut effect = Effect::null(EffectType::PERIODIC);
        effect.raw.u.periodic = value.0;
        effect
    }
}

/// An effect applying a constant force.
#[derive(Clone, Copy)]
pub struct Constant(ff_constant_effect);

impl Constant {
    pub fn new(level: i16) -> Self {
        let mut raw: ff_constant_effect = unsafe { mem::zeroed() };
        raw.level = level;
        Self(raw)
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constant")
            .field("level", &self.0.level)
            .finish_non_exhaustive()
    }
}

impl From<Constant> for Effect {
    #[inline]
    fn from(value: Constant) -> Self {
        let mut effect = Effect::null(EffectType::CONSTANT);
        effect.raw.u.constant = value.0;
        effect
    }
}
