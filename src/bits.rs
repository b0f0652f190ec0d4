//! A [`BitSet`] for capability and state bitmaps reported by `evdev`.
//!
//! `evdev` reports present axes, supported effects, and pressed keys as arrays of `unsigned long`
//! words. [`BitSet`] stores those words directly, so that the kernel can fill them in place.

use std::{ffi::c_ulong, fmt};

/// The underlying word type used by [`BitSet`]s.
///
/// This is an `unsigned long` in C, which may vary between platforms.
pub type Word = c_ulong;

const WORD_BITS: usize = Word::BITS as usize;

/// A fixed-capacity set of `u16` codes.
#[derive(Clone, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<Word>,
}

impl BitSet {
    /// Creates an empty set that can hold the codes `0..=max`.
    pub fn with_max(max: u16) -> Self {
        Self {
            words: vec![0; (usize::from(max) + 1).div_ceil(WORD_BITS)],
        }
    }

    /// Returns the largest code this set can hold.
    pub fn max(&self) -> u16 {
        (self.words.len() * WORD_BITS - 1).min(usize::from(u16::MAX)) as u16
    }

    pub(crate) fn words_mut(&mut self) -> &mut [Word] {
        &mut self.words
    }

    /// Returns the size of the underlying word buffer in bytes.
    pub(crate) fn byte_len(&self) -> usize {
        self.words.len() * size_of::<Word>()
    }

    pub fn contains(&self, code: u16) -> bool {
        let index = usize::from(code);
        match self.words.get(index / WORD_BITS) {
            Some(word) => word & (1 << (index % WORD_BITS)) != 0,
            None => false,
        }
    }

    /// Inserts `code` into the set.
    ///
    /// Returns whether the value was newly inserted.
    ///
    /// # Panics
    ///
    /// Panics if `code` is larger than [`BitSet::max`].
    pub fn insert(&mut self, code: u16) -> bool {
        let index = usize::from(code);
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1 << (index % WORD_BITS);
        let inserted = *word & mask == 0;
        *word |= mask;
        inserted
    }

    /// Removes `code` from the set.
    ///
    /// Returns whether the value was present.
    pub fn remove(&mut self, code: u16) -> bool {
        let index = usize::from(code);
        let Some(word) = self.words.get_mut(index / WORD_BITS) else {
            return false;
        };
        let mask = 1 << (index % WORD_BITS);
        let removed = *word & mask != 0;
        *word &= !mask;
        removed
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns an iterator over all codes in the set, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| (i * WORD_BITS + bit) as u16)
        })
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove() {
        let mut set = BitSet::with_max(0x2ff);
        assert!(set.is_empty());
        assert!(set.insert(0x130));
        assert!(!set.insert(0x130));
        assert!(set.insert(1));
        assert!(set.contains(0x130));
        assert!(!set.contains(0x131));
        assert!(!set.contains(0xffff));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), [1, 0x130]);

        assert!(set.remove(1));
        assert!(!set.remove(1));
        assert!(!set.remove(0xffff));
        assert_eq!(format!("{set:?}"), "{304}");
    }

    #[test]
    fn capacity() {
        let set = BitSet::with_max(0x0f);
        assert!(set.max() >= 0x0f);
        assert_eq!(set.byte_len(), size_of::<Word>());
    }
}
