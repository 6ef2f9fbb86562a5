//! # CPU Masks
//!
//! Fixed-size CPU bitmap. A `CpuMask` is `Copy` and never allocates, so it
//! can be snapshotted and handed to firmware callbacks from atomic context.

use core::fmt;

use static_assertions::const_assert;

use super::{CpuId, MAX_CPUS};

const BITS_PER_WORD: usize = u64::BITS as usize;
const MASK_WORDS: usize = MAX_CPUS / BITS_PER_WORD;

const_assert!(MAX_CPUS % BITS_PER_WORD == 0);

/// Set of CPU ids
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CpuMask {
    words: [u64; MASK_WORDS],
}

impl CpuMask {
    /// Empty mask
    pub const fn new() -> Self {
        Self {
            words: [0; MASK_WORDS],
        }
    }

    /// Mask containing exactly `cpu`
    pub fn single(cpu: CpuId) -> Self {
        let mut mask = Self::new();
        mask.set(cpu);
        mask
    }

    /// Mask of the first `count` CPUs
    pub fn first(count: usize) -> Self {
        let mut mask = Self::new();
        for cpu in 0..count.min(MAX_CPUS) {
            mask.set(cpu as CpuId);
        }
        mask
    }

    #[inline]
    fn slot(cpu: CpuId) -> Option<(usize, u64)> {
        let cpu = cpu as usize;
        if cpu >= MAX_CPUS {
            return None;
        }
        Some((cpu / BITS_PER_WORD, 1u64 << (cpu % BITS_PER_WORD)))
    }

    /// Add a CPU. Returns `false` if the id is out of range.
    #[inline]
    pub fn set(&mut self, cpu: CpuId) -> bool {
        match Self::slot(cpu) {
            Some((word, bit)) => {
                self.words[word] |= bit;
                true
            },
            None => false,
        }
    }

    /// Remove a CPU
    #[inline]
    pub fn clear(&mut self, cpu: CpuId) {
        if let Some((word, bit)) = Self::slot(cpu) {
            self.words[word] &= !bit;
        }
    }

    /// Check membership
    #[inline]
    pub fn contains(&self, cpu: CpuId) -> bool {
        match Self::slot(cpu) {
            Some((word, bit)) => self.words[word] & bit != 0,
            None => false,
        }
    }

    /// Number of CPUs in the mask
    pub fn weight(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Check if no CPU is set
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Intersection
    pub fn and(&self, other: &Self) -> Self {
        let mut out = *self;
        for (a, b) in out.words.iter_mut().zip(other.words.iter()) {
            *a &= *b;
        }
        out
    }

    /// Union
    pub fn or(&self, other: &Self) -> Self {
        let mut out = *self;
        for (a, b) in out.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
        out
    }

    /// Check that every CPU of `self` is also in `other`
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & !b == 0)
    }

    /// Lowest 64 CPUs as a raw word, the form firmware calls take
    #[inline]
    pub const fn low_word(&self) -> u64 {
        self.words[0]
    }

    /// Iterate over set CPU ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = CpuId> + '_ {
        self.words.iter().enumerate().flat_map(|(idx, &word)| {
            let base = idx * BITS_PER_WORD;
            BitIter(word).map(move |bit| (base + bit) as CpuId)
        })
    }
}

struct BitIter(u64);

impl Iterator for BitIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(bit)
    }
}

impl FromIterator<CpuId> for CpuMask {
    fn from_iter<I: IntoIterator<Item = CpuId>>(iter: I) -> Self {
        let mut mask = Self::new();
        for cpu in iter {
            mask.set(cpu);
        }
        mask
    }
}

impl fmt::Debug for CpuMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CpuMask {
    /// Kernel cpulist format, e.g. `0-3,6`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut iter = self.iter().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}-{end}")?;
            }
        }
        Ok(())
    }
}
