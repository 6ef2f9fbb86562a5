//! # Monotonic Time
//!
//! Signed nanosecond timestamps on the monotonic clock, the unit every
//! wakeup deadline and idle-state latency is expressed in.

use core::fmt;
use core::ops::{Add, Sub};

/// Nanoseconds per microsecond
pub const NSEC_PER_USEC: i64 = 1_000;

/// Nanoseconds per second
pub const NSEC_PER_SEC: i64 = 1_000_000_000;

/// Monotonic timestamp or duration in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Ktime(i64);

impl Ktime {
    /// Zero
    pub const ZERO: Ktime = Ktime(0);

    /// "Never": no wakeup scheduled
    pub const MAX: Ktime = Ktime(i64::MAX);

    /// From nanoseconds
    #[inline]
    pub const fn from_ns(ns: i64) -> Self {
        Self(ns)
    }

    /// From microseconds (saturating)
    #[inline]
    pub const fn from_us(us: i64) -> Self {
        Self(us.saturating_mul(NSEC_PER_USEC))
    }

    /// Raw nanoseconds
    #[inline]
    pub const fn as_ns(self) -> i64 {
        self.0
    }

    /// Check for the "never" sentinel
    #[inline]
    pub const fn is_max(self) -> bool {
        self.0 == i64::MAX
    }
}

impl Add for Ktime {
    type Output = Ktime;

    fn add(self, rhs: Ktime) -> Ktime {
        Ktime(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Ktime {
    type Output = Ktime;

    fn sub(self, rhs: Ktime) -> Ktime {
        Ktime(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Ktime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            f.write_str("never")
        } else {
            write!(f, "{}ns", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(Ktime::from_us(30).as_ns(), 30_000);
        assert_eq!(Ktime::from_us(i64::MAX), Ktime::MAX);
    }

    #[test]
    fn test_saturating_arith() {
        assert_eq!(Ktime::MAX + Ktime::from_ns(1), Ktime::MAX);
        assert_eq!(Ktime::from_ns(5) - Ktime::from_ns(8), Ktime::from_ns(-3));
        assert_eq!(Ktime::from_ns(i64::MIN) - Ktime::from_ns(1), Ktime::from_ns(i64::MIN));
    }
}
