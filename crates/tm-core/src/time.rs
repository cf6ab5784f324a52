//! Tick tokens.
//!
//! # Design
//!
//! Every frame pushed through a messenger is stamped with a `Tick`.  Stages
//! never share a clock: a consumer only compares the token it last saw with
//! the one currently stored in its upstream messenger.  Keeping the token an
//! integer makes "is this newer?" an exact O(1) comparison.

use std::fmt;

/// A monotonically increasing simulation tick counter.
///
/// Stored as `u64`: at 1,000 ticks per second a run would need ~585 million
/// years to overflow.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick immediately after `self`.
    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }

    /// True if `self` is strictly newer than `seen`.  `None` means the
    /// caller has never observed a tick, so every tick is newer.
    #[inline]
    pub fn is_newer_than(self, seen: Option<Tick>) -> bool {
        seen.is_none_or(|s| self > s)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}
