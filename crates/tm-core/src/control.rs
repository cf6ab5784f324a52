//! Per-actor actuation records.

use crate::ActorId;

/// Discrete switches the backend vehicle command carries alongside the
/// three scalars.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlFlags {
    pub hand_brake: bool,
    pub reverse:    bool,
}

/// One actor's actuation for one tick.
///
/// Produced by the motion-planning stage and immutable once placed into a
/// [`Frame`][crate::Frame].  Ranges are the producer's contract:
///
/// | Field      | Range     |
/// |------------|-----------|
/// | `throttle` | `[0, 1]`  |
/// | `steer`    | `[-1, 1]` |
/// | `brake`    | `[0, 1]`  |
///
/// Downstream stages pass the values through unchanged.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorControlRecord {
    pub actor:    ActorId,
    pub throttle: f32,
    pub steer:    f32,
    pub brake:    f32,
    pub flags:    ControlFlags,
}

impl ActorControlRecord {
    pub fn new(actor: ActorId, throttle: f32, steer: f32, brake: f32) -> Self {
        Self {
            actor,
            throttle,
            steer,
            brake,
            flags: ControlFlags::default(),
        }
    }

    pub fn with_hand_brake(mut self, on: bool) -> Self {
        self.flags.hand_brake = on;
        self
    }

    pub fn with_reverse(mut self, on: bool) -> Self {
        self.flags.reverse = on;
        self
    }

    /// True if every scalar lies within its documented range.  NaN is out of
    /// range.
    pub fn is_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.throttle)
            && (-1.0..=1.0).contains(&self.steer)
            && (0.0..=1.0).contains(&self.brake)
    }
}
