//! Backend command types.

use tm_core::{ActorControlRecord, ActorId};

/// The actuation payload of one backend command.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleControl {
    pub throttle:   f32,
    pub steer:      f32,
    pub brake:      f32,
    pub hand_brake: bool,
    pub reverse:    bool,
}

impl From<&ActorControlRecord> for VehicleControl {
    /// Straight copy.  Ranges are the planner's responsibility and are not
    /// re-checked here.
    #[inline]
    fn from(r: &ActorControlRecord) -> Self {
        Self {
            throttle:   r.throttle,
            steer:      r.steer,
            brake:      r.brake,
            hand_brake: r.flags.hand_brake,
            reverse:    r.flags.reverse,
        }
    }
}

/// "Apply this control to this vehicle" — one entry of a batch.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleCommand {
    pub actor:   ActorId,
    pub control: VehicleControl,
}

impl From<&ActorControlRecord> for VehicleCommand {
    #[inline]
    fn from(r: &ActorControlRecord) -> Self {
        Self {
            actor:   r.actor,
            control: VehicleControl::from(r),
        }
    }
}

/// One tick's commands, in frame order.
pub type CommandBatch = Vec<VehicleCommand>;
