//! Unit tests for tm-core.

use std::time::Duration;

use crate::{
    ActorControlRecord, ActorId, CoreError, Frame, FrameBuilder, Registry, SharedRegistry,
    StageConfig, StaleAction, StalenessPolicy, Tick,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn rec(id: u32, throttle: f32, steer: f32, brake: f32) -> ActorControlRecord {
    ActorControlRecord::new(ActorId(id), throttle, steer, brake)
}

// ── ActorId ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod id_tests {
    use super::*;

    #[test]
    fn default_is_invalid() {
        assert_eq!(ActorId::default(), ActorId::INVALID);
        assert!(!ActorId::default().is_valid());
        assert!(ActorId(7).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(ActorId(42).to_string(), "ActorId(42)");
    }

    #[test]
    fn from_raw() {
        let id: ActorId = 9u32.into();
        assert_eq!(id.raw(), 9);
    }
}

// ── Tick ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tick_tests {
    use super::*;

    #[test]
    fn next_and_add() {
        assert_eq!(Tick(3).next(), Tick(4));
        assert_eq!(Tick(3) + 5, Tick(8));
    }

    #[test]
    fn newer_than_none_is_always_true() {
        assert!(Tick::ZERO.is_newer_than(None));
    }

    #[test]
    fn newer_than_is_strict() {
        assert!(Tick(5).is_newer_than(Some(Tick(4))));
        assert!(!Tick(5).is_newer_than(Some(Tick(5))));
        assert!(!Tick(5).is_newer_than(Some(Tick(6))));
    }

    #[test]
    fn since_saturates() {
        assert_eq!(Tick(10).since(Tick(4)), 6);
        assert_eq!(Tick(4).since(Tick(10)), 0);
    }

    #[test]
    fn display() {
        assert_eq!(Tick(12).to_string(), "T12");
    }
}

// ── ActorControlRecord ────────────────────────────────────────────────────────

#[cfg(test)]
mod control_tests {
    use super::*;

    #[test]
    fn flags_default_off() {
        let r = rec(1, 0.5, 0.0, 0.0);
        assert!(!r.flags.hand_brake);
        assert!(!r.flags.reverse);
    }

    #[test]
    fn builder_flags() {
        let r = rec(1, 0.0, 0.0, 1.0).with_hand_brake(true).with_reverse(true);
        assert!(r.flags.hand_brake);
        assert!(r.flags.reverse);
    }

    #[test]
    fn range_check() {
        assert!(rec(1, 1.0, -1.0, 0.0).is_in_range());
        assert!(!rec(1, 1.2, 0.0, 0.0).is_in_range());
        assert!(!rec(1, 0.0, -1.5, 0.0).is_in_range());
        assert!(!rec(1, 0.0, 0.0, -0.1).is_in_range());
        assert!(!rec(1, f32::NAN, 0.0, 0.0).is_in_range());
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod frame_tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let frame = Frame::from_records(vec![
            rec(30, 0.5, 0.0, 0.0),
            rec(10, 0.0, 0.0, 1.0),
            rec(20, 0.8, -0.3, 0.0),
        ])
        .unwrap();
        let ids: Vec<u32> = frame.actors().map(|a| a.0).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn from_records_rejects_duplicates() {
        let err = Frame::from_records(vec![rec(1, 0.0, 0.0, 0.0), rec(1, 1.0, 0.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateActor(ActorId(1))));
    }

    #[test]
    fn get_and_contains() {
        let frame = Frame::from_records(vec![rec(1, 0.5, 0.1, 0.0)]).unwrap();
        assert_eq!(frame.get(ActorId(1)).unwrap().steer, 0.1);
        assert!(frame.contains(ActorId(1)));
        assert!(!frame.contains(ActorId(2)));
    }

    #[test]
    fn empty_frame() {
        let frame = Frame::empty();
        assert!(frame.is_empty());
        assert_eq!(frame.len(), 0);
        assert_eq!(frame.iter().count(), 0);
    }

    #[test]
    fn builder_rejects_duplicate_and_keeps_first() {
        let mut b = FrameBuilder::with_capacity(2);
        b.push(rec(5, 0.1, 0.0, 0.0)).unwrap();
        assert!(b.push(rec(5, 0.9, 0.0, 0.0)).is_err());
        let frame = b.build();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.get(ActorId(5)).unwrap().throttle, 0.1);
    }

    #[test]
    fn iterates_by_reference() {
        let frame = Frame::from_records(vec![rec(1, 0.0, 0.0, 0.0), rec(2, 0.0, 0.0, 0.0)])
            .unwrap();
        let mut n = 0;
        for _r in &frame {
            n += 1;
        }
        assert_eq!(n, 2);
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry_tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn register_and_deregister() {
        let reg = SharedRegistry::new();
        assert!(reg.register(ActorId(1)));
        assert!(!reg.register(ActorId(1)));
        assert_eq!(reg.count(), 1);
        assert!(reg.is_registered(ActorId(1)));
        assert!(reg.deregister(ActorId(1)));
        assert!(!reg.deregister(ActorId(1)));
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let owner = SharedRegistry::with_actors([ActorId(1), ActorId(2)]);
        let view = owner.clone();
        owner.deregister(ActorId(2));
        assert!(!view.is_registered(ActorId(2)));
        assert_eq!(view.count(), 1);
    }

    #[test]
    fn actors_sorted() {
        let reg = SharedRegistry::with_actors([ActorId(9), ActorId(3), ActorId(5)]);
        assert_eq!(reg.actors(), vec![ActorId(3), ActorId(5), ActorId(9)]);
        reg.clear();
        assert!(reg.actors().is_empty());
    }

    #[test]
    fn usable_as_trait_object() {
        let reg: Arc<dyn Registry> = Arc::new(SharedRegistry::with_actors([ActorId(4)]));
        assert!(reg.is_registered(ActorId(4)));
        assert_eq!(reg.count(), 1);
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn unbounded_never_exceeded() {
        assert!(!StalenessPolicy::UNBOUNDED.is_exceeded(u32::MAX));
    }

    #[test]
    fn bounded_exceeded_strictly_after_max() {
        let p = StalenessPolicy::bounded(3, StaleAction::Suspend);
        assert!(!p.is_exceeded(3));
        assert!(p.is_exceeded(4));
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = StageConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.staleness, StalenessPolicy::UNBOUNDED);
    }

    #[test]
    fn zero_timeout_rejected() {
        let cfg = StageConfig {
            receive_timeout: Duration::ZERO,
            ..StageConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
    }
}
