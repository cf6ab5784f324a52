//! Unit and threading tests for tm-stage.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tm_core::{ActorControlRecord, ActorId, Frame, StageConfig, StaleAction, StalenessPolicy, Tick};
use tm_messenger::Messenger;

use crate::{
    CycleOutcome, PipelineBuilder, PipelineStage, Reception, RelayStage, StageDriver, StageError,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn frame(ids: &[u32]) -> Frame {
    Frame::from_records(
        ids.iter()
            .map(|&i| ActorControlRecord::new(ActorId(i), 0.5, 0.0, 0.0))
            .collect(),
    )
    .unwrap()
}

fn fast_config() -> StageConfig {
    StageConfig {
        receive_timeout:    Duration::from_millis(1),
        staleness:          StalenessPolicy::UNBOUNDED,
        stats_log_interval: 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Receive,
    Action(Reception),
    Send,
    Stop,
}

/// A stage that replays a fixed list of receptions and logs every phase.
struct Scripted {
    name:   String,
    script: VecDeque<Reception>,
    log:    Arc<Mutex<Vec<Call>>>,
}

impl Scripted {
    fn new(name: &str, script: &[Reception]) -> (Self, Arc<Mutex<Vec<Call>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stage = Self {
            name:   name.to_owned(),
            script: script.iter().copied().collect(),
            log:    Arc::clone(&log),
        };
        (stage, log)
    }
}

impl PipelineStage for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_receiver(&mut self, _timeout: Duration) -> Reception {
        self.log.lock().unwrap().push(Call::Receive);
        self.script.pop_front().unwrap_or(Reception::Empty)
    }

    fn action(&mut self, reception: Reception) {
        self.log.lock().unwrap().push(Call::Action(reception));
    }

    fn data_sender(&mut self) {
        self.log.lock().unwrap().push(Call::Send);
    }

    fn on_stop(&mut self) {
        self.log.lock().unwrap().push(Call::Stop);
    }
}

// ── Reception ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod reception_tests {
    use super::*;

    #[test]
    fn classifies_pulls() {
        let m = Messenger::new("m");
        let mut p = m.publisher().unwrap();
        let s = m.subscriber().unwrap();
        assert_eq!(Reception::of(s.pull(None).as_ref()), Reception::Empty);

        p.publish(frame(&[1]), Tick(3)).unwrap();
        assert_eq!(Reception::of(s.pull(None).as_ref()), Reception::Fresh(Tick(3)));
        assert_eq!(Reception::of(s.pull(Some(Tick(3))).as_ref()), Reception::Stale(Tick(3)));
    }

    #[test]
    fn tick_accessor() {
        assert_eq!(Reception::Fresh(Tick(1)).tick(), Some(Tick(1)));
        assert_eq!(Reception::Stale(Tick(2)).tick(), Some(Tick(2)));
        assert_eq!(Reception::Empty.tick(), None);
        assert!(!Reception::Stale(Tick(2)).is_fresh());
    }
}

// ── StageDriver ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod driver_tests {
    use super::*;

    #[test]
    fn phases_run_in_order() {
        let (stage, log) = Scripted::new("s", &[Reception::Fresh(Tick(1))]);
        let mut driver = StageDriver::new(Box::new(stage), &fast_config());

        assert_eq!(driver.cycle(), CycleOutcome::Ran(Reception::Fresh(Tick(1))));
        assert_eq!(
            *log.lock().unwrap(),
            vec![Call::Receive, Call::Action(Reception::Fresh(Tick(1))), Call::Send]
        );
    }

    #[test]
    fn unbounded_policy_keeps_running_on_stale() {
        let script = [Reception::Stale(Tick(1)); 50];
        let (stage, _log) = Scripted::new("s", &script);
        let mut driver = StageDriver::new(Box::new(stage), &fast_config());
        for _ in 0..50 {
            assert!(matches!(driver.cycle(), CycleOutcome::Ran(_)));
        }
        assert_eq!(driver.stale_streak(), 50);
        let s = driver.stats().snapshot();
        assert_eq!(s.cycles, 50);
        assert_eq!(s.stale, 50);
        assert_eq!(s.suspended, 0);
    }

    #[test]
    fn suspend_policy_withholds_action_after_bound() {
        let script = [
            Reception::Fresh(Tick(1)),
            Reception::Stale(Tick(1)),
            Reception::Stale(Tick(1)),
            Reception::Stale(Tick(1)),
            Reception::Fresh(Tick(2)),
        ];
        let (stage, log) = Scripted::new("s", &script);
        let config = StageConfig {
            staleness: StalenessPolicy::bounded(2, StaleAction::Suspend),
            ..fast_config()
        };
        let mut driver = StageDriver::new(Box::new(stage), &config);

        assert!(matches!(driver.cycle(), CycleOutcome::Ran(_)));
        assert!(matches!(driver.cycle(), CycleOutcome::Ran(_)));
        assert!(matches!(driver.cycle(), CycleOutcome::Ran(_)));
        assert_eq!(driver.cycle(), CycleOutcome::Suspended(Reception::Stale(Tick(1))));
        assert_eq!(driver.cycle(), CycleOutcome::Ran(Reception::Fresh(Tick(2))));
        assert_eq!(driver.stale_streak(), 0);

        let actions = log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Action(_)))
            .count();
        assert_eq!(actions, 4);
        assert_eq!(driver.stats().snapshot().suspended, 1);
    }

    #[test]
    fn alert_policy_never_suspends() {
        let script = [Reception::Empty; 10];
        let (stage, _log) = Scripted::new("s", &script);
        let config = StageConfig {
            staleness: StalenessPolicy::bounded(1, StaleAction::Alert),
            ..fast_config()
        };
        let mut driver = StageDriver::new(Box::new(stage), &config);
        for _ in 0..10 {
            assert!(matches!(driver.cycle(), CycleOutcome::Ran(_)));
        }
        let s = driver.stats().snapshot();
        assert_eq!(s.empty, 10);
        assert_eq!(s.suspended, 0);
    }

    #[test]
    fn finish_calls_on_stop() {
        let (stage, log) = Scripted::new("s", &[]);
        let driver = StageDriver::new(Box::new(stage), &fast_config());
        let stage = driver.finish();
        assert_eq!(stage.name(), "s");
        assert_eq!(*log.lock().unwrap(), vec![Call::Stop]);
    }
}

// ── RelayStage ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod relay_tests {
    use super::*;

    fn drop_even(f: &Frame) -> Frame {
        Frame::from_records(f.iter().filter(|r| r.actor.0 % 2 == 1).copied().collect()).unwrap()
    }

    #[test]
    fn fresh_input_is_transformed_and_forwarded_with_same_tick() {
        let upstream = Messenger::new("up");
        let downstream = Messenger::new("down");
        let mut feed = upstream.publisher().unwrap();
        let out = downstream.subscriber().unwrap();

        let relay = RelayStage::new(
            "filter",
            upstream.subscriber().unwrap(),
            downstream.publisher().unwrap(),
            drop_even,
        );
        let mut driver = StageDriver::new(Box::new(relay), &fast_config());

        feed.publish(frame(&[1, 2, 3]), Tick(7)).unwrap();
        driver.cycle();

        let pulled = out.pull(None).unwrap();
        assert_eq!(pulled.tick, Tick(7));
        let ids: Vec<u32> = pulled.frame.actors().map(|a| a.0).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn stale_input_publishes_nothing() {
        let upstream = Messenger::new("up");
        let downstream = Messenger::new("down");
        let mut feed = upstream.publisher().unwrap();

        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let relay = RelayStage::new(
            "count",
            upstream.subscriber().unwrap(),
            downstream.publisher().unwrap(),
            move |f: &Frame| {
                *counter.lock().unwrap() += 1;
                f.clone()
            },
        );
        let mut driver = StageDriver::new(Box::new(relay), &fast_config());

        feed.publish(frame(&[1]), Tick(1)).unwrap();
        driver.cycle();
        driver.cycle();
        driver.cycle();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(downstream.latest_tick(), Some(Tick(1)));
        assert_eq!(driver.stats().snapshot().stale, 2);
    }

    #[test]
    fn empty_upstream_is_tolerated() {
        let upstream = Messenger::new("up");
        let downstream = Messenger::new("down");
        let relay = RelayStage::new(
            "idle",
            upstream.subscriber().unwrap(),
            downstream.publisher().unwrap(),
            |f: &Frame| f.clone(),
        );
        let mut driver = StageDriver::new(Box::new(relay), &fast_config());
        assert_eq!(driver.cycle(), CycleOutcome::Ran(Reception::Empty));
        assert!(downstream.latest_tick().is_none());
    }
}

// ── PipelineBuilder validation ────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn empty_pipeline_rejected() {
        let result = PipelineBuilder::new(fast_config()).build();
        assert!(matches!(result, Err(StageError::Config(_))));
    }

    #[test]
    fn duplicate_stage_names_rejected() {
        let (a, _) = Scripted::new("planner", &[]);
        let (b, _) = Scripted::new("planner", &[]);
        let result = PipelineBuilder::new(fast_config()).stage(a).stage(b).build();
        assert!(matches!(result, Err(StageError::DuplicateStage(ref n)) if n == "planner"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let (a, _) = Scripted::new("a", &[]);
        let config = StageConfig { receive_timeout: Duration::ZERO, ..fast_config() };
        let result = PipelineBuilder::new(config).stage(a).build();
        assert!(matches!(result, Err(StageError::Core(_))));
    }

    #[test]
    fn messenger_misuse_surfaces_as_stage_error() {
        let m = Messenger::new("shared");
        let _first = m.publisher().unwrap();
        let err: StageError = m.publisher().err().unwrap().into();
        assert!(matches!(err, StageError::Messenger(_)));
    }

    #[test]
    fn stage_names_in_build_order() {
        let (a, _) = Scripted::new("a", &[]);
        let (b, _) = Scripted::new("b", &[]);
        let pipeline = PipelineBuilder::new(fast_config()).stage(a).stage(b).build().unwrap();
        assert_eq!(pipeline.stage_names(), vec!["a", "b"]);
    }
}

// ── Threaded run ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    #[test]
    fn start_and_stop_joins_every_stage() {
        let (a, log_a) = Scripted::new("a", &[]);
        let (b, log_b) = Scripted::new("b", &[]);
        let running = PipelineBuilder::new(fast_config())
            .stage(a)
            .stage(b)
            .build()
            .unwrap()
            .start()
            .unwrap();

        assert!(wait_until(Duration::from_secs(5), || {
            running.stats().iter().all(|r| r.stats.cycles > 0)
        }));

        let reports = running.stop().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.stats.cycles > 0));
        assert_eq!(log_a.lock().unwrap().last(), Some(&Call::Stop));
        assert_eq!(log_b.lock().unwrap().last(), Some(&Call::Stop));
    }

    #[test]
    fn stop_lets_in_flight_cycle_finish() {
        let (a, log) = Scripted::new("a", &[]);
        let running = PipelineBuilder::new(fast_config()).stage(a).build().unwrap().start().unwrap();
        assert!(wait_until(Duration::from_secs(5), || running.stats()[0].stats.cycles > 3));
        running.stop().unwrap();

        // Every receive is followed by action and send: no cycle was cut short.
        let log = log.lock().unwrap();
        let receives = log.iter().filter(|c| **c == Call::Receive).count();
        let sends = log.iter().filter(|c| **c == Call::Send).count();
        assert_eq!(receives, sends);
    }

    #[test]
    fn frames_flow_through_two_relays() {
        let m0 = Messenger::new("source->loc");
        let m1 = Messenger::new("loc->plan");
        let m2 = Messenger::new("plan->sink");
        let mut source = m0.publisher().unwrap();
        let mut sink = m2.subscriber().unwrap();

        let loc = RelayStage::new(
            "localization",
            m0.subscriber().unwrap(),
            m1.publisher().unwrap(),
            |f: &Frame| f.clone(),
        );
        let plan = RelayStage::new(
            "planner",
            m1.subscriber().unwrap(),
            m2.publisher().unwrap(),
            |f: &Frame| {
                Frame::from_records(
                    f.iter()
                        .map(|r| ActorControlRecord::new(r.actor, 0.0, 0.0, 1.0))
                        .collect(),
                )
                .unwrap()
            },
        );

        let running = PipelineBuilder::new(fast_config())
            .stage(loc)
            .stage(plan)
            .build()
            .unwrap()
            .start()
            .unwrap();

        for t in 1..=20 {
            source.publish(frame(&[1, 2]), Tick(t)).unwrap();
            thread::sleep(Duration::from_millis(2));
        }

        let mut last = Tick::ZERO;
        let reached_end = wait_until(Duration::from_secs(5), || {
            if let Some(p) = sink.try_receive() {
                assert!(p.tick >= last);
                last = p.tick;
                assert!(p.frame.iter().all(|r| r.brake == 1.0));
            }
            last == Tick(20)
        });
        assert!(reached_end);
        running.stop().unwrap();
    }

    #[test]
    fn dropping_running_pipeline_stops_threads() {
        let (a, log) = Scripted::new("a", &[]);
        let running = PipelineBuilder::new(fast_config()).stage(a).build().unwrap().start().unwrap();
        let flag = running.shutdown_flag().clone();
        drop(running);
        assert!(flag.is_triggered());
        assert_eq!(log.lock().unwrap().last(), Some(&Call::Stop));
    }
}
