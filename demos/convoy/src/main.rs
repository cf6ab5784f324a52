//! convoy — end-to-end demo of the batched control pipeline.
//!
//! The main thread plays the simulator: every tick it publishes a frame of
//! raw per-vehicle controls.  Two relay stages (localization, motion
//! planning) and the batch-control stage each run on their own thread.
//! Halfway through, a handful of vehicles are destroyed while the simulator
//! keeps publishing controls for them, so the control stage has to skip
//! actors that are no longer registered.
//!
//! Set `RUST_LOG=debug` to see per-stage throughput lines.

mod backend;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use tm_control::{BackendError, BatchControlConfig, BatchControlStage, ControlObserver};
use tm_core::{
    ActorControlRecord, ActorId, Frame, FrameBuilder, Registry, SharedRegistry, StageConfig,
    StaleAction, StalenessPolicy, Tick,
};
use tm_messenger::Messenger;
use tm_stage::{PipelineBuilder, RelayStage};

use backend::SimulatedBackend;

// ── Constants ─────────────────────────────────────────────────────────────────

const VEHICLE_COUNT:    u32      = 500;
const TICKS:            u64      = 400;
const TICK_PERIOD:      Duration = Duration::from_millis(5);
const SEED:             u64      = 42;
const DESTROYED_AT:     u64      = TICKS / 2;
const DESTROYED_COUNT:  u32      = 25;
const BACKEND_RTT:      Duration = Duration::from_micros(300);
const BACKEND_FAILURE:  f64      = 0.01;

// ── Observer ──────────────────────────────────────────────────────────────────

/// Counts control-stage events for the end-of-run summary.
#[derive(Default)]
struct Tally {
    unknown: u64,
    reused:  u64,
    failed:  u64,
}

struct SharedTally(Arc<Mutex<Tally>>);

impl ControlObserver for SharedTally {
    fn on_unknown_actor(&mut self, _tick: Tick, _actor: ActorId) {
        self.0.lock().unknown += 1;
    }

    fn on_batch_reused(&mut self, _tick: Tick, _len: usize) {
        self.0.lock().reused += 1;
    }

    fn on_dispatch_failed(&mut self, _tick: Tick, _len: usize, _err: &BackendError) {
        self.0.lock().failed += 1;
    }
}

// ── Stage transforms ──────────────────────────────────────────────────────────

/// Localization stand-in.  Pose lookup is out of scope for the demo, so the
/// frame passes through with its records untouched.
fn localize(frame: &Frame) -> Frame {
    frame.clone()
}

/// Motion-planning stand-in: enforces the control ranges and brakes instead
/// of accelerating on hard turns.
fn plan(frame: &Frame) -> Frame {
    let mut b = FrameBuilder::with_capacity(frame.len());
    for r in frame {
        let steer = r.steer.clamp(-1.0, 1.0);
        let (throttle, brake) = if steer.abs() > 0.8 {
            (0.0, 0.3)
        } else {
            (r.throttle.clamp(0.0, 1.0), r.brake.clamp(0.0, 1.0))
        };
        // Input frame is already duplicate-free.
        let _ = b.push(ActorControlRecord::new(r.actor, throttle, steer, brake));
    }
    b.build()
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let vehicles: Vec<ActorId> = (1..=VEHICLE_COUNT).map(ActorId).collect();
    let registry = SharedRegistry::with_actors(vehicles.iter().copied());

    // ── Wiring ────────────────────────────────────────────────────────────
    let sim_to_loc = Messenger::new("sim->localization");
    let loc_to_plan = Messenger::new("localization->planner");
    let plan_to_ctl = Messenger::new("planner->control");

    let mut sim_feed = sim_to_loc.publisher()?;

    let localization = RelayStage::new(
        "localization",
        sim_to_loc.subscriber()?,
        loc_to_plan.publisher()?,
        localize,
    );
    let planner = RelayStage::new(
        "planner",
        loc_to_plan.subscriber()?,
        plan_to_ctl.publisher()?,
        plan,
    );

    let tally = Arc::new(Mutex::new(Tally::default()));
    let control = BatchControlStage::connect(
        "control",
        &plan_to_ctl,
        Arc::new(registry.clone()),
        SimulatedBackend::new(BACKEND_RTT, BACKEND_FAILURE, SEED),
        BatchControlConfig::default(),
    )?
    .with_observer(SharedTally(Arc::clone(&tally)));

    let config = StageConfig {
        receive_timeout:    TICK_PERIOD * 2,
        staleness:          StalenessPolicy::bounded(20, StaleAction::Suspend),
        stats_log_interval: 100,
    };

    let running = PipelineBuilder::new(config)
        .stage(localization)
        .stage(planner)
        .stage(control)
        .build()?
        .start()?;

    // ── Simulation loop ───────────────────────────────────────────────────
    let mut rng = SmallRng::seed_from_u64(SEED);
    let started = Instant::now();

    for t in 1..=TICKS {
        if t == DESTROYED_AT {
            for id in vehicles.iter().take(DESTROYED_COUNT as usize) {
                registry.deregister(*id);
            }
            tracing::info!(destroyed = DESTROYED_COUNT, tick = t, "vehicles destroyed");
        }

        let mut frame = FrameBuilder::with_capacity(vehicles.len());
        for &id in &vehicles {
            let record = ActorControlRecord::new(
                id,
                rng.gen_range(0.0..1.2),
                rng.gen_range(-1.0..1.0),
                0.0,
            );
            frame.push(record)?;
        }
        sim_feed.publish(frame.build(), Tick(t))?;
        thread::sleep(TICK_PERIOD);
    }

    let reports = running.stop()?;
    let elapsed = started.elapsed();

    // ── Summary ───────────────────────────────────────────────────────────
    for r in &reports {
        tracing::info!(
            stage     = %r.name,
            cycles    = r.stats.cycles,
            fresh     = r.stats.fresh,
            stale     = r.stats.stale,
            suspended = r.stats.suspended,
            "stage summary"
        );
    }
    let t = tally.lock();
    tracing::info!(
        unknown_actors = t.unknown,
        reused_batches = t.reused,
        failed_batches = t.failed,
        "control summary"
    );
    tracing::info!(
        ticks     = TICKS,
        vehicles  = VEHICLE_COUNT,
        elapsed   = ?elapsed,
        remaining = registry.count(),
        "run complete"
    );
    Ok(())
}
