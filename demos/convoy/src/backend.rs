//! A stand-in for the simulator's RPC session.

use std::thread;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tm_control::{Backend, BackendError, VehicleCommand};

/// Sleeps for a fixed round-trip per batch and drops a small fraction of
/// batches with a timeout, the way a loaded simulator occasionally does.
pub struct SimulatedBackend {
    round_trip:   Duration,
    failure_rate: f64,
    rng:          SmallRng,
}

impl SimulatedBackend {
    pub fn new(round_trip: Duration, failure_rate: f64, seed: u64) -> Self {
        Self {
            round_trip,
            failure_rate,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Backend for SimulatedBackend {
    fn apply_batch(&mut self, batch: &[VehicleCommand]) -> Result<(), BackendError> {
        thread::sleep(self.round_trip);
        if self.rng.gen_bool(self.failure_rate) {
            return Err(BackendError::Timeout(self.round_trip));
        }
        tracing::trace!(commands = batch.len(), "batch applied by simulator");
        Ok(())
    }
}
