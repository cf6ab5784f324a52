//! The single-slot exchange itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tm_core::{Frame, Tick};

use crate::{MessengerError, MessengerResult, Publisher, Subscriber};

/// What a consumer gets back from a pull.
#[derive(Clone, Debug)]
pub struct Pulled {
    pub frame:  Arc<Frame>,
    pub tick:   Tick,
    /// `true` if `tick` is newer than the tick the caller last saw.
    pub is_new: bool,
}

#[derive(Default)]
struct Slot {
    pending:     Option<(Arc<Frame>, Tick)>,
    /// Whether the pending frame has been handed out as new at least once.
    delivered:   bool,
    /// Frames replaced before the consumer ever saw them.
    overwritten: u64,
}

impl Slot {
    fn has_newer(&self, last_seen: Option<Tick>) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|(_, t)| t.is_newer_than(last_seen))
    }

    fn read(&mut self, last_seen: Option<Tick>) -> Option<Pulled> {
        let (frame, tick) = self.pending.as_ref()?;
        let is_new = tick.is_newer_than(last_seen);
        if is_new {
            self.delivered = true;
        }
        Some(Pulled {
            frame: Arc::clone(frame),
            tick:  *tick,
            is_new,
        })
    }
}

/// Single-producer / single-consumer, single-slot frame handoff.
///
/// Shared between its two endpoints through an `Arc`.  The lock guards only
/// an `Arc<Frame>` swap; frames are never copied and the previous frame is
/// dropped after the lock is released.
pub struct Messenger {
    name:             String,
    slot:             Mutex<Slot>,
    fresh:            Condvar,
    producer_claimed: AtomicBool,
    consumer_claimed: AtomicBool,
}

impl Messenger {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name:             name.into(),
            slot:             Mutex::new(Slot::default()),
            fresh:            Condvar::new(),
            producer_claimed: AtomicBool::new(false),
            consumer_claimed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Claim the producer endpoint.  Fails if it was already claimed.
    pub fn publisher(self: &Arc<Self>) -> MessengerResult<Publisher> {
        if self.producer_claimed.swap(true, Ordering::AcqRel) {
            return Err(MessengerError::ProducerClaimed(self.name.clone()));
        }
        tracing::debug!(messenger = %self.name, "producer attached");
        Ok(Publisher::new(Arc::clone(self)))
    }

    /// Claim the consumer endpoint.  Fails if it was already claimed.
    pub fn subscriber(self: &Arc<Self>) -> MessengerResult<Subscriber> {
        if self.consumer_claimed.swap(true, Ordering::AcqRel) {
            return Err(MessengerError::ConsumerClaimed(self.name.clone()));
        }
        tracing::debug!(messenger = %self.name, "consumer attached");
        Ok(Subscriber::new(Arc::clone(self)))
    }

    /// Store `frame` as the pending value, replacing any unconsumed one.
    ///
    /// Never waits for the consumer.  `tick` must be strictly newer than the
    /// stored tick; otherwise the frame is rejected and the slot is left as
    /// it was, so a consumer can never observe ticks going backwards.
    pub(crate) fn push(&self, frame: Arc<Frame>, tick: Tick) -> MessengerResult<()> {
        let displaced = {
            let mut slot = self.slot.lock();
            if let Some(stored) = slot.pending.as_ref().map(|(_, t)| *t) {
                if tick <= stored {
                    return Err(MessengerError::TickRegression {
                        name:   self.name.clone(),
                        pushed: tick,
                        stored,
                    });
                }
            }
            if slot.pending.is_some() && !slot.delivered {
                slot.overwritten += 1;
            }
            slot.delivered = false;
            slot.pending.replace((frame, tick))
        };
        self.fresh.notify_one();
        drop(displaced);
        Ok(())
    }

    /// Return the pending frame without waiting.
    ///
    /// `None` only if nothing has ever been pushed.
    pub(crate) fn pull(&self, last_seen: Option<Tick>) -> Option<Pulled> {
        self.slot.lock().read(last_seen)
    }

    /// Like [`pull`][Self::pull], but first wait up to `timeout` for a tick
    /// newer than `last_seen`.  On timeout the stale value is returned.
    pub(crate) fn pull_timeout(&self, last_seen: Option<Tick>, timeout: Duration) -> Option<Pulled> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        while !slot.has_newer(last_seen) {
            if self.fresh.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        slot.read(last_seen)
    }

    /// Tick of the pending frame, if any.
    pub fn latest_tick(&self) -> Option<Tick> {
        self.slot.lock().pending.as_ref().map(|(_, t)| *t)
    }

    /// How many frames were replaced before the consumer saw them.
    pub fn overwritten_count(&self) -> u64 {
        self.slot.lock().overwritten
    }
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("name", &self.name)
            .field("latest_tick", &self.latest_tick())
            .finish()
    }
}
