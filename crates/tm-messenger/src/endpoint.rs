//! The two ends of a messenger.
//!
//! Neither endpoint is `Clone`: owning one is the right to produce into, or
//! consume from, its messenger.

use std::sync::Arc;
use std::time::Duration;

use tm_core::{Frame, Tick};

use crate::{Messenger, MessengerResult, Pulled};

/// Producer side.  Obtained from [`Messenger::publisher`].
pub struct Publisher {
    messenger: Arc<Messenger>,
    last_tick: Option<Tick>,
}

impl Publisher {
    pub(crate) fn new(messenger: Arc<Messenger>) -> Self {
        Self { messenger, last_tick: None }
    }

    /// Publish `frame` for `tick`.  Accepts an owned `Frame` or an existing
    /// `Arc<Frame>`.
    pub fn publish(&mut self, frame: impl Into<Arc<Frame>>, tick: Tick) -> MessengerResult<()> {
        self.messenger.push(frame.into(), tick)?;
        self.last_tick = Some(tick);
        Ok(())
    }

    /// Tick of the last frame this publisher got accepted.
    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    pub fn messenger(&self) -> &Arc<Messenger> {
        &self.messenger
    }
}

/// Consumer side.  Obtained from [`Messenger::subscriber`].
///
/// Remembers the last tick it reported as new, so callers don't have to
/// thread `last_seen` through themselves.
pub struct Subscriber {
    messenger: Arc<Messenger>,
    last_seen: Option<Tick>,
}

impl Subscriber {
    pub(crate) fn new(messenger: Arc<Messenger>) -> Self {
        Self { messenger, last_seen: None }
    }

    /// Stateless pull against an explicit `last_seen`.  Does not update the
    /// subscriber's own bookkeeping.
    pub fn pull(&self, last_seen: Option<Tick>) -> Option<Pulled> {
        self.messenger.pull(last_seen)
    }

    /// Stateless bounded-wait pull against an explicit `last_seen`.
    pub fn pull_timeout(&self, last_seen: Option<Tick>, timeout: Duration) -> Option<Pulled> {
        self.messenger.pull_timeout(last_seen, timeout)
    }

    /// Wait up to `timeout` for a frame newer than the last one received,
    /// then return whatever is pending.
    pub fn receive(&mut self, timeout: Duration) -> Option<Pulled> {
        let pulled = self.messenger.pull_timeout(self.last_seen, timeout)?;
        self.note(&pulled);
        Some(pulled)
    }

    /// Non-waiting variant of [`receive`][Self::receive].
    pub fn try_receive(&mut self) -> Option<Pulled> {
        let pulled = self.messenger.pull(self.last_seen)?;
        self.note(&pulled);
        Some(pulled)
    }

    pub fn last_seen(&self) -> Option<Tick> {
        self.last_seen
    }

    pub fn messenger(&self) -> &Arc<Messenger> {
        &self.messenger
    }

    fn note(&mut self, pulled: &Pulled) {
        if pulled.is_new {
            self.last_seen = Some(pulled.tick);
        }
    }
}
