//! `RelayStage` — an intermediate stage that maps one frame to the next.
//!
//! Localization, hazard detection and motion planning all have the same
//! shape from the pipeline's point of view: read a frame, derive a new one,
//! publish it under the same tick.  `RelayStage` is that shape with the
//! derivation supplied as a closure.

use std::sync::Arc;
use std::time::Duration;

use tm_core::{Frame, Tick};
use tm_messenger::{Publisher, Pulled, Subscriber};

use crate::{PipelineStage, Reception};

pub struct RelayStage<F> {
    name:      String,
    input:     Subscriber,
    output:    Publisher,
    transform: F,
    received:  Option<Pulled>,
    outgoing:  Option<(Arc<Frame>, Tick)>,
}

impl<F> RelayStage<F>
where
    F: FnMut(&Frame) -> Frame + Send + 'static,
{
    pub fn new(
        name:      impl Into<String>,
        input:     Subscriber,
        output:    Publisher,
        transform: F,
    ) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            transform,
            received: None,
            outgoing: None,
        }
    }
}

impl<F> PipelineStage for RelayStage<F>
where
    F: FnMut(&Frame) -> Frame + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn data_receiver(&mut self, timeout: Duration) -> Reception {
        self.received = self.input.receive(timeout);
        Reception::of(self.received.as_ref())
    }

    /// Only fresh input produces output; on stale input downstream keeps
    /// the frame it already holds for that tick.
    fn action(&mut self, reception: Reception) {
        self.outgoing = match (reception, &self.received) {
            (Reception::Fresh(tick), Some(pulled)) => {
                Some((Arc::new((self.transform)(&*pulled.frame)), tick))
            }
            _ => None,
        };
    }

    fn data_sender(&mut self) {
        let Some((frame, tick)) = self.outgoing.take() else {
            return;
        };
        if let Err(e) = self.output.publish(frame, tick) {
            tracing::warn!(stage = %self.name, error = %e, "relay publish rejected");
        }
    }
}
