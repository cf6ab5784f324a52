//! `tm-messenger` — synchronized handoff between two adjacent stages.
//!
//! # Model
//!
//! ```text
//!   producer stage ──publish(frame, tick)──▶ [ slot: Arc<Frame>, Tick ] ──receive()──▶ consumer stage
//! ```
//!
//! A [`Messenger`] holds at most one pending frame.  Publishing overwrites it
//! and never waits on the consumer; receiving returns the pending frame with
//! an `is_new` bit telling the consumer whether it has already seen that
//! tick.  The consumer may wait a bounded time for something newer but is
//! never blocked indefinitely.
//!
//! Exactly one [`Publisher`] and one [`Subscriber`] may be claimed per
//! messenger.  A second claim is a wiring mistake and fails immediately,
//! before any stage starts cycling.
//!
//! # Crate layout
//!
//! | Module          | Contents                                           |
//! |-----------------|----------------------------------------------------|
//! | [`messenger`]   | `Messenger`, `Pulled`                              |
//! | [`endpoint`]    | `Publisher`, `Subscriber`                          |
//! | [`error`]       | `MessengerError`, `MessengerResult<T>`             |

pub mod endpoint;
pub mod error;
pub mod messenger;


pub use endpoint::{Publisher, Subscriber};
pub use error::{MessengerError, MessengerResult};
pub use messenger::{Messenger, Pulled};
