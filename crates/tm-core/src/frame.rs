//! `Frame` — the per-tick snapshot handed from one stage to the next.
//!
//! # Ownership
//!
//! A frame is built once by a stage's action phase, wrapped in an `Arc`, and
//! published to exactly one messenger.  From then on it is never mutated:
//! the consumer reads it through a shared reference and drops its `Arc` when
//! it is done.  Handoff therefore costs a pointer swap regardless of how
//! many actors the frame holds.
//!
//! # Ordering
//!
//! Records keep insertion order.  The terminal stage emits backend commands
//! in exactly this order, so whoever builds the frame decides the command
//! order the backend sees.

use crate::{ActorControlRecord, ActorId, CoreError, CoreResult, IdSet, Tick};

/// An ordered, duplicate-free set of control records for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    records: Vec<ActorControlRecord>,
}

impl Frame {
    /// A frame with no records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a frame from records already in the desired order.
    ///
    /// Fails with [`CoreError::DuplicateActor`] if an actor appears twice.
    pub fn from_records(records: Vec<ActorControlRecord>) -> CoreResult<Self> {
        let mut seen = IdSet::default();
        seen.reserve(records.len());
        for r in &records {
            if !seen.insert(r.actor) {
                return Err(CoreError::DuplicateActor(r.actor));
            }
        }
        Ok(Self { records })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ActorControlRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ActorControlRecord] {
        &self.records
    }

    /// Linear lookup.  Frames are consumed by iteration on the hot path; this
    /// is for diagnostics and tests.
    pub fn get(&self, actor: ActorId) -> Option<&ActorControlRecord> {
        self.records.iter().find(|r| r.actor == actor)
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.get(actor).is_some()
    }

    /// Actor ids in frame order.
    pub fn actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.records.iter().map(|r| r.actor)
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = &'a ActorControlRecord;
    type IntoIter = std::slice::Iter<'a, ActorControlRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── FrameBuilder ──────────────────────────────────────────────────────────────

/// Incremental frame construction with duplicate rejection.
///
/// ```rust,ignore
/// let mut b = FrameBuilder::with_capacity(registry.count());
/// for (actor, cmd) in planned {
///     b.push(ActorControlRecord::new(actor, cmd.throttle, cmd.steer, cmd.brake))?;
/// }
/// let frame = b.build();
/// ```
#[derive(Default)]
pub struct FrameBuilder {
    records: Vec<ActorControlRecord>,
    seen:    IdSet,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for `n` actors, typically the registry's current count.
    pub fn with_capacity(n: usize) -> Self {
        let mut seen = IdSet::default();
        seen.reserve(n);
        Self {
            records: Vec::with_capacity(n),
            seen,
        }
    }

    /// Append a record.  The frame is left unchanged on error.
    pub fn push(&mut self, record: ActorControlRecord) -> CoreResult<()> {
        if !self.seen.insert(record.actor) {
            return Err(CoreError::DuplicateActor(record.actor));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn build(self) -> Frame {
        Frame { records: self.records }
    }
}

// ── TickedFrame ───────────────────────────────────────────────────────────────

/// A frame together with its tick token.
///
/// In-process stages never need this — the messenger stores the token next
/// to the frame.  It exists as the serialized unit for stages that run in a
/// different process.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickedFrame {
    pub tick:  Tick,
    pub frame: Frame,
}
