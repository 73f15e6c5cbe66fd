#![forbid(unsafe_code)]

//! Test fixtures for the slotstream binding runtime.
//!
//! - [`RecordingSlot`]: a [`TreeSlot`] that records every operation in
//!   arrival order, with a configurable [`SlotKind`] for misuse tests.
//! - [`ManualSource`]: a hand-driven [`Source`] that deliberately does NOT
//!   support cancellation — every callback ever subscribed stays live, so
//!   tests can deliver late emissions through superseded subscriptions and
//!   exercise the binder's staleness filter directly.
//!
//! Emitting on a [`ManualSource`] holds a borrow of its callback list for
//! the whole delivery, so callbacks must not subscribe to the same source
//! re-entrantly; use the runtime's `Emitter` when that matters.

use std::cell::RefCell;

use slotstream_core::{SlotKind, TreeSlot};
use slotstream_runtime::{Source, SourceCallback, Subscription};

/// One recorded slot operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOp<T> {
    /// `set_value` was called with this value.
    Set(T),
    /// `commit` was called.
    Commit,
    /// `clear` was called.
    Clear,
}

/// A slot that records every operation performed on it.
#[derive(Debug)]
pub struct RecordingSlot<T> {
    kind: SlotKind,
    staged: RefCell<Option<T>>,
    committed: RefCell<Option<T>>,
    ops: RefCell<Vec<SlotOp<T>>>,
}

impl<T: Clone> RecordingSlot<T> {
    /// A content slot (the kind bindings accept).
    #[must_use]
    pub fn new() -> Self {
        Self::with_kind(SlotKind::Content)
    }

    /// A slot reporting an arbitrary kind, for misuse tests.
    #[must_use]
    pub fn with_kind(kind: SlotKind) -> Self {
        Self {
            kind,
            staged: RefCell::new(None),
            committed: RefCell::new(None),
            ops: RefCell::new(Vec::new()),
        }
    }

    /// Every operation performed so far, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<SlotOp<T>> {
        self.ops.borrow().clone()
    }

    /// Number of `commit` calls.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, SlotOp::Commit))
            .count()
    }

    /// Number of `clear` calls.
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, SlotOp::Clear))
            .count()
    }
}

impl<T: Clone> Default for RecordingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TreeSlot for RecordingSlot<T> {
    type Value = T;

    fn kind(&self) -> SlotKind {
        self.kind
    }

    fn current(&self) -> Option<T> {
        self.committed.borrow().clone()
    }

    fn set_value(&self, value: T) {
        self.ops.borrow_mut().push(SlotOp::Set(value.clone()));
        *self.staged.borrow_mut() = Some(value);
    }

    fn commit(&self) {
        self.ops.borrow_mut().push(SlotOp::Commit);
        if let Some(value) = self.staged.borrow_mut().take() {
            *self.committed.borrow_mut() = Some(value);
        }
    }

    fn clear(&self) {
        self.ops.borrow_mut().push(SlotOp::Clear);
        *self.staged.borrow_mut() = None;
        *self.committed.borrow_mut() = None;
    }
}

/// A hand-driven source with no cancellation support.
///
/// `subscribe` returns `None`, so a binder superseding this source cannot
/// unsubscribe from it; its callbacks stay live until the source drops.
/// That is exactly the shape of source the staleness filter exists for.
pub struct ManualSource<T> {
    callbacks: RefCell<Vec<SourceCallback<T>>>,
}

impl<T: Clone> ManualSource<T> {
    /// A source with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
        }
    }

    /// Deliver `value` to every callback ever subscribed, in order.
    pub fn emit(&self, value: T) {
        for callback in self.callbacks.borrow_mut().iter_mut() {
            callback(value.clone());
        }
    }

    /// Total subscriptions received, superseded ones included.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

impl<T: Clone> Default for ManualSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Source<T> for ManualSource<T> {
    fn subscribe(&self, callback: SourceCallback<T>) -> Option<Subscription> {
        self.callbacks.borrow_mut().push(callback);
        None
    }
}
