#![forbid(unsafe_code)]

//! The slot contract and a minimal concrete content slot.
//!
//! [`TreeSlot`] is the narrow interface the binding runtime uses to talk to
//! a host engine's attachment points. Writes are two-phase: [`set_value`]
//! stages a value, [`commit`] makes it visible. The host owns slot creation
//! and destruction; the runtime only reads and writes through this trait.
//!
//! [`NodeSlot`] is a self-contained content slot backed by interior
//! mutability. Hosts without their own slot storage can embed it directly;
//! it also serves as the reference implementation of the commit semantics.
//!
//! [`set_value`]: TreeSlot::set_value
//! [`commit`]: TreeSlot::commit

use std::cell::{Cell, RefCell};

/// What kind of attachment point a slot represents.
///
/// Stream bindings render into [`Content`](SlotKind::Content) slots only;
/// the other kinds exist so a binder can reject misuse at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// A child-content position in the tree (text or nested nodes).
    Content,
    /// A markup attribute position.
    Attribute,
    /// An object property position.
    Property,
    /// An event-handler position.
    EventHandler,
}

/// One attachment point in a rendering tree.
///
/// Methods take `&self`; implementations use interior mutability because
/// slots are shared via `Rc` between the host and the binding runtime.
pub trait TreeSlot {
    /// The value type this slot displays.
    type Value;

    /// Which kind of attachment point this is.
    fn kind(&self) -> SlotKind;

    /// The last value committed to this slot by anyone, if any.
    fn current(&self) -> Option<Self::Value>;

    /// Stage a value. Not visible until [`commit`](Self::commit).
    fn set_value(&self, value: Self::Value);

    /// Flush the staged value, making it the visible content.
    fn commit(&self);

    /// Drop displayed and staged content.
    fn clear(&self);
}

/// A minimal concrete content slot with staged/committed storage.
///
/// Tracks commit and clear counts so hosts (and tests) can observe write
/// traffic without wrapping the slot.
#[derive(Debug, Default)]
pub struct NodeSlot<T> {
    staged: RefCell<Option<T>>,
    committed: RefCell<Option<T>>,
    commits: Cell<u64>,
    clears: Cell<u64>,
}

impl<T: Clone> NodeSlot<T> {
    /// Create an empty content slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            staged: RefCell::new(None),
            committed: RefCell::new(None),
            commits: Cell::new(0),
            clears: Cell::new(0),
        }
    }

    /// Number of commits that actually flushed a staged value.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits.get()
    }

    /// Number of times the slot has been cleared.
    #[must_use]
    pub fn clear_count(&self) -> u64 {
        self.clears.get()
    }
}

impl<T: Clone> TreeSlot for NodeSlot<T> {
    type Value = T;

    fn kind(&self) -> SlotKind {
        SlotKind::Content
    }

    fn current(&self) -> Option<T> {
        self.committed.borrow().clone()
    }

    fn set_value(&self, value: T) {
        *self.staged.borrow_mut() = Some(value);
    }

    fn commit(&self) {
        // Commit with nothing staged is a no-op, not a clear.
        if let Some(value) = self.staged.borrow_mut().take() {
            *self.committed.borrow_mut() = Some(value);
            self.commits.set(self.commits.get() + 1);
        }
    }

    fn clear(&self) {
        *self.staged.borrow_mut() = None;
        *self.committed.borrow_mut() = None;
        self.clears.set(self.clears.get() + 1);
    }
}
