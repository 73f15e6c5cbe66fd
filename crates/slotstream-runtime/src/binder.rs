#![forbid(unsafe_code)]

//! The binding controller: one stream drives one slot, latest value wins.
//!
//! [`Binder::bind`] is invoked by the host every render pass, once per
//! attachment point, with whatever source the pass's expression produced.
//! The binder keeps a per-slot record of the active source and routes that
//! source's emissions into the slot. Three filters make arbitrary emission
//! timing safe:
//!
//! - **No-op rebind**: binding the identical source reference again does
//!   nothing, so repeated render passes never resubscribe.
//! - **Staleness**: each emission re-fetches the slot's record; if a newer
//!   binding has replaced this callback's source, the emission is
//!   discarded. Correctness never depends on the old subscription being
//!   cancelled, only on this filter.
//! - **Duplicate**: an emission equal to the binding's last-rendered value
//!   is discarded without a commit.
//!
//! An accepted emission clears the slot first if it is the binding's first
//! (the previous binding's content lingers until the new source actually
//! produces something), then stages, commits, and records the value.
//!
//! Superseding a binding also drops its [`Subscription`] guard, so sources
//! that support cancellation are unsubscribed for real; sources that do
//! not are neutralized by the staleness filter alone.
//!
//! # State machine (per slot, per binding)
//!
//! ```text
//! UNBOUND → SUBSCRIBED (no value yet) → ACTIVE (≥1 value committed)
//! ```
//!
//! Rebinding jumps straight to a fresh `SUBSCRIBED` for the new source;
//! the old binding is abandoned in place. There is no terminal state: a
//! source that stops emitting leaves the slot showing its last value.
//!
//! # Invariants
//!
//! 1. Records hold the slot weakly and are pruned lazily, so binder
//!    bookkeeping never keeps a dead slot alive.
//! 2. No `RefCell` borrow is held across a call into a slot or source.
//! 3. The identity used by the no-op check and the staleness filter is the
//!    same value: the source `Rc`, established at bind time.
//!
//! # Failure Modes
//!
//! - Binding a non-content slot: [`BindError::NotContentSlot`], raised
//!   before any subscription.
//! - Source-side failures: not this component's concern; the binder never
//!    retries a subscription.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use slotstream_core::{BindError, SlotKind, TreeSlot};

use crate::source::{Source, Subscription};

/// Shared handle to a slot: reference identity is the `Rc` allocation.
pub type SlotHandle<T> = Rc<dyn TreeSlot<Value = T>>;

/// Shared handle to a source: reference identity is the `Rc` allocation.
pub type SourceHandle<T> = Rc<dyn Source<T>>;

/// Per-slot binding state.
struct Record<T> {
    slot: Weak<dyn TreeSlot<Value = T>>,
    source: SourceHandle<T>,
    /// Last value committed through this binding. `None` until the first
    /// accepted emission, which doubles as the clear-before-first-write
    /// trigger.
    rendered: Option<T>,
    /// Cancellation guard, when the source supports one. Dropped when the
    /// record is replaced or removed.
    _guard: Option<Subscription>,
}

struct BinderInner<T> {
    records: RefCell<HashMap<usize, Record<T>>>,
}

/// The binding controller.
///
/// Clones share the same record table; a host typically keeps one binder
/// per rendering tree.
pub struct Binder<T> {
    inner: Rc<BinderInner<T>>,
}

impl<T> Clone for Binder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Binder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("bindings", &self.inner.records.borrow().len())
            .finish()
    }
}

impl<T> Default for Binder<T>
where
    T: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Record key: the slot allocation's address. Stable for the slot's
/// lifetime; collisions with a dead slot's address are prevented by
/// pruning dead records before every lookup that could insert.
fn slot_key<T>(slot: &SlotHandle<T>) -> usize {
    Rc::as_ptr(slot) as *const () as usize
}

impl<T> Binder<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a binder with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BinderInner {
                records: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Bind `source` to `slot`, superseding any previous binding.
    ///
    /// Idempotent per source reference: if `source` is already the slot's
    /// active source this returns immediately without resubscribing or
    /// touching the slot. Otherwise the binder subscribes to `source`;
    /// accepted emissions are committed to the slot asynchronously, at
    /// whatever pace the source delivers them.
    ///
    /// # Errors
    ///
    /// [`BindError::NotContentSlot`] if `slot` is not a content attachment
    /// point. No subscription is made in that case.
    pub fn bind(&self, slot: &SlotHandle<T>, source: &SourceHandle<T>) -> Result<(), BindError> {
        let kind = slot.kind();
        if kind != SlotKind::Content {
            return Err(BindError::NotContentSlot { kind });
        }

        let key = slot_key(slot);
        // Displaced records (dead-slot prunes and the superseded binding)
        // accumulate here and drop only after the table borrow is
        // released: a guard's cancel closure may re-enter the binder.
        let mut displaced: Vec<Record<T>> = Vec::new();
        {
            let mut records = self.inner.records.borrow_mut();
            let dead: Vec<usize> = records
                .iter()
                .filter(|(_, record)| record.slot.strong_count() == 0)
                .map(|(dead_key, _)| *dead_key)
                .collect();
            for dead_key in dead {
                displaced.extend(records.remove(&dead_key));
            }

            if let Some(record) = records.get(&key) {
                if Rc::ptr_eq(&record.source, source) {
                    tracing::trace!(slot = key, "rebind with active source, no-op");
                    return Ok(());
                }
            }

            // Replacing the record displaces the superseded binding's
            // guard, cancelling its subscription when the source supports
            // that.
            displaced.extend(records.insert(
                key,
                Record {
                    slot: Rc::downgrade(slot),
                    source: Rc::clone(source),
                    rendered: None,
                    _guard: None,
                },
            ));
        }
        drop(displaced);
        tracing::debug!(slot = key, "subscribing new source");

        let callback = self.emission_callback(Rc::downgrade(slot), Rc::downgrade(source));
        let guard = source.subscribe(callback);

        if let Some(guard) = guard {
            let stale_guard;
            {
                let mut records = self.inner.records.borrow_mut();
                match records.get_mut(&key) {
                    // A synchronous emission during subscribe may have run
                    // a nested bind; only keep the guard if this binding
                    // is still the active one. Either way the guard that
                    // loses drops after the borrow, like any displaced
                    // record.
                    Some(record) if Rc::ptr_eq(&record.source, source) => {
                        stale_guard = record._guard.replace(guard);
                    }
                    _ => stale_guard = Some(guard),
                }
            }
            drop(stale_guard);
        }
        Ok(())
    }

    /// Remove `slot`'s binding, if any, dropping its cancellation guard.
    ///
    /// Returns whether a binding was removed. Emissions from the formerly
    /// active source are discarded from here on.
    pub fn unbind(&self, slot: &SlotHandle<T>) -> bool {
        // Take the record out before dropping it: its guard's cancel
        // closure may re-enter the binder.
        let removed = {
            let mut records = self.inner.records.borrow_mut();
            records.remove(&slot_key(slot))
        };
        removed.is_some()
    }

    /// Whether `slot` currently has an active binding.
    #[must_use]
    pub fn is_bound(&self, slot: &SlotHandle<T>) -> bool {
        let records = self.inner.records.borrow();
        records
            .get(&slot_key(slot))
            .is_some_and(|record| record.slot.strong_count() > 0)
    }

    /// Number of live bindings (dead-slot records are not counted).
    #[must_use]
    pub fn binding_count(&self) -> usize {
        let records = self.inner.records.borrow();
        records
            .values()
            .filter(|record| record.slot.strong_count() > 0)
            .count()
    }

    /// Whether the binder has no live bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binding_count() == 0
    }

    /// Drop every binding and cancellation guard.
    pub fn clear(&self) {
        // Swap the table out first so guards drop without the borrow held.
        let dropped = std::mem::take(&mut *self.inner.records.borrow_mut());
        drop(dropped);
    }

    /// Build the per-subscription emission callback.
    ///
    /// The callback captures everything weakly: a live source invoking it
    /// must not be kept alive by it, and a dropped binder or slot simply
    /// turns the callback into a no-op.
    fn emission_callback(
        &self,
        slot: Weak<dyn TreeSlot<Value = T>>,
        source: Weak<dyn Source<T>>,
    ) -> Box<dyn FnMut(T)> {
        let inner = Rc::downgrade(&self.inner);
        Box::new(move |value: T| {
            let Some(inner) = inner.upgrade() else { return };
            let Some(slot) = slot.upgrade() else { return };
            let Some(source) = source.upgrade() else { return };
            deliver(&inner, &slot, &source, value);
        })
    }
}

/// Apply one emission: staleness filter, duplicate filter, then commit.
fn deliver<T>(
    inner: &Rc<BinderInner<T>>,
    slot: &SlotHandle<T>,
    source: &SourceHandle<T>,
    value: T,
) where
    T: Clone + PartialEq + 'static,
{
    let key = slot_key(slot);

    // Re-fetch the record on every emission: the binding may have changed
    // since this callback was subscribed, or since its last delivery.
    let first = {
        let records = inner.records.borrow();
        let Some(record) = records.get(&key) else {
            tracing::trace!(slot = key, "discarding emission for unbound slot");
            return;
        };
        if !Rc::ptr_eq(&record.source, source) {
            tracing::trace!(slot = key, "discarding stale emission from superseded source");
            return;
        }
        if record.rendered.as_ref() == Some(&value) {
            tracing::trace!(slot = key, "suppressing duplicate emission");
            return;
        }
        record.rendered.is_none()
    };

    // First accepted emission of this binding: drop the previous binding's
    // lingering content before writing.
    if first {
        slot.clear();
    }
    slot.set_value(value.clone());
    slot.commit();

    // The slot calls above ran without a records borrow; the record may
    // have been replaced re-entrantly, so re-check identity before
    // updating it.
    if let Some(record) = inner.records.borrow_mut().get_mut(&key) {
        if Rc::ptr_eq(&record.source, source) {
            record.rendered = Some(value);
        }
    }
}
