#![forbid(unsafe_code)]

//! The stream contract and a concrete push source.
//!
//! A [`Source`] delivers zero or more values to a callback at arbitrary
//! later points, driven entirely by its own scheduling: delivery may be
//! synchronous-immediate during `subscribe`, deferred, or driven by
//! external I/O. Sources are not restartable and carry no identity beyond
//! their `Rc` allocation.
//!
//! Cancellation is optional. A source that can unsubscribe returns a
//! [`Subscription`] guard; dropping the guard removes the callback. A
//! source that cannot cancel returns `None`, and consumers must tolerate
//! its callback staying live (the binder does, via staleness filtering).
//!
//! [`Emitter`] is the built-in source: a hand-pushed fan-out with
//! cancelable subscriptions. Callbacks are snapshotted before delivery and
//! dead entries are cleaned up by the guard, so unsubscribing from within
//! a callback is safe.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A boxed emission callback.
pub type SourceCallback<T> = Box<dyn FnMut(T)>;

/// An asynchronous, unbounded, non-restartable sequence of values
/// delivered via callback.
pub trait Source<T> {
    /// Begin delivering emissions to `callback`.
    ///
    /// Returns a cancellation guard if this source supports unsubscribing,
    /// `None` otherwise. Emissions may occur synchronously before this
    /// call returns.
    fn subscribe(&self, callback: SourceCallback<T>) -> Option<Subscription>;
}

/// RAII guard for a cancelable subscription.
///
/// Dropping the guard cancels the subscription. Call [`detach`] to let the
/// subscription outlive the guard.
///
/// [`detach`]: Subscription::detach
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a cancellation action. The action runs at most once.
    #[must_use]
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Consume the guard without cancelling.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type SharedCallback<T> = Rc<RefCell<SourceCallback<T>>>;

/// A push source: values handed to [`emit`](Emitter::emit) fan out to all
/// live subscribers in registration order.
///
/// Share an emitter between producer and binder via `Rc<Emitter<T>>`; the
/// `Rc` allocation is the source's identity.
pub struct Emitter<T> {
    subscribers: Rc<RefCell<Vec<(u64, SharedCallback<T>)>>>,
    next_id: Cell<u64>,
}

impl<T: Clone + 'static> Emitter<T> {
    /// Create an emitter with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Deliver `value` to every live subscriber, in registration order.
    ///
    /// The subscriber list is snapshotted first, so callbacks may
    /// subscribe or cancel on this emitter without re-entrancy panics;
    /// such changes take effect from the next emission.
    pub fn emit(&self, value: T) {
        let snapshot: Vec<SharedCallback<T>> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in snapshot {
            (callback.borrow_mut())(value.clone());
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl<T: Clone + 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> Source<T> for Emitter<T> {
    fn subscribe(&self, callback: SourceCallback<T>) -> Option<Subscription> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(callback))));

        // The guard holds the list weakly so a forgotten guard does not
        // keep the emitter alive.
        let subscribers = Rc::downgrade(&self.subscribers);
        Some(Subscription::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_to_subscriber() {
        let emitter = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = emitter.subscribe(Box::new(move |v: i32| sink.borrow_mut().push(v)));

        emitter.emit(1);
        emitter.emit(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn fan_out_preserves_registration_order() {
        let emitter = Emitter::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = Rc::clone(&order);
        let _s1 = emitter.subscribe(Box::new(move |_: i32| o1.borrow_mut().push("first")));
        let o2 = Rc::clone(&order);
        let _s2 = emitter.subscribe(Box::new(move |_: i32| o2.borrow_mut().push("second")));

        emitter.emit(0);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn dropping_guard_cancels() {
        let emitter = Emitter::new();
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let sub = emitter.subscribe(Box::new(move |v: i32| sink.set(v)));
        assert_eq!(emitter.subscriber_count(), 1);

        drop(sub);
        assert_eq!(emitter.subscriber_count(), 0);
        emitter.emit(42);
        assert_eq!(seen.get(), 0, "cancelled callback must not fire");
    }

    #[test]
    fn detach_keeps_subscription_live() {
        let emitter = Emitter::new();
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let sub = emitter.subscribe(Box::new(move |v: i32| sink.set(v)));

        sub.expect("emitter subscriptions are cancelable").detach();
        assert_eq!(emitter.subscriber_count(), 1);
        emitter.emit(9);
        assert_eq!(seen.get(), 9);
    }

    #[test]
    fn cancel_from_within_callback_takes_effect_next_emission() {
        let emitter = Rc::new(Emitter::new());
        let seen = Rc::new(Cell::new(0u32));

        let sub: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let sub_slot = Rc::clone(&sub);
        let sink = Rc::clone(&seen);
        let guard = emitter.subscribe(Box::new(move |_: i32| {
            sink.set(sink.get() + 1);
            // Cancel ourselves mid-delivery.
            sub_slot.borrow_mut().take();
        }));
        *sub.borrow_mut() = guard;

        emitter.emit(0);
        emitter.emit(0);
        assert_eq!(seen.get(), 1, "self-cancelled callback fires only once");
    }

    #[test]
    fn guard_outliving_emitter_is_harmless() {
        let sub = {
            let emitter = Emitter::new();
            emitter.subscribe(Box::new(|_: i32| {}))
        };
        drop(sub);
    }
}
