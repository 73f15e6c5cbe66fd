#![forbid(unsafe_code)]

//! Stream-to-slot binding runtime.
//!
//! This crate connects asynchronous value sources to rendering-tree slots:
//!
//! - [`Source`]: the stream contract — a single `subscribe(callback)`
//!   operation delivering zero or more asynchronous emissions.
//! - [`Subscription`]: RAII cancellation guard for sources that support
//!   unsubscribing.
//! - [`Emitter`]: a concrete push source with cancelable subscriptions.
//! - [`Binder`]: the binding controller. One `bind(slot, source)` call per
//!   render pass; the binder detects no-op rebinds, filters emissions from
//!   superseded sources, suppresses duplicate values, and commits accepted
//!   values to the slot.
//!
//! # Architecture
//!
//! Single-threaded shared ownership via `Rc`/`RefCell`, the same discipline
//! as the slot contract. The binder keys its per-slot records by `Rc`
//! allocation address and holds only `Weak` slot references, so its
//! bookkeeping never extends a slot's lifetime; dead records are pruned
//! lazily on `bind`.
//!
//! # Invariants
//!
//! 1. At most one source is active per slot: the most recently bound one.
//! 2. Rebinding with the identical source reference is a no-op (no second
//!    subscription, no slot writes).
//! 3. An emission from a superseded source is never written to the slot,
//!    regardless of how late it arrives.
//! 4. A re-emission of the active source's last-rendered value produces no
//!    additional commit.
//! 5. Every accepted emission is committed and visible at the time of its
//!    delivery; the final visible value is the active source's latest.

pub mod binder;
pub mod source;

pub use binder::{Binder, SlotHandle, SourceHandle};
pub use source::{Emitter, Source, SourceCallback, Subscription};
