#![forbid(unsafe_code)]

//! Rendering-tree slot contract for slotstream.
//!
//! A *slot* is one attachment point in a rendering tree: a place where
//! exactly one current value is displayed at a time. This crate defines the
//! narrow contract the binding runtime needs from a host engine's slots
//! ([`TreeSlot`]), the slot-kind taxonomy used for misuse detection
//! ([`SlotKind`]), the binding error type ([`BindError`]), and [`NodeSlot`],
//! a minimal concrete content slot with two-phase staged/committed storage.
//!
//! The slot contract is deliberately small:
//!
//! - `current()` — the last value committed by anyone.
//! - `set_value()` then `commit()` — stage, then flush. Two-phase so a host
//!   can batch flushes.
//! - `clear()` — drop displayed content.
//!
//! # Invariants
//!
//! 1. A slot displays at most one committed value at a time.
//! 2. `commit()` makes exactly the most recently staged value visible;
//!    staged values never become visible without a commit.
//! 3. Slot handles have stable reference identity (`Rc` allocation) for the
//!    attachment point's whole lifetime.

pub mod error;
pub mod slot;

pub use error::BindError;
pub use slot::{NodeSlot, SlotKind, TreeSlot};
