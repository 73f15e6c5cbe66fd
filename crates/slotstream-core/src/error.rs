#![forbid(unsafe_code)]

//! Error type for binding operations.

use crate::slot::SlotKind;

/// Error returned by `Binder::bind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// The slot is not a content attachment point. Stream bindings render
    /// into content slots only; attribute, property, and event-handler
    /// slots take differently shaped writes. Raised before any
    /// subscription occurs so the misuse is diagnosed at bind time instead
    /// of surfacing as a confusing downstream write failure.
    NotContentSlot {
        /// The kind the offending slot reported.
        kind: SlotKind,
    },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotContentSlot { kind } => {
                write!(f, "streams can only be bound to content slots, got a {kind:?} slot")
            }
        }
    }
}

impl std::error::Error for BindError {}
