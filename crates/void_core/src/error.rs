//! Error types shared across the runtime
//!
//! Programming errors (a cyclic hierarchy, a duplicate layer name) surface as
//! typed errors so the caller can fail fast; per-frame failures are handled
//! by the kernel and only show up in diagnostics.

use thiserror::Error;

use crate::id::Id;

/// The core error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Parent/child relationship could not be established
    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),
    /// A layer with this name already exists in the pipeline
    #[error("layer '{0}' is already registered")]
    DuplicateLayer(String),
    /// No layer with this name exists in the pipeline
    #[error("layer '{0}' not found")]
    LayerNotFound(String),
    /// An entity with this id is already registered
    #[error("entity {0} is already registered")]
    DuplicateEntity(Id),
    /// No entity with this id is registered
    #[error("entity {0} not found")]
    EntityNotFound(Id),
    /// A main-thread-only operation was invoked elsewhere
    #[error("'{operation}' must run on the main thread")]
    WrongThread { operation: &'static str },
    /// Generic error with message
    #[error("{0}")]
    Message(Box<str>),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

/// Violations of the single-parent entity tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// An entity cannot parent itself
    #[error("entity {0} cannot be its own parent")]
    SelfParent(Id),
    /// The new parent is a descendant of the child
    #[error("parenting {child} under {parent} would create a cycle")]
    Cycle { child: Id, parent: Id },
    /// The entity is not part of the hierarchy
    #[error("entity {0} is not registered")]
    UnknownEntity(Id),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Message(s.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Message(s.into_boxed_str())
    }
}
