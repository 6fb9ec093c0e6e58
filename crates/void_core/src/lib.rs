//! # void_core - Void Engine Core
//!
//! Small, dependency-light primitives shared by every other crate:
//! - **Identifiers**: `Id` and the thread-safe `IdGenerator`
//! - **Errors**: the shared error taxonomy (`Error`, `HierarchyError`)
//! - **Frame timing**: `FrameTime`, the per-tick value threaded through
//!   update and render

pub mod error;
pub mod id;
pub mod time;

pub use error::*;
pub use id::*;
pub use time::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, HierarchyError, Result};
    pub use crate::id::{Id, IdGenerator};
    pub use crate::time::{FrameClock, FrameTime};
}
