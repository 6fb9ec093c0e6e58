//! Debug Overlay
//!
//! Flags and line geometry for the 3D debug overlay:
//! - Wireframe bounding boxes of in-view entities
//! - Physics shape outlines
//! - Wireframe polygon mode
//!
//! # Example
//!
//! ```ignore
//! use void_render::debug::{DebugConfig, DebugVisualization};
//!
//! let mut config = DebugConfig::default();
//! config.enable(DebugVisualization::BOUNDS);
//! config.line_width = 2.0;
//! ```

pub mod lines;
pub mod visualization;

pub use lines::{aabb_lines, shape_lines, PhysicsShape};
pub use visualization::{DebugConfig, DebugVisualization};
