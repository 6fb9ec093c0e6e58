//! # Void Kernel
//!
//! The kernel drives a scene of entities through ordered layers once per
//! frame:
//! - Layer scheduling by priority, with entity routing by capability
//! - Command-buffered rendering: layers collect typed render commands and
//!   execute the ones they support against a graphics context
//! - The 3D world layer: frustum culling, distance sorting, shadow pre-pass,
//!   opaque and transparent passes, debug overlay
//! - Main-thread dispatch of work produced on worker threads
//! - Diagnostics and fault containment
//!
//! ## Frame
//!
//! ```text
//! Engine::update ──► dispatcher drain ──► layer.update (ascending priority)
//! Engine::render ──► clear ──► per layer: collect ──► process supported commands
//!                                               │
//!                                               └─► unclaimed carried to next layer
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Frame never dies** - a failing layer or action is logged and counted
//! 2. **Stable order** - priority then insertion order, never re-sorted mid-pass
//! 3. **Typed payloads** - a command's payload always matches its type
//! 4. **Main thread only** - the dispatcher drains on its owning thread

pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod engine;
pub mod entity;
pub mod env;
pub mod hierarchy;
pub mod input;
pub mod layer;
pub mod layers;
pub mod pipeline;
pub mod recovery;
pub mod transform;

pub use config::{ConfigError, ConfigResult, EngineConfig, RenderConfig, WindowConfig};
pub use diagnostics::{
    DiagnosticsSnapshot, DispatcherSnapshot, LayerSnapshot, LayerStats, PipelineDiagnostics,
};
pub use dispatcher::{
    ActionRecord, ActionStatus, DispatcherConfig, DispatcherHandle, DispatcherStats,
    MainThreadDispatcher, NamedAction,
};
pub use engine::Engine;
pub use entity::{
    share, Capabilities, DebugPanel, EntityId, GameObject, InputReceiver, Renderable2D,
    Renderable3D, ShadowCaster, SharedEntity, TransparentRenderable, Updatable,
};
pub use env::{RenderEnv, RenderView};
pub use hierarchy::Hierarchy;
pub use input::{InputState, MouseButton};
pub use layer::{FrameCounts, Layer, LayerBase, LayerError, LayerHealth, LayerPhase};
pub use layers::{
    DebugPanelLayer, InputLayer, SpriteLayer, UpdateLayer, WorldLayer, WorldSettings, WorldStats,
    SPRITE_SHADER,
};
pub use pipeline::Pipeline;
pub use transform::{Transform, Transform2D};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::dispatcher::{DispatcherHandle, MainThreadDispatcher};
    pub use crate::engine::Engine;
    pub use crate::entity::*;
    pub use crate::env::{RenderEnv, RenderView};
    pub use crate::input::InputState;
    pub use crate::layer::{Layer, LayerBase, LayerError};
    pub use crate::layers::*;
    pub use crate::pipeline::Pipeline;
    pub use crate::transform::{Transform, Transform2D};
}
