//! Layers
//!
//! A layer is an ordered bucket of entities sharing one capability. The
//! pipeline drives every active layer once per frame in ascending priority:
//! `update`, then `collect_render_commands` followed immediately by
//! `process_render_commands` with the commands the layer supports.
//!
//! Built-in layers embed a [`LayerBase`] that stores name, priority, active
//! flag, entities and per-frame counts; the trait's provided methods delegate
//! to it.

use std::fmt;

use thiserror::Error;
use void_core::FrameTime;
use void_render::{CommandList, CommandTypeSet, GraphicsContext};

use crate::entity::{Capabilities, EntityId, SharedEntity};
use crate::env::RenderEnv;
use crate::input::InputState;

/// Which layer callback is running
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LayerPhase {
    Update,
    Collect,
    Process,
}

impl fmt::Display for LayerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayerPhase::Update => "update",
            LayerPhase::Collect => "collect",
            LayerPhase::Process => "process",
        })
    }
}

/// Errors a layer callback may return
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerError {
    /// One entity misbehaved
    #[error("entity {entity}: {message}")]
    Entity { entity: EntityId, message: String },
    /// A required GPU resource is missing
    #[error("missing resource '{0}'")]
    MissingResource(String),
    /// Callback panicked
    #[error("panic: {0}")]
    Panicked(String),
    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

impl From<&str> for LayerError {
    fn from(s: &str) -> Self {
        LayerError::Message(s.to_string())
    }
}

impl From<String> for LayerError {
    fn from(s: String) -> Self {
        LayerError::Message(s)
    }
}

/// Layer health status
#[derive(Clone, Debug, PartialEq, Default)]
pub enum LayerHealth {
    /// Last frame ran without failures
    #[default]
    Healthy,
    /// A callback failed during `frame`
    Failed {
        phase: LayerPhase,
        error: String,
        frame: u64,
    },
}

impl LayerHealth {
    /// Check if the layer is healthy
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Check if the layer failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Get error message if failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error, .. } => Some(error),
            Self::Healthy => None,
        }
    }
}

/// Entities processed and skipped since the last [`Layer::take_counts`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub processed: u64,
    pub skipped: u64,
}

/// State shared by the built-in layers
pub struct LayerBase {
    name: String,
    priority: i32,
    active: bool,
    entities: Vec<SharedEntity>,
    counts: FrameCounts,
}

impl LayerBase {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            active: true,
            entities: Vec::new(),
            counts: FrameCounts::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn entities(&self) -> &[SharedEntity] {
        &self.entities
    }

    /// Returns `false` if the entity is already registered here
    pub fn add(&mut self, entity: SharedEntity) -> bool {
        let id = entity.read().id();
        if self.entities.iter().any(|e| e.read().id() == id) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.read().id() != id);
        self.entities.len() != before
    }

    #[inline]
    pub fn processed(&mut self, n: u64) {
        self.counts.processed += n;
    }

    #[inline]
    pub fn skipped(&mut self, n: u64) {
        self.counts.skipped += n;
    }

    pub fn take_counts(&mut self) -> FrameCounts {
        std::mem::take(&mut self.counts)
    }
}

impl fmt::Debug for LayerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBase")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("active", &self.active)
            .field("entities", &self.entities.len())
            .finish()
    }
}

/// A stage of the frame pipeline
pub trait Layer {
    fn base(&self) -> &LayerBase;
    fn base_mut(&mut self) -> &mut LayerBase;

    /// Command types this layer executes
    fn supported_commands(&self) -> CommandTypeSet;

    /// Whether an entity with these capabilities belongs here
    fn accepts(&self, capabilities: Capabilities) -> bool;

    fn name(&self) -> &str {
        self.base().name()
    }

    /// Lower runs first
    fn priority(&self) -> i32 {
        self.base().priority()
    }

    fn is_active(&self) -> bool {
        self.base().is_active()
    }

    fn set_active(&mut self, active: bool) {
        self.base_mut().set_active(active);
    }

    fn add_entity(&mut self, entity: SharedEntity) -> bool {
        self.base_mut().add(entity)
    }

    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.base_mut().remove(id)
    }

    fn entity_count(&self) -> usize {
        self.base().entities().len()
    }

    /// Mutate entity state
    fn update(&mut self, _frame: &FrameTime, _input: &InputState) -> Result<(), LayerError> {
        Ok(())
    }

    /// Append this frame's commands to `out`
    fn collect_render_commands(
        &mut self,
        _frame: &FrameTime,
        _out: &mut CommandList,
    ) -> Result<(), LayerError> {
        Ok(())
    }

    /// Execute the supported commands, in order, plus any layer-specific rendering
    fn process_render_commands(
        &mut self,
        _commands: &CommandList,
        _env: &mut RenderEnv<'_>,
    ) -> Result<(), LayerError> {
        Ok(())
    }

    /// Framebuffer size changed
    fn resize(&mut self, _width: u32, _height: u32) {}

    fn take_counts(&mut self) -> FrameCounts {
        self.base_mut().take_counts()
    }

    /// Release GPU resources. Must be idempotent
    fn dispose(&mut self, _gfx: &mut dyn GraphicsContext) {}
}
