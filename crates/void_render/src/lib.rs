//! # void_render - Backend-agnostic rendering vocabulary
//!
//! Everything the runtime needs to describe a frame without knowing which
//! graphics API will execute it:
//! - Render commands with strongly typed payloads
//! - The [`GraphicsContext`] contract and a recording (headless) backend
//! - Camera, frustum and bounding volumes
//! - Directional lights, materials and the shadow pre-pass
//! - Debug overlay flags and line geometry
//!
//! ## Example
//!
//! ```ignore
//! use void_render::prelude::*;
//!
//! let mut gfx = RecordingContext::new(1280, 720);
//! let mut commands = CommandList::new();
//! commands.push_payload(ClearPayload::color([0.1, 0.1, 0.1, 1.0]));
//! commands.push_payload(WindowPayload::set_title("void"));
//!
//! for cmd in &commands {
//!     execute_command(&mut gfx, cmd);
//! }
//! ```

pub mod assets;
pub mod bounds;
pub mod camera;
pub mod command;
pub mod context;
pub mod debug;
pub mod frustum;
pub mod handle;
pub mod light;
pub mod material;
pub mod recording;
pub mod shadow;

pub use assets::{
    AssetProvider, AssetTable, Placeholder, DEBUG_LINES_SHADER, LIT_SHADER, SHADOW_DEPTH_SHADER,
};
pub use bounds::{Aabb, BoundingSphere, Bounds};
pub use camera::{Camera, CameraMatrices};
pub use command::{
    execute_command, ClearPayload, CommandError, CommandList, CommandType, CommandTypeSet,
    CullModePayload, DepthStatePayload, DrawArrayPayload, DrawTextPayload, DrawTexturePayload,
    GpuCallback, GpuCommandPayload, Payload, RenderCommand, RenderPayload, ScissorPayload,
    UniformsPayload, UseShaderPayload, WindowCommand, WindowPayload,
};
pub use context::{
    CompareFunction, CullMode, FrontFace, GraphicsContext, LineVertex, PixelRect, PolygonMode,
    PrimitiveTopology, UniformValue, Viewport,
};
pub use debug::{DebugConfig, DebugVisualization, PhysicsShape};
pub use frustum::{Containment, Frustum, Plane};
pub use handle::{RenderTargetHandle, ShaderHandle, TextureHandle, VertexArrayHandle};
pub use light::{DirectionalLight, LightId, LightManager};
pub use material::{Material, MaterialUniforms, TextureSlot};
pub use recording::{GpuCall, RecordingContext};
pub use shadow::{ShadowBinding, ShadowConfig, ShadowPass, ShadowRenderer};

/// Prelude for common imports
pub mod prelude {
    pub use crate::assets::{AssetProvider, AssetTable, Placeholder};
    pub use crate::bounds::{Aabb, BoundingSphere, Bounds};
    pub use crate::camera::Camera;
    pub use crate::command::*;
    pub use crate::context::*;
    pub use crate::debug::{DebugConfig, DebugVisualization, PhysicsShape};
    pub use crate::light::{DirectionalLight, LightManager};
    pub use crate::material::Material;
    pub use crate::recording::RecordingContext;
    pub use crate::shadow::{ShadowBinding, ShadowConfig, ShadowRenderer};
}
