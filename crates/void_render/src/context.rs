//! Graphics context contract
//!
//! The runtime never talks to a graphics API directly. Every backend (GL,
//! wgpu, or the headless [`RecordingContext`]) implements [`GraphicsContext`],
//! and the only owner of a context is the main thread.
//!
//! [`RecordingContext`]: crate::recording::RecordingContext

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::command::{
    ClearPayload, DepthStatePayload, DrawArrayPayload, DrawTextPayload, DrawTexturePayload,
    WindowCommand,
};
use crate::handle::{RenderTargetHandle, ShaderHandle, TextureHandle};

/// Rectangle in framebuffer pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// The active viewport
pub type Viewport = PixelRect;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    Back,
    FrontAndBack,
}

/// Winding of front-facing triangles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolygonMode {
    Fill,
    Line,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareFunction {
    Never,
    Less,
    LessEqual,
    Equal,
    Greater,
    GreaterEqual,
    NotEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// A single uniform value
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Texture unit index
    Sampler(u32),
}

/// Vertex of an immediate-mode debug line
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineVertex {
    pub position: Vec3,
    pub color: [f32; 4],
}

impl LineVertex {
    pub const fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Everything the runtime needs from a graphics backend
///
/// Implementations keep their own state; getters return whatever was last set.
pub trait GraphicsContext {
    fn clear(&mut self, clear: &ClearPayload);

    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);

    fn set_depth_state(&mut self, state: &DepthStatePayload);
    fn set_cull_mode(&mut self, mode: CullMode, front_face: FrontFace);
    fn set_polygon_mode(&mut self, mode: PolygonMode);
    fn line_width(&self) -> f32;
    fn set_line_width(&mut self, width: f32);
    fn set_scissor(&mut self, rect: Option<PixelRect>);

    fn use_program(&mut self, program: ShaderHandle);
    fn set_uniform(&mut self, name: &str, value: UniformValue);
    fn bind_texture(&mut self, slot: u32, texture: TextureHandle);

    fn draw_arrays(&mut self, draw: &DrawArrayPayload);
    fn draw_texture(&mut self, draw: &DrawTexturePayload);
    fn draw_text(&mut self, draw: &DrawTextPayload);
    fn draw_lines(&mut self, vertices: &[LineVertex]);

    /// Forward a request to the host window
    fn window(&mut self, command: &WindowCommand);

    /// Create a depth-only offscreen target
    fn create_depth_target(&mut self, width: u32, height: u32) -> RenderTargetHandle;
    /// Depth attachment of a target, sampleable as a texture
    fn depth_texture(&self, target: RenderTargetHandle) -> Option<TextureHandle>;
    /// Bind an offscreen target, or the default framebuffer with `None`
    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>);
    fn destroy_render_target(&mut self, target: RenderTargetHandle);
}
