//! Recording backend
//!
//! [`RecordingContext`] implements [`GraphicsContext`] without a GPU. It keeps
//! the state a real backend would track and appends every call to a log, so
//! headless runs and tests can assert on exactly what reached the "GPU".

use std::collections::HashMap;

use crate::command::{
    ClearPayload, DepthStatePayload, DrawArrayPayload, DrawTextPayload, DrawTexturePayload,
    WindowCommand,
};
use crate::context::{
    CullMode, FrontFace, GraphicsContext, LineVertex, PixelRect, PolygonMode, UniformValue,
    Viewport,
};
use crate::handle::{RenderTargetHandle, ShaderHandle, TextureHandle};

/// One recorded call
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    Clear(ClearPayload),
    SetViewport(Viewport),
    SetDepthState(DepthStatePayload),
    SetCullMode(CullMode, FrontFace),
    SetPolygonMode(PolygonMode),
    SetLineWidth(f32),
    SetScissor(Option<PixelRect>),
    UseProgram(ShaderHandle),
    SetUniform(String, UniformValue),
    BindTexture(u32, TextureHandle),
    DrawArrays(DrawArrayPayload),
    DrawTexture(DrawTexturePayload),
    DrawText(DrawTextPayload),
    /// Number of line vertices submitted
    DrawLines(usize),
    Window(WindowCommand),
    CreateDepthTarget(RenderTargetHandle, u32, u32),
    BindRenderTarget(Option<RenderTargetHandle>),
    DestroyRenderTarget(RenderTargetHandle),
}

#[derive(Debug)]
struct DepthTarget {
    texture: TextureHandle,
}

/// Headless graphics context that records every call
#[derive(Debug)]
pub struct RecordingContext {
    calls: Vec<GpuCall>,
    viewport: Viewport,
    line_width: f32,
    depth: DepthStatePayload,
    cull: (CullMode, FrontFace),
    polygon_mode: PolygonMode,
    program: Option<ShaderHandle>,
    bound_target: Option<RenderTargetHandle>,
    targets: HashMap<RenderTargetHandle, DepthTarget>,
    next_handle: u32,
}

impl RecordingContext {
    /// Handles created by the context start here, well clear of asset handles
    const FIRST_HANDLE: u32 = 10_000;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            viewport: PixelRect::sized(width, height),
            line_width: 1.0,
            depth: DepthStatePayload::default(),
            cull: (CullMode::Back, FrontFace::Ccw),
            polygon_mode: PolygonMode::Fill,
            program: None,
            bound_target: None,
            targets: HashMap::new(),
            next_handle: Self::FIRST_HANDLE,
        }
    }

    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Drain the call log
    pub fn take_calls(&mut self) -> Vec<GpuCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Count recorded calls matching a predicate
    pub fn count(&self, pred: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    pub fn depth_state(&self) -> DepthStatePayload {
        self.depth
    }

    pub fn cull_mode(&self) -> (CullMode, FrontFace) {
        self.cull
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.polygon_mode
    }

    pub fn current_program(&self) -> Option<ShaderHandle> {
        self.program
    }

    pub fn bound_target(&self) -> Option<RenderTargetHandle> {
        self.bound_target
    }

    /// Number of live offscreen targets
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    /// Last texture bound to `slot`, if any
    pub fn last_bound(&self, slot: u32) -> Option<TextureHandle> {
        self.calls.iter().rev().find_map(|call| match call {
            GpuCall::BindTexture(s, tex) if *s == slot => Some(*tex),
            _ => None,
        })
    }

    /// Last value uploaded for a uniform, if any
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.calls.iter().rev().find_map(|call| match call {
            GpuCall::SetUniform(n, value) if n == name => Some(*value),
            _ => None,
        })
    }

    fn alloc(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl GraphicsContext for RecordingContext {
    fn clear(&mut self, clear: &ClearPayload) {
        self.calls.push(GpuCall::Clear(clear.clone()));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.calls.push(GpuCall::SetViewport(viewport));
    }

    fn set_depth_state(&mut self, state: &DepthStatePayload) {
        self.depth = *state;
        self.calls.push(GpuCall::SetDepthState(*state));
    }

    fn set_cull_mode(&mut self, mode: CullMode, front_face: FrontFace) {
        self.cull = (mode, front_face);
        self.calls.push(GpuCall::SetCullMode(mode, front_face));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.polygon_mode = mode;
        self.calls.push(GpuCall::SetPolygonMode(mode));
    }

    fn line_width(&self) -> f32 {
        self.line_width
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
        self.calls.push(GpuCall::SetLineWidth(width));
    }

    fn set_scissor(&mut self, rect: Option<PixelRect>) {
        self.calls.push(GpuCall::SetScissor(rect));
    }

    fn use_program(&mut self, program: ShaderHandle) {
        self.program = Some(program);
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.calls.push(GpuCall::SetUniform(name.to_owned(), value));
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle) {
        self.calls.push(GpuCall::BindTexture(slot, texture));
    }

    fn draw_arrays(&mut self, draw: &DrawArrayPayload) {
        self.calls.push(GpuCall::DrawArrays(draw.clone()));
    }

    fn draw_texture(&mut self, draw: &DrawTexturePayload) {
        self.calls.push(GpuCall::DrawTexture(draw.clone()));
    }

    fn draw_text(&mut self, draw: &DrawTextPayload) {
        self.calls.push(GpuCall::DrawText(draw.clone()));
    }

    fn draw_lines(&mut self, vertices: &[LineVertex]) {
        self.calls.push(GpuCall::DrawLines(vertices.len()));
    }

    fn window(&mut self, command: &WindowCommand) {
        self.calls.push(GpuCall::Window(command.clone()));
    }

    fn create_depth_target(&mut self, width: u32, height: u32) -> RenderTargetHandle {
        let target = RenderTargetHandle(self.alloc());
        let texture = TextureHandle(self.alloc());
        self.targets.insert(target, DepthTarget { texture });
        self.calls
            .push(GpuCall::CreateDepthTarget(target, width, height));
        target
    }

    fn depth_texture(&self, target: RenderTargetHandle) -> Option<TextureHandle> {
        self.targets.get(&target).map(|t| t.texture)
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) {
        self.bound_target = target;
        self.calls.push(GpuCall::BindRenderTarget(target));
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) {
        if self.targets.remove(&target).is_some() {
            if self.bound_target == Some(target) {
                self.bound_target = None;
            }
            self.calls.push(GpuCall::DestroyRenderTarget(target));
        }
    }
}
