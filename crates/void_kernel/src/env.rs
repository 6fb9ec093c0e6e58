//! Per-frame render context
//!
//! No global "active camera" or "active light": everything a layer needs to
//! render is passed in explicitly, so independent pipelines can coexist.

use glam::Mat4;
use void_render::{
    execute_command, AssetProvider, Camera, GraphicsContext, LightManager, RenderCommand,
    UniformValue,
};

/// Services handed to layers while rendering
pub struct RenderEnv<'a> {
    pub gfx: &'a mut dyn GraphicsContext,
    /// `None` skips 3D rendering for the frame
    pub camera: Option<&'a Camera>,
    pub lights: &'a LightManager,
    pub assets: &'a dyn AssetProvider,
}

impl<'a> RenderEnv<'a> {
    pub fn new(
        gfx: &'a mut dyn GraphicsContext,
        camera: Option<&'a Camera>,
        lights: &'a LightManager,
        assets: &'a dyn AssetProvider,
    ) -> Self {
        Self {
            gfx,
            camera,
            lights,
            assets,
        }
    }
}

/// What a 3D entity sees while drawing itself
pub struct RenderView<'a> {
    pub gfx: &'a mut dyn GraphicsContext,
    pub camera: &'a Camera,
    pub assets: &'a dyn AssetProvider,
    /// World matrix of the entity being drawn
    pub model: Mat4,
    /// Whether the bound material samples the shadow map
    pub shadows_enabled: bool,
}

impl RenderView<'_> {
    /// Execute a command immediately
    pub fn submit(&mut self, command: &RenderCommand) {
        execute_command(self.gfx, command);
    }

    /// Upload the model matrix and camera transforms to the bound program
    pub fn upload_transforms(&mut self) {
        self.gfx.set_uniform("u_model", UniformValue::Mat4(self.model));
        self.gfx.set_uniform(
            "u_viewProjection",
            UniformValue::Mat4(self.camera.view_projection()),
        );
        self.gfx.set_uniform(
            "u_cameraPosition",
            UniformValue::Vec3(self.camera.position()),
        );
    }
}
