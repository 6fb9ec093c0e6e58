//! Shadow Mapping
//!
//! A single directional shadow map rendered as a depth-only pre-pass:
//!
//! - The light looks at a focus point (the camera position) from
//!   `focus - direction * distance`
//! - An orthographic projection covers the visible scene, clamped to the
//!   configured half-extent range
//! - Front faces are culled while rendering depth to reduce acne
//!
//! When no light casts shadows, lit materials receive [`ShadowBinding::neutral`]:
//! the white placeholder with sampling disabled.

mod config;

pub use config::ShadowConfig;

use std::panic::{self, AssertUnwindSafe};

use glam::{Mat4, Vec3};

use crate::assets::{AssetProvider, Placeholder, SHADOW_DEPTH_SHADER};
use crate::bounds::BoundingSphere;
use crate::command::ClearPayload;
use crate::context::{CullMode, FrontFace, GraphicsContext, PixelRect, UniformValue};
use crate::handle::{RenderTargetHandle, ShaderHandle, TextureHandle};
use crate::light::DirectionalLight;

/// What lit materials sample for shadows this frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowBinding {
    pub texture: TextureHandle,
    pub light_space: Mat4,
    pub depth_bias: f32,
    pub enabled: bool,
}

impl ShadowBinding {
    /// White map, identity matrix, sampling disabled
    pub fn neutral(assets: &dyn AssetProvider) -> Self {
        Self {
            texture: assets.placeholder(Placeholder::White),
            light_space: Mat4::IDENTITY,
            depth_bias: 0.0,
            enabled: false,
        }
    }
}

/// Light matrices handed to shadow casters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowPass {
    pub light_view: Mat4,
    pub light_projection: Mat4,
    /// `light_projection * light_view`
    pub light_space: Mat4,
    /// Depth program, if one was available
    pub program: Option<ShaderHandle>,
}

#[derive(Clone, Copy, Debug)]
struct DepthTarget {
    handle: RenderTargetHandle,
    texture: Option<TextureHandle>,
    resolution: u32,
}

/// Owns the shadow depth target and renders the pre-pass
#[derive(Debug)]
pub struct ShadowRenderer {
    config: ShadowConfig,
    target: Option<DepthTarget>,
    passes: u64,
}

impl ShadowRenderer {
    pub fn new(mut config: ShadowConfig) -> Self {
        config.validate();
        Self {
            config,
            target: None,
            passes: 0,
        }
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Replace the configuration. A resolution change recreates the target
    /// on the next pass
    pub fn set_config(&mut self, mut config: ShadowConfig) {
        config.validate();
        self.config = config;
    }

    /// Number of pre-passes rendered
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Half extent covering every sphere as seen around `focus`
    pub fn fit_half_extent(&self, focus: Vec3, spheres: &[BoundingSphere]) -> f32 {
        let needed = spheres
            .iter()
            .map(|s| s.center.distance(focus) + s.radius)
            .fold(0.0f32, f32::max);
        needed.clamp(self.config.min_half_extent, self.config.max_half_extent)
    }

    /// Light view and orthographic projection
    pub fn light_matrices(&self, direction: Vec3, focus: Vec3, half_extent: f32) -> (Mat4, Mat4) {
        let dir = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
        let eye = focus - dir * self.config.distance;
        let up = if dir.dot(Vec3::Y).abs() > 0.99 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, focus, up);
        let far = self.config.distance + half_extent;
        let projection = Mat4::orthographic_rh(
            -half_extent,
            half_extent,
            -half_extent,
            half_extent,
            self.config.near_plane,
            far,
        );
        (view, projection)
    }

    /// Render the depth pre-pass and return what lit materials should bind
    ///
    /// `draw_casters` is invoked once with the pass matrices while the depth
    /// target is bound. Viewport and render target are restored before
    /// returning, also when `draw_casters` panics (the panic is then resumed);
    /// culling is left at back faces.
    pub fn render<F>(
        &mut self,
        gfx: &mut dyn GraphicsContext,
        assets: &dyn AssetProvider,
        light: &DirectionalLight,
        focus: Vec3,
        half_extent: f32,
        mut draw_casters: F,
    ) -> ShadowBinding
    where
        F: FnMut(&mut dyn GraphicsContext, &ShadowPass),
    {
        if !self.config.enabled {
            return ShadowBinding::neutral(assets);
        }

        let previous_viewport = gfx.viewport();
        let target = self.ensure_target(gfx);
        let resolution = self.config.resolution;

        let (light_view, light_projection) =
            self.light_matrices(light.direction, focus, half_extent);
        let light_space = light_projection * light_view;

        gfx.bind_render_target(Some(target.handle));
        gfx.set_viewport(PixelRect::sized(resolution, resolution));
        gfx.clear(&ClearPayload::depth_only());
        gfx.set_cull_mode(CullMode::Front, FrontFace::Ccw);

        let program = assets.shader_program(SHADOW_DEPTH_SHADER);
        match program {
            Some(program) => {
                gfx.use_program(program);
                gfx.set_uniform("u_lightSpaceMatrix", UniformValue::Mat4(light_space));
            }
            None => log::warn!("shadow pass: '{}' program missing", SHADOW_DEPTH_SHADER),
        }

        let pass = ShadowPass {
            light_view,
            light_projection,
            light_space,
            program,
        };
        let drawn = panic::catch_unwind(AssertUnwindSafe(|| draw_casters(&mut *gfx, &pass)));

        gfx.set_cull_mode(CullMode::Back, FrontFace::Ccw);
        gfx.bind_render_target(None);
        gfx.set_viewport(previous_viewport);
        if let Err(payload) = drawn {
            panic::resume_unwind(payload);
        }
        self.passes += 1;

        ShadowBinding {
            texture: target
                .texture
                .unwrap_or_else(|| assets.placeholder(Placeholder::White)),
            light_space,
            depth_bias: self.config.depth_bias,
            enabled: target.texture.is_some(),
        }
    }

    fn ensure_target(&mut self, gfx: &mut dyn GraphicsContext) -> DepthTarget {
        let resolution = self.config.resolution;
        match self.target {
            Some(target) if target.resolution == resolution => target,
            stale => {
                if let Some(old) = stale {
                    gfx.destroy_render_target(old.handle);
                }
                let handle = gfx.create_depth_target(resolution, resolution);
                let target = DepthTarget {
                    handle,
                    texture: gfx.depth_texture(handle),
                    resolution,
                };
                log::debug!("created {0}x{0} shadow target {1:?}", resolution, handle);
                self.target = Some(target);
                target
            }
        }
    }

    /// Release the depth target. Safe to call more than once
    pub fn dispose(&mut self, gfx: &mut dyn GraphicsContext) {
        if let Some(target) = self.target.take() {
            gfx.destroy_render_target(target.handle);
            log::debug!("disposed shadow target {:?}", target.handle);
        }
    }
}

impl Default for ShadowRenderer {
    fn default() -> Self {
        Self::new(ShadowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetTable;
    use crate::recording::{GpuCall, RecordingContext};

    fn sun() -> DirectionalLight {
        DirectionalLight::new(Vec3::new(0.0, -1.0, -1.0)).with_shadows(true)
    }

    #[test]
    fn test_pass_restores_state() {
        let assets = AssetTable::with_builtin_shaders();
        let mut gfx = RecordingContext::new(800, 600);
        let mut shadows = ShadowRenderer::default();
        let mut invoked = 0;

        let binding = shadows.render(&mut gfx, &assets, &sun(), Vec3::ZERO, 10.0, |gfx, pass| {
            invoked += 1;
            assert_eq!(gfx.viewport(), PixelRect::sized(2048, 2048));
            assert!(pass.program.is_some());
        });

        assert_eq!(invoked, 1);
        assert!(binding.enabled);
        assert_ne!(binding.texture, assets.placeholder(Placeholder::White));
        assert_eq!(gfx.viewport(), PixelRect::sized(800, 600));
        assert_eq!(gfx.bound_target(), None);
        assert_eq!(gfx.cull_mode().0, CullMode::Back);
        assert!(gfx
            .calls()
            .contains(&GpuCall::SetCullMode(CullMode::Front, FrontFace::Ccw)));
        assert!(gfx.calls().contains(&GpuCall::Clear(ClearPayload::depth_only())));
    }

    #[test]
    fn test_panicking_casters_still_restore_state() {
        let assets = AssetTable::with_builtin_shaders();
        let mut gfx = RecordingContext::new(640, 480);
        let mut shadows = ShadowRenderer::default();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            shadows.render(&mut gfx, &assets, &sun(), Vec3::ZERO, 10.0, |_, _| {
                panic!("caster exploded");
            })
        }));

        assert!(result.is_err());
        assert_eq!(gfx.bound_target(), None);
        assert_eq!(gfx.viewport(), PixelRect::sized(640, 480));
        assert_eq!(gfx.cull_mode(), (CullMode::Back, FrontFace::Ccw));
        assert_eq!(shadows.passes(), 0);
    }

    #[test]
    fn test_target_reused_and_disposed_once() {
        let assets = AssetTable::with_builtin_shaders();
        let mut gfx = RecordingContext::default();
        let mut shadows = ShadowRenderer::default();
        for _ in 0..3 {
            shadows.render(&mut gfx, &assets, &sun(), Vec3::ZERO, 10.0, |_, _| {});
        }
        assert_eq!(gfx.count(|c| matches!(c, GpuCall::CreateDepthTarget(..))), 1);
        assert_eq!(shadows.passes(), 3);

        shadows.dispose(&mut gfx);
        shadows.dispose(&mut gfx);
        assert!(!shadows.has_target());
        assert_eq!(gfx.live_targets(), 0);
    }

    #[test]
    fn test_light_looks_at_focus() {
        let shadows = ShadowRenderer::default();
        let focus = Vec3::new(3.0, 0.0, -2.0);
        let (view, _) = shadows.light_matrices(Vec3::NEG_Y, focus, 10.0);
        // straight-down light: focus lies on the view axis, distance units ahead
        let p = view.transform_point3(focus);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
        assert!((p.z + shadows.config().distance).abs() < 1e-3);
    }

    #[test]
    fn test_half_extent_is_clamped() {
        let shadows = ShadowRenderer::default();
        let near = [BoundingSphere::new(Vec3::ONE, 0.5)];
        assert_eq!(shadows.fit_half_extent(Vec3::ZERO, &near), 10.0);
        let far = [BoundingSphere::new(Vec3::new(500.0, 0.0, 0.0), 1.0)];
        assert_eq!(shadows.fit_half_extent(Vec3::ZERO, &far), 100.0);
        let mid = [BoundingSphere::new(Vec3::new(30.0, 0.0, 0.0), 2.0)];
        assert_eq!(shadows.fit_half_extent(Vec3::ZERO, &mid), 32.0);
    }

    #[test]
    fn test_neutral_binding() {
        let assets = AssetTable::default();
        let binding = ShadowBinding::neutral(&assets);
        assert!(!binding.enabled);
        assert_eq!(binding.texture, assets.placeholder(Placeholder::White));
    }
}
