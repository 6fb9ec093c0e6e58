//! 3D world layer
//!
//! Per frame, strictly in this order:
//!
//! 1. Cull: enabled entities whose bounds intersect the camera frustum (or
//!    that opt out of culling) are in view
//! 2. Sort the in-view set near-to-far by squared camera distance
//! 3. Shadow pre-pass when a light is active and casts shadows
//! 4. Opaque pass front-to-back with material binding
//! 5. Transparent pass back-to-front over the same set
//! 6. Debug overlay (bounds, physics shapes)
//!
//! Culling bypass, wireframe and overlays never change order or pass split.
//!
//! Each entity draw runs inside panic recovery: a failing entity is logged and
//! skipped, the pass continues and every toggled GPU state is restored. The
//! first failure of the frame is reported as the layer's error.

use glam::Mat4;
use void_core::FrameTime;
use void_render::debug::{aabb_lines, shape_lines};
use void_render::{
    execute_command, AssetProvider, Bounds, BoundingSphere, Camera, CommandList, CommandType,
    CommandTypeSet, CullMode, DebugConfig, DebugVisualization, DepthStatePayload, FrontFace,
    GraphicsContext, LightManager, PolygonMode, ShadowBinding, ShadowConfig, ShadowRenderer,
    UniformValue, DEBUG_LINES_SHADER,
};

use crate::entity::{Capabilities, EntityId, Renderable3D, SharedEntity};
use crate::env::{RenderEnv, RenderView};
use crate::layer::{Layer, LayerBase, LayerError};
use crate::recovery::catch_panic_mut;

/// Toggles of the 3D layer
#[derive(Clone, Debug, PartialEq)]
pub struct WorldSettings {
    pub frustum_culling: bool,
    pub wireframe: bool,
    /// Workaround for meshes with inconsistent winding: draw both faces
    pub disable_face_culling: bool,
    pub debug: DebugConfig,
    pub shadow: ShadowConfig,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            wireframe: false,
            disable_face_culling: false,
            debug: DebugConfig::default(),
            shadow: ShadowConfig::default(),
        }
    }
}

/// Counters of the last rendered frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub visible: usize,
    pub culled: usize,
    pub disabled: usize,
    pub opaque_draws: usize,
    pub transparent_draws: usize,
    pub shadow_casters: usize,
    pub shadow_pass: bool,
    /// Entity draws that panicked (any pass)
    pub failed_draws: usize,
}

/// An entity draw that panicked
struct DrawFailure {
    entity: EntityId,
    message: String,
}

struct Visible {
    entity: SharedEntity,
    id: EntityId,
    distance_sq: f32,
    bounds: Bounds,
    model: Mat4,
}

pub struct WorldLayer {
    base: LayerBase,
    settings: WorldSettings,
    shadows: ShadowRenderer,
    visible: Vec<Visible>,
    stats: WorldStats,
    camera_missing: bool,
}

impl WorldLayer {
    pub fn new(name: impl Into<String>, priority: i32, settings: WorldSettings) -> Self {
        let base = LayerBase::new(name, priority);
        if settings.disable_face_culling {
            log::warn!("{}: face culling disabled (winding workaround)", base.name());
        }
        Self {
            base,
            shadows: ShadowRenderer::new(settings.shadow.clone()),
            settings,
            visible: Vec::new(),
            stats: WorldStats::default(),
            camera_missing: false,
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: WorldSettings) {
        self.shadows.set_config(settings.shadow.clone());
        self.settings = settings;
    }

    pub fn stats(&self) -> WorldStats {
        self.stats
    }

    pub fn shadow_renderer(&self) -> &ShadowRenderer {
        &self.shadows
    }

    /// In-view entities of the last frame, near-to-far
    pub fn visible_ids(&self) -> Vec<EntityId> {
        self.visible.iter().map(|v| v.id).collect()
    }

    fn wireframe(&self) -> bool {
        self.settings.wireframe || self.settings.debug.flags.contains(DebugVisualization::WIREFRAME)
    }

    fn cull(&mut self, camera: &Camera) {
        self.visible.clear();
        let eye = camera.position();
        let frustum = camera.frustum();

        for entity in self.base.entities() {
            let guard = entity.read();
            let Some(renderable) = guard.as_renderable_3d() else {
                continue;
            };
            if !guard.is_enabled() {
                self.stats.disabled += 1;
                continue;
            }

            let bounds = renderable.world_bounds();
            let in_view = !self.settings.frustum_culling
                || !renderable.cull_enabled()
                || match &bounds {
                    Bounds::Box(aabb) => frustum.intersects_aabb(aabb),
                    Bounds::Sphere(sphere) => frustum.intersects_sphere(sphere),
                };
            if !in_view {
                self.stats.culled += 1;
                continue;
            }

            let transform = renderable.transform();
            self.visible.push(Visible {
                entity: entity.clone(),
                id: guard.id(),
                distance_sq: transform.position.distance_squared(eye),
                bounds,
                model: transform.matrix(),
            });
        }

        self.visible
            .sort_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq));
        self.stats.visible = self.visible.len();
    }

    fn shadow_pass(
        &mut self,
        env: &mut RenderEnv<'_>,
        camera: &Camera,
        failures: &mut Vec<DrawFailure>,
    ) -> ShadowBinding {
        let assets = env.assets;
        let lights = env.lights;
        let Some((_, light)) = lights.shadow_caster() else {
            return ShadowBinding::neutral(assets);
        };
        if !self.shadows.config().enabled {
            return ShadowBinding::neutral(assets);
        }

        let focus = camera.position();
        let spheres: Vec<BoundingSphere> = self.visible.iter().map(|v| v.bounds.sphere()).collect();
        let half_extent = self.shadows.fit_half_extent(focus, &spheres);

        let name = self.base.name();
        let visible = &self.visible;
        let mut casters = 0;
        let binding = self
            .shadows
            .render(&mut *env.gfx, assets, light, focus, half_extent, |gfx, pass| {
                for v in visible {
                    let cast = guarded_draw(name, "shadow", v.id, failures, || {
                        let guard = v.entity.read();
                        let caster = guard
                            .as_renderable_3d()
                            .and_then(|r| r.as_shadow_caster());
                        match caster {
                            Some(caster) => {
                                gfx.set_uniform("u_model", UniformValue::Mat4(v.model));
                                caster.draw_shadow(&mut *gfx, pass);
                                true
                            }
                            None => false,
                        }
                    });
                    if cast == Some(true) {
                        casters += 1;
                    }
                }
            });

        self.stats.shadow_casters = casters;
        self.stats.shadow_pass = true;
        binding
    }

    fn apply_raster_state(&self, gfx: &mut dyn GraphicsContext) {
        if self.wireframe() {
            gfx.set_polygon_mode(PolygonMode::Line);
            gfx.set_cull_mode(CullMode::None, FrontFace::Ccw);
        } else if self.settings.disable_face_culling {
            gfx.set_cull_mode(CullMode::None, FrontFace::Ccw);
        } else {
            gfx.set_cull_mode(CullMode::Back, FrontFace::Ccw);
        }
        gfx.set_depth_state(&DepthStatePayload::default());
    }

    fn opaque_pass(
        &mut self,
        env: &mut RenderEnv<'_>,
        camera: &Camera,
        shadow: &ShadowBinding,
        failures: &mut Vec<DrawFailure>,
    ) {
        let name = self.base.name();
        let mut draws = 0;
        for v in &self.visible {
            let drawn = guarded_draw(name, "opaque", v.id, failures, || {
                let guard = v.entity.read();
                let Some(renderable) = guard.as_renderable_3d() else {
                    return false;
                };
                let mut view = bind_for_draw(&mut *env, camera, renderable, shadow, v.model);
                renderable.draw(&mut view);
                true
            });
            if drawn == Some(true) {
                draws += 1;
            }
        }
        self.stats.opaque_draws = draws;
    }

    fn transparent_pass(
        &mut self,
        env: &mut RenderEnv<'_>,
        camera: &Camera,
        shadow: &ShadowBinding,
        failures: &mut Vec<DrawFailure>,
    ) {
        env.gfx.set_depth_state(&DepthStatePayload {
            write: false,
            ..Default::default()
        });

        let name = self.base.name();
        let mut draws = 0;
        for v in self.visible.iter().rev() {
            let drawn = guarded_draw(name, "transparent", v.id, failures, || {
                let guard = v.entity.read();
                let Some(renderable) = guard.as_renderable_3d() else {
                    return false;
                };
                let Some(transparent) = renderable.as_transparent() else {
                    return false;
                };
                let mut view = bind_for_draw(&mut *env, camera, renderable, shadow, v.model);
                transparent.draw_transparent(&mut view);
                true
            });
            if drawn == Some(true) {
                draws += 1;
            }
        }
        self.stats.transparent_draws = draws;

        env.gfx.set_depth_state(&DepthStatePayload::default());
    }

    fn debug_overlay(&self, env: &mut RenderEnv<'_>, camera: &Camera) {
        let debug = &self.settings.debug;
        if !debug.flags.wants_lines() {
            return;
        }

        let mut lines = Vec::new();
        for v in &self.visible {
            if debug.flags.contains(DebugVisualization::BOUNDS) {
                aabb_lines(&v.bounds.aabb(), debug.bounds_color, &mut lines);
            }
            if debug.flags.contains(DebugVisualization::PHYSICS_SHAPES) {
                let guard = v.entity.read();
                let shape = guard.as_renderable_3d().and_then(|r| r.physics_shape());
                if let Some(shape) = shape {
                    shape_lines(&shape, &v.model, debug.physics_color, &mut lines);
                }
            }
        }
        if lines.is_empty() {
            return;
        }

        let gfx = &mut *env.gfx;
        match env.assets.shader_program(DEBUG_LINES_SHADER) {
            Some(program) => {
                gfx.use_program(program);
                gfx.set_uniform(
                    "u_viewProjection",
                    UniformValue::Mat4(camera.view_projection()),
                );
            }
            None => log::warn!("{}: '{}' program missing", self.base.name(), DEBUG_LINES_SHADER),
        }

        let previous = gfx.line_width();
        gfx.set_line_width(debug.line_width);
        gfx.draw_lines(&lines);
        gfx.set_line_width(previous);
    }
}

/// Run one entity's draw. A panic is logged and recorded, and `None` returned
fn guarded_draw<R>(
    layer: &str,
    pass: &str,
    entity: EntityId,
    failures: &mut Vec<DrawFailure>,
    draw: impl FnMut() -> R,
) -> Option<R> {
    match catch_panic_mut(draw) {
        Ok(result) => Some(result),
        Err(message) => {
            log::error!(
                "{}: {} draw of entity {} failed: {}",
                layer,
                pass,
                entity,
                message
            );
            failures.push(DrawFailure { entity, message });
            None
        }
    }
}

/// Bind the material (if any) and lights, then build the entity's view
fn bind_for_draw<'v>(
    env: &'v mut RenderEnv<'_>,
    camera: &'v Camera,
    renderable: &dyn Renderable3D,
    shadow: &ShadowBinding,
    model: Mat4,
) -> RenderView<'v> {
    let assets: &'v dyn AssetProvider = env.assets;
    let lights: &LightManager = env.lights;
    let shadows_enabled = match renderable.material() {
        Some(material) => {
            let receive = material.bind(&mut *env.gfx, assets, shadow, renderable.receive_shadows());
            lights.apply_uniforms(&mut *env.gfx);
            receive
        }
        None => false,
    };
    let mut view = RenderView {
        gfx: &mut *env.gfx,
        camera,
        assets,
        model,
        shadows_enabled,
    };
    view.upload_transforms();
    view
}

impl Default for WorldLayer {
    fn default() -> Self {
        Self::new("world", super::priority::WORLD, WorldSettings::default())
    }
}

impl Layer for WorldLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn supported_commands(&self) -> CommandTypeSet {
        CommandTypeSet::of(&[
            CommandType::Clear,
            CommandType::DrawArray,
            CommandType::SetDepthState,
            CommandType::SetCullMode,
            CommandType::SetUniforms,
            CommandType::UseShader,
        ])
    }

    fn accepts(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(Capabilities::RENDERABLE_3D)
    }

    fn collect_render_commands(
        &mut self,
        _frame: &FrameTime,
        out: &mut CommandList,
    ) -> Result<(), LayerError> {
        for entity in self.base.entities() {
            let guard = entity.read();
            if !guard.is_enabled() {
                continue;
            }
            if let Some(renderable) = guard.as_renderable_3d() {
                renderable.collect_render_commands(out);
            }
        }
        Ok(())
    }

    fn process_render_commands(
        &mut self,
        commands: &CommandList,
        env: &mut RenderEnv<'_>,
    ) -> Result<(), LayerError> {
        for command in commands {
            execute_command(&mut *env.gfx, command);
        }

        let Some(camera) = env.camera else {
            if !self.camera_missing {
                log::warn!("{}: no camera, skipping 3D rendering", self.base.name());
                self.camera_missing = true;
            }
            self.visible.clear();
            self.stats = WorldStats::default();
            return Ok(());
        };
        if self.camera_missing {
            log::info!("{}: camera available, resuming 3D rendering", self.base.name());
            self.camera_missing = false;
        }

        self.stats = WorldStats::default();
        self.cull(camera);
        let mut failures = Vec::new();
        let shadow = self.shadow_pass(env, camera, &mut failures);

        self.apply_raster_state(&mut *env.gfx);
        self.opaque_pass(env, camera, &shadow, &mut failures);
        self.transparent_pass(env, camera, &shadow, &mut failures);
        if self.wireframe() {
            env.gfx.set_polygon_mode(PolygonMode::Fill);
        }
        if self.wireframe() || self.settings.disable_face_culling {
            env.gfx.set_cull_mode(CullMode::Back, FrontFace::Ccw);
        }
        self.debug_overlay(env, camera);

        let skipped = self.stats.culled + self.stats.disabled;
        self.base.processed(self.stats.visible as u64);
        self.base.skipped(skipped as u64);
        self.stats.failed_draws = failures.len();

        match failures.into_iter().next() {
            Some(DrawFailure { entity, message }) => Err(LayerError::Entity { entity, message }),
            None => Ok(()),
        }
    }

    fn dispose(&mut self, gfx: &mut dyn GraphicsContext) {
        self.shadows.dispose(gfx);
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{share, GameObject};
    use crate::transform::Transform;
    use glam::Vec3;
    use void_render::{AssetTable, DirectionalLight, RecordingContext};

    struct Probe {
        id: EntityId,
        transform: Transform,
        enabled: bool,
        cull: bool,
    }

    impl GameObject for Probe {
        fn id(&self) -> EntityId {
            self.id
        }
        fn name(&self) -> &str {
            "probe"
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::RENDERABLE_3D
        }
        fn as_renderable_3d(&self) -> Option<&dyn Renderable3D> {
            Some(self)
        }
    }

    impl Renderable3D for Probe {
        fn transform(&self) -> Transform {
            self.transform
        }
        fn cull_enabled(&self) -> bool {
            self.cull
        }
        fn draw(&self, _view: &mut RenderView<'_>) {}
    }

    fn probe(n: u32, z: f32) -> SharedEntity {
        share(Probe {
            id: EntityId::new(n, 0),
            transform: Transform::from_position(Vec3::new(0.0, 0.0, z)),
            enabled: true,
            cull: true,
        })
    }

    fn camera() -> Camera {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[test]
    fn test_culls_beyond_far_plane() {
        let mut layer = WorldLayer::default();
        layer.add_entity(probe(1, 0.0));
        layer.add_entity(probe(2, -500.0));

        let (camera, lights, assets) = (camera(), LightManager::new(), AssetTable::with_builtin_shaders());
        let mut gfx = RecordingContext::default();
        let mut env = RenderEnv::new(&mut gfx, Some(&camera), &lights, &assets);
        layer.process_render_commands(&CommandList::new(), &mut env).unwrap();

        assert_eq!(layer.visible_ids(), vec![EntityId::new(1, 0)]);
        assert_eq!(layer.stats().culled, 1);
    }

    #[test]
    fn test_culling_toggle_keeps_order() {
        let settings = WorldSettings {
            frustum_culling: false,
            ..Default::default()
        };
        let mut layer = WorldLayer::new("world", 0, settings);
        layer.add_entity(probe(1, -500.0));
        layer.add_entity(probe(2, 5.0));

        let (camera, lights, assets) = (camera(), LightManager::new(), AssetTable::with_builtin_shaders());
        let mut gfx = RecordingContext::default();
        let mut env = RenderEnv::new(&mut gfx, Some(&camera), &lights, &assets);
        layer.process_render_commands(&CommandList::new(), &mut env).unwrap();

        assert_eq!(
            layer.visible_ids(),
            vec![EntityId::new(2, 0), EntityId::new(1, 0)]
        );
    }

    #[test]
    fn test_no_camera_skips_rendering() {
        let mut layer = WorldLayer::default();
        layer.add_entity(probe(1, 0.0));
        let (lights, assets) = (LightManager::new(), AssetTable::default());
        let mut gfx = RecordingContext::default();
        let mut env = RenderEnv::new(&mut gfx, None, &lights, &assets);

        assert!(layer.process_render_commands(&CommandList::new(), &mut env).is_ok());
        assert!(layer.visible_ids().is_empty());
        assert!(gfx.calls().is_empty());
    }

    #[test]
    fn test_wireframe_uses_line_mode() {
        let settings = WorldSettings {
            wireframe: true,
            ..Default::default()
        };
        let mut layer = WorldLayer::new("world", 0, settings);
        layer.add_entity(probe(1, 0.0));

        let (camera, lights, assets) = (camera(), LightManager::new(), AssetTable::with_builtin_shaders());
        let mut gfx = RecordingContext::default();
        let mut env = RenderEnv::new(&mut gfx, Some(&camera), &lights, &assets);
        layer.process_render_commands(&CommandList::new(), &mut env).unwrap();

        let calls = gfx.calls();
        assert!(calls.contains(&void_render::GpuCall::SetPolygonMode(PolygonMode::Line)));
        assert!(calls.contains(&void_render::GpuCall::SetCullMode(CullMode::None, FrontFace::Ccw)));
        assert_eq!(gfx.polygon_mode(), PolygonMode::Fill);
    }

    #[test]
    fn test_shadow_pass_only_with_caster_light() {
        let mut layer = WorldLayer::default();
        layer.add_entity(probe(1, 0.0));
        let camera = camera();
        let assets = AssetTable::with_builtin_shaders();
        let mut gfx = RecordingContext::default();

        let mut lights = LightManager::new();
        lights.add(DirectionalLight::new(Vec3::NEG_Y));
        let mut env = RenderEnv::new(&mut gfx, Some(&camera), &lights, &assets);
        layer.process_render_commands(&CommandList::new(), &mut env).unwrap();
        assert!(!layer.stats().shadow_pass);

        lights.add(DirectionalLight::new(Vec3::NEG_Y).with_shadows(true));
        let mut env = RenderEnv::new(&mut gfx, Some(&camera), &lights, &assets);
        layer.process_render_commands(&CommandList::new(), &mut env).unwrap();
        assert!(layer.stats().shadow_pass);

        layer.dispose(&mut gfx);
        layer.dispose(&mut gfx);
        assert_eq!(gfx.live_targets(), 0);
    }
}
