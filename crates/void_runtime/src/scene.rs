//! Demo scene
//!
//! A ring of spinning crates over a ground slab, a glass pane, a HUD badge
//! and a stats panel. Geometry lives behind fixed vertex array handles; the
//! recording backend only needs the calls.

use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use parking_lot::RwLock;
use void_core::{FrameTime, IdGenerator};
use void_kernel::prelude::*;
use void_render::{
    Aabb, CommandList, DrawArrayPayload, DrawTextPayload, DrawTexturePayload, GraphicsContext,
    Material, PhysicsShape, PixelRect, RenderCommand, ScissorPayload, ShadowPass, TextureHandle,
    VertexArrayHandle, WindowPayload,
};

const CUBE: VertexArrayHandle = VertexArrayHandle(1);
const QUAD: VertexArrayHandle = VertexArrayHandle(2);

pub struct Crate {
    id: EntityId,
    transform: Transform,
    /// Radians per second around +Y
    speed: f32,
    enabled: bool,
    material: Material,
}

impl Crate {
    pub fn new(id: EntityId, position: Vec3, speed: f32) -> Self {
        Self {
            id,
            transform: Transform::from_position(position),
            speed,
            enabled: true,
            material: Material::new("crate").with_tint([0.8, 0.6, 0.4, 1.0]),
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl GameObject for Crate {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        "crate"
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::UPDATABLE | Capabilities::RENDERABLE_3D
    }
    fn as_updatable_mut(&mut self) -> Option<&mut dyn Updatable> {
        Some(self)
    }
    fn as_renderable_3d(&self) -> Option<&dyn Renderable3D> {
        Some(self)
    }
}

impl Updatable for Crate {
    fn update(&mut self, frame: &FrameTime) {
        let spin = Quat::from_rotation_y(self.speed * frame.smooth_delta());
        self.transform.rotation = (spin * self.transform.rotation).normalize();
    }
}

impl Renderable3D for Crate {
    fn transform(&self) -> Transform {
        self.transform
    }
    fn local_bounds(&self) -> Option<Aabb> {
        Some(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)))
    }
    fn material(&self) -> Option<&Material> {
        Some(&self.material)
    }
    fn draw(&self, view: &mut RenderView<'_>) {
        view.submit(&RenderCommand::new(DrawArrayPayload::triangles(CUBE, 36)));
    }
    fn as_shadow_caster(&self) -> Option<&dyn ShadowCaster> {
        Some(self)
    }
    fn physics_shape(&self) -> Option<PhysicsShape> {
        Some(PhysicsShape::Box {
            half_extents: Vec3::splat(0.5),
        })
    }
}

impl ShadowCaster for Crate {
    fn draw_shadow(&self, gfx: &mut dyn GraphicsContext, _pass: &ShadowPass) {
        gfx.draw_arrays(&DrawArrayPayload::triangles(CUBE, 36));
    }
}

/// Large static slab; never culled
pub struct Ground {
    id: EntityId,
    material: Material,
}

impl GameObject for Ground {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        "ground"
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn set_enabled(&mut self, _enabled: bool) {}
    fn capabilities(&self) -> Capabilities {
        Capabilities::RENDERABLE_3D
    }
    fn as_renderable_3d(&self) -> Option<&dyn Renderable3D> {
        Some(self)
    }
}

impl Renderable3D for Ground {
    fn transform(&self) -> Transform {
        Transform::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::new(40.0, 0.2, 40.0))
    }
    fn cull_enabled(&self) -> bool {
        false
    }
    fn material(&self) -> Option<&Material> {
        Some(&self.material)
    }
    fn draw(&self, view: &mut RenderView<'_>) {
        view.submit(&RenderCommand::new(DrawArrayPayload::triangles(CUBE, 36)));
    }
}

/// Glass pane drawn in the transparent pass
pub struct Pane {
    id: EntityId,
    material: Material,
}

impl GameObject for Pane {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        "pane"
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn set_enabled(&mut self, _enabled: bool) {}
    fn capabilities(&self) -> Capabilities {
        Capabilities::RENDERABLE_3D
    }
    fn as_renderable_3d(&self) -> Option<&dyn Renderable3D> {
        Some(self)
    }
}

impl Renderable3D for Pane {
    fn transform(&self) -> Transform {
        Transform::from_position(Vec3::new(0.0, 0.5, 2.0)).with_scale(Vec3::new(3.0, 2.0, 0.05))
    }
    fn material(&self) -> Option<&Material> {
        Some(&self.material)
    }
    fn receive_shadows(&self) -> bool {
        false
    }
    fn draw(&self, _view: &mut RenderView<'_>) {}
    fn as_transparent(&self) -> Option<&dyn TransparentRenderable> {
        Some(self)
    }
}

impl TransparentRenderable for Pane {
    fn draw_transparent(&self, view: &mut RenderView<'_>) {
        view.submit(&RenderCommand::new(DrawArrayPayload::triangles(QUAD, 6)));
    }
}

/// Screen-space logo; retitles the window once
pub struct Badge {
    id: EntityId,
    title: Option<String>,
}

impl GameObject for Badge {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        "badge"
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn set_enabled(&mut self, _enabled: bool) {}
    fn capabilities(&self) -> Capabilities {
        Capabilities::RENDERABLE_2D
    }
    fn as_renderable_2d(&self) -> Option<&dyn Renderable2D> {
        Some(self)
    }
}

impl Renderable2D for Badge {
    fn transform_2d(&self) -> Transform2D {
        Transform2D::from_position(Vec2::new(24.0, 24.0))
    }
    fn collect_render_commands(&self, out: &mut CommandList) {
        let at = self.transform_2d().position;
        out.push_payload(DrawTexturePayload::new(
            TextureHandle(100),
            at,
            Vec2::new(64.0, 64.0),
        ));
        if let Some(title) = &self.title {
            out.push_payload(WindowPayload::set_title(title.clone()));
        }
    }
}

/// Frame counter panel
pub struct StatsPanel {
    id: EntityId,
    frames: u64,
}

impl GameObject for StatsPanel {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        "stats"
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn set_enabled(&mut self, _enabled: bool) {}
    fn capabilities(&self) -> Capabilities {
        Capabilities::DEBUG_PANEL
    }
    fn as_debug_panel_mut(&mut self) -> Option<&mut dyn DebugPanel> {
        Some(self)
    }
}

impl DebugPanel for StatsPanel {
    fn panel_title(&self) -> &str {
        "Stats"
    }
    fn build_panel(&mut self, out: &mut CommandList) {
        self.frames += 1;
        out.push_payload(ScissorPayload {
            rect: Some(PixelRect::new(8, 8, 240, 64)),
        });
        out.push_payload(DrawTextPayload::new(
            "mono",
            format!("{}: {} frames", self.panel_title(), self.frames),
            Vec2::new(12.0, 12.0),
        ));
    }
}

/// Entities of the demo plus handles the runtime pokes at
pub struct Scene {
    pub crates: Vec<Arc<RwLock<Crate>>>,
    pub all: Vec<SharedEntity>,
}

pub fn build(crate_count: usize) -> Scene {
    let ids = IdGenerator::starting_at(1);
    let mut crates = Vec::with_capacity(crate_count);
    for i in 0..crate_count {
        let angle = i as f32 / crate_count.max(1) as f32 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos() * 6.0, 0.0, angle.sin() * 6.0);
        let speed = 0.5 + i as f32 * 0.1;
        crates.push(Arc::new(RwLock::new(Crate::new(ids.next(), position, speed))));
    }

    let mut all: Vec<SharedEntity> = crates
        .iter()
        .map(|c| c.clone() as SharedEntity)
        .collect();
    all.push(share(Ground {
        id: ids.next(),
        material: Material::new("ground"),
    }));
    all.push(share(Pane {
        id: ids.next(),
        material: Material::new("glass").with_tint([0.6, 0.8, 1.0, 0.3]),
    }));
    all.push(share(Badge {
        id: ids.next(),
        title: Some("Void Engine (headless)".into()),
    }));
    all.push(share(StatsPanel {
        id: ids.next(),
        frames: 0,
    }));

    Scene { crates, all }
}
