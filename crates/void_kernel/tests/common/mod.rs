//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use glam::{Vec2, Vec3};
use parking_lot::Mutex;
use void_core::{FrameTime, Id};
use void_kernel::prelude::*;
use void_render::{
    Camera, CommandList, DrawTexturePayload, GraphicsContext, Material, ShadowPass, TextureHandle,
    WindowPayload,
};

/// Which pass drew which entity, in call order
pub type DrawLog = Arc<Mutex<Vec<(&'static str, EntityId)>>>;

pub fn draw_log() -> DrawLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn ids(log: &DrawLog, pass: &str) -> Vec<u32> {
    log.lock()
        .iter()
        .filter(|(p, _)| *p == pass)
        .map(|(_, id)| id.index())
        .collect()
}

pub fn frame(n: u64) -> FrameTime {
    FrameTime::new(n, 0.016, n as f32 * 0.016)
}

/// Camera at z = 10 looking at the origin
pub fn camera() -> Camera {
    let mut camera = Camera::perspective(60.0, 16.0 / 9.0, 0.1, 100.0);
    camera.set_position(Vec3::new(0.0, 0.0, 10.0));
    camera.look_at(Vec3::ZERO);
    camera
}

/// Configurable 3D object
pub struct Prop {
    pub id: EntityId,
    pub transform: Transform,
    pub enabled: bool,
    pub transparent: bool,
    pub casts_shadows: bool,
    pub material: Option<Material>,
    /// Pass ("shadow", "opaque", "transparent") whose draw panics
    pub fails_in: Option<&'static str>,
    pub log: DrawLog,
}

impl Prop {
    pub fn new(index: u32, position: Vec3, log: &DrawLog) -> Self {
        Self {
            id: Id::new(index, 0),
            transform: Transform::from_position(position),
            enabled: true,
            transparent: false,
            casts_shadows: false,
            material: None,
            fails_in: None,
            log: log.clone(),
        }
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn casting_shadows(mut self) -> Self {
        self.casts_shadows = true;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn failing_in(mut self, pass: &'static str) -> Self {
        self.fails_in = Some(pass);
        self
    }

    fn record(&self, pass: &'static str) {
        if self.fails_in == Some(pass) {
            panic!("prop {} broke in {} pass", self.id, pass);
        }
        self.log.lock().push((pass, self.id));
    }
}

impl GameObject for Prop {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        "prop"
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

impl Renderable3D for Prop {
    fn transform(&self) -> Transform {
        self.transform
    }
    fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }
    fn draw(&self, _view: &mut RenderView<'_>) {
        self.record("opaque");
    }
    fn as_shadow_caster(&self) -> Option<&dyn ShadowCaster> {
        if self.casts_shadows {
            Some(self)
        } else {
            None
        }
    }
    fn as_transparent(&self) -> Option<&dyn TransparentRenderable> {
        if self.transparent {
            Some(self)
        } else {
            None
        }
    }
}

impl ShadowCaster for Prop {
    fn draw_shadow(&self, _gfx: &mut dyn GraphicsContext, _pass: &ShadowPass) {
        self.record("shadow");
    }
}

impl TransparentRenderable for Prop {
    fn draw_transparent(&self, _view: &mut RenderView<'_>) {
        self.record("transparent");
    }
}

/// 2D object that also asks for a window title change
pub struct Badge {
    pub id: EntityId,
    pub title: Option<String>,
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
        Transform2D::from_position(Vec2::new(16.0, 16.0))
    }
    fn collect_render_commands(&self, out: &mut CommandList) {
        out.push_payload(DrawTexturePayload::new(
            TextureHandle(7),
            Vec2::new(16.0, 16.0),
            Vec2::new(32.0, 32.0),
        ));
        if let Some(title) = &self.title {
            out.push_payload(WindowPayload::set_title(title.clone()));
        }
    }
}

/// Updatable counter
pub struct Ticker {
    pub id: EntityId,
    pub ticks: Arc<Mutex<u64>>,
}

impl GameObject for Ticker {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        "ticker"
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn set_enabled(&mut self, _enabled: bool) {}
    fn capabilities(&self) -> Capabilities {
        Capabilities::UPDATABLE
    }
    fn as_updatable_mut(&mut self) -> Option<&mut dyn Updatable> {
        Some(self)
    }
}

impl Updatable for Ticker {
    fn update(&mut self, _frame: &FrameTime) {
        *self.ticks.lock() += 1;
    }
}
