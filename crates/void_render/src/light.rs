//! Directional lights and shadow-caster selection

use glam::Vec3;
use serde::{Deserialize, Serialize};
use void_core::{Id, IdGenerator};

use crate::context::{GraphicsContext, UniformValue};

/// Identifier of a registered light
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LightId(pub Id);

/// Directional (sun-like) light
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels in
    pub direction: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub active: bool,
    pub casts_shadows: bool,
}

impl DirectionalLight {
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            ..Default::default()
        }
    }

    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }

    pub fn with_color(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// Active and shadow-enabled
    #[inline]
    pub fn is_shadow_caster(&self) -> bool {
        self.active && self.casts_shadows
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.3, -1.0, -0.5).normalize(),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            active: true,
            casts_shadows: false,
        }
    }
}

/// Registered lights in registration order
#[derive(Debug, Default)]
pub struct LightManager {
    lights: Vec<(LightId, DirectionalLight)>,
    ids: IdGenerator,
    ambient: [f32; 3],
}

impl LightManager {
    pub fn new() -> Self {
        Self {
            ambient: [0.1, 0.1, 0.1],
            ..Default::default()
        }
    }

    pub fn add(&mut self, light: DirectionalLight) -> LightId {
        let id = LightId(self.ids.next());
        self.lights.push((id, light));
        id
    }

    pub fn remove(&mut self, id: LightId) -> Option<DirectionalLight> {
        let index = self.lights.iter().position(|(lid, _)| *lid == id)?;
        Some(self.lights.remove(index).1)
    }

    pub fn get(&self, id: LightId) -> Option<&DirectionalLight> {
        self.lights.iter().find(|(lid, _)| *lid == id).map(|(_, l)| l)
    }

    pub fn get_mut(&mut self, id: LightId) -> Option<&mut DirectionalLight> {
        self.lights
            .iter_mut()
            .find(|(lid, _)| *lid == id)
            .map(|(_, l)| l)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LightId, &DirectionalLight)> {
        self.lights.iter().map(|(id, light)| (*id, light))
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn ambient(&self) -> [f32; 3] {
        self.ambient
    }

    pub fn set_ambient(&mut self, ambient: [f32; 3]) {
        self.ambient = ambient;
    }

    /// First active light, used for direct lighting
    pub fn primary(&self) -> Option<&DirectionalLight> {
        self.lights.iter().map(|(_, l)| l).find(|l| l.active)
    }

    /// The frame's shadow caster: first active, shadow-enabled light
    pub fn shadow_caster(&self) -> Option<(LightId, &DirectionalLight)> {
        self.iter().find(|(_, light)| light.is_shadow_caster())
    }

    /// Upload the primary light and ambient term to the bound program
    pub fn apply_uniforms(&self, gfx: &mut dyn GraphicsContext) {
        let (direction, color) = match self.primary() {
            Some(light) => (
                light.direction,
                Vec3::from(light.color) * light.intensity,
            ),
            None => (Vec3::NEG_Y, Vec3::ZERO),
        };
        gfx.set_uniform("u_lightDirection", UniformValue::Vec3(direction));
        gfx.set_uniform("u_lightColor", UniformValue::Vec3(color));
        gfx.set_uniform("u_ambient", UniformValue::Vec3(Vec3::from(self.ambient)));
    }
}
