//! Materials
//!
//! A material names its textures and scalar parameters. Binding it uploads
//! the uniform block, binds one texture per slot (a placeholder when a slot
//! is unset) and wires up the shadow map.
//!
//! ## Texture slots
//!
//! | Slot | Texture    | Fallback |
//! |------|------------|----------|
//! | 0    | albedo     | white    |
//! | 1    | normal     | white    |
//! | 2    | roughness  | white    |
//! | 3    | metallic   | black    |
//! | 4    | emissive   | black    |
//! | 5    | shadow map | white    |

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::assets::{AssetProvider, Placeholder, LIT_SHADER};
use crate::context::{GraphicsContext, UniformValue};
use crate::handle::{ShaderHandle, TextureHandle};
use crate::shadow::ShadowBinding;

/// Texture unit assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TextureSlot {
    Albedo = 0,
    Normal = 1,
    Roughness = 2,
    Metallic = 3,
    Emissive = 4,
    ShadowMap = 5,
}

impl TextureSlot {
    /// Material-owned slots (the shadow map is bound separately)
    pub const MATERIAL: [TextureSlot; 5] = [
        TextureSlot::Albedo,
        TextureSlot::Normal,
        TextureSlot::Roughness,
        TextureSlot::Metallic,
        TextureSlot::Emissive,
    ];

    #[inline]
    pub const fn unit(self) -> u32 {
        self as u32
    }

    /// Placeholder bound when the slot is empty
    pub const fn fallback(self) -> Placeholder {
        match self {
            TextureSlot::Metallic | TextureSlot::Emissive => Placeholder::Black,
            _ => Placeholder::White,
        }
    }

    pub const fn sampler_name(self) -> &'static str {
        match self {
            TextureSlot::Albedo => "u_albedoMap",
            TextureSlot::Normal => "u_normalMap",
            TextureSlot::Roughness => "u_roughnessMap",
            TextureSlot::Metallic => "u_metallicMap",
            TextureSlot::Emissive => "u_emissiveMap",
            TextureSlot::ShadowMap => "u_shadowMap",
        }
    }
}

/// Flags packed into [`MaterialUniforms::flags`]
pub mod material_flags {
    pub const HAS_NORMAL_MAP: u32 = 1 << 0;
    pub const RECEIVE_SHADOWS: u32 = 1 << 1;
}

/// GPU layout of the material parameters
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub tint: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
    pub emissive_intensity: f32,
    pub flags: u32,
}

/// Surface description of a 3D renderable
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    /// Program override, the lit program when `None`
    pub shader: Option<ShaderHandle>,
    pub albedo: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub roughness_map: Option<TextureHandle>,
    pub metallic_map: Option<TextureHandle>,
    pub emissive_map: Option<TextureHandle>,
    pub tint: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
    pub emissive_intensity: f32,
    pub receive_shadows: bool,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_albedo(mut self, texture: TextureHandle) -> Self {
        self.albedo = Some(texture);
        self
    }

    pub fn with_tint(mut self, tint: [f32; 4]) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_receive_shadows(mut self, receive: bool) -> Self {
        self.receive_shadows = receive;
        self
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<TextureHandle> {
        match slot {
            TextureSlot::Albedo => self.albedo,
            TextureSlot::Normal => self.normal,
            TextureSlot::Roughness => self.roughness_map,
            TextureSlot::Metallic => self.metallic_map,
            TextureSlot::Emissive => self.emissive_map,
            TextureSlot::ShadowMap => None,
        }
    }

    /// Uniform block with shadow sampling decided by the caller
    pub fn uniforms(&self, receive_shadows: bool) -> MaterialUniforms {
        let mut flags = 0;
        if self.normal.is_some() {
            flags |= material_flags::HAS_NORMAL_MAP;
        }
        if receive_shadows {
            flags |= material_flags::RECEIVE_SHADOWS;
        }
        MaterialUniforms {
            tint: self.tint,
            roughness: self.roughness,
            metallic: self.metallic,
            emissive_intensity: self.emissive_intensity,
            flags,
        }
    }

    /// Bind program, textures, uniforms and shadow map. Returns whether shadow
    /// sampling was enabled for this draw
    pub fn bind(
        &self,
        gfx: &mut dyn GraphicsContext,
        assets: &dyn AssetProvider,
        shadow: &ShadowBinding,
        entity_receives_shadows: bool,
    ) -> bool {
        match self.shader.or_else(|| assets.shader_program(LIT_SHADER)) {
            Some(program) => gfx.use_program(program),
            None => log::warn!("material '{}': no '{}' program available", self.name, LIT_SHADER),
        }

        for slot in TextureSlot::MATERIAL {
            let texture = self
                .texture(slot)
                .unwrap_or_else(|| assets.placeholder(slot.fallback()));
            gfx.bind_texture(slot.unit(), texture);
            gfx.set_uniform(slot.sampler_name(), UniformValue::Sampler(slot.unit()));
        }

        let receive = entity_receives_shadows && self.receive_shadows && shadow.enabled;
        gfx.bind_texture(TextureSlot::ShadowMap.unit(), shadow.texture);
        gfx.set_uniform(
            TextureSlot::ShadowMap.sampler_name(),
            UniformValue::Sampler(TextureSlot::ShadowMap.unit()),
        );
        gfx.set_uniform("u_lightSpaceMatrix", UniformValue::Mat4(shadow.light_space));
        gfx.set_uniform("u_shadowBias", UniformValue::Float(shadow.depth_bias));

        let block = self.uniforms(receive);
        gfx.set_uniform("u_tint", UniformValue::Vec4(Vec4::from(block.tint)));
        gfx.set_uniform("u_roughness", UniformValue::Float(block.roughness));
        gfx.set_uniform("u_metallic", UniformValue::Float(block.metallic));
        gfx.set_uniform(
            "u_emissiveIntensity",
            UniformValue::Float(block.emissive_intensity),
        );
        gfx.set_uniform(
            "u_hasNormalMap",
            UniformValue::Bool(block.flags & material_flags::HAS_NORMAL_MAP != 0),
        );
        gfx.set_uniform("u_receiveShadows", UniformValue::Bool(receive));
        receive
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            shader: None,
            albedo: None,
            normal: None,
            roughness_map: None,
            metallic_map: None,
            emissive_map: None,
            tint: [1.0, 1.0, 1.0, 1.0],
            roughness: 0.5,
            metallic: 0.0,
            emissive_intensity: 0.0,
            receive_shadows: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetTable;
    use crate::recording::RecordingContext;
    use glam::Mat4;

    fn shadow(enabled: bool) -> ShadowBinding {
        ShadowBinding {
            texture: TextureHandle(77),
            light_space: Mat4::IDENTITY,
            depth_bias: 0.005,
            enabled,
        }
    }

    #[test]
    fn test_placeholders_for_empty_slots() {
        let assets = AssetTable::with_builtin_shaders();
        let mut gfx = RecordingContext::default();
        let material = Material::new("brick").with_albedo(TextureHandle(50));
        material.bind(&mut gfx, &assets, &shadow(true), true);

        let white = assets.placeholder(Placeholder::White);
        let black = assets.placeholder(Placeholder::Black);
        assert_eq!(gfx.last_bound(0), Some(TextureHandle(50)));
        assert_eq!(gfx.last_bound(1), Some(white));
        assert_eq!(gfx.last_bound(2), Some(white));
        assert_eq!(gfx.last_bound(3), Some(black));
        assert_eq!(gfx.last_bound(4), Some(black));
        assert_eq!(gfx.last_bound(5), Some(TextureHandle(77)));
        assert_eq!(gfx.current_program(), assets.shader_program(LIT_SHADER));
    }

    #[test]
    fn test_receive_shadows_requires_all_flags() {
        let assets = AssetTable::with_builtin_shaders();
        let mut gfx = RecordingContext::default();
        let receiving = Material::default();
        let opted_out = Material::default().with_receive_shadows(false);

        assert!(receiving.bind(&mut gfx, &assets, &shadow(true), true));
        assert!(!receiving.bind(&mut gfx, &assets, &shadow(true), false));
        assert!(!opted_out.bind(&mut gfx, &assets, &shadow(true), true));
        assert!(!receiving.bind(&mut gfx, &assets, &shadow(false), true));
        assert_eq!(
            gfx.last_uniform("u_receiveShadows"),
            Some(UniformValue::Bool(false))
        );
    }

    #[test]
    fn test_uniform_block_is_pod() {
        let block = Material::default().uniforms(true);
        let bytes: &[u8] = bytemuck::bytes_of(&block);
        assert_eq!(bytes.len(), 32);
        assert_eq!(block.flags, material_flags::RECEIVE_SHADOWS);
    }
}
