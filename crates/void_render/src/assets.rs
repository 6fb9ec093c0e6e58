//! Asset lookup boundary
//!
//! Loading and caching live outside the runtime. Layers only resolve names to
//! handles through [`AssetProvider`], which must always be able to hand out
//! the white and black placeholder textures.

use std::collections::HashMap;

use crate::handle::{ShaderHandle, TextureHandle};

/// Lit material program
pub const LIT_SHADER: &str = "lit";
/// Depth-only program used by the shadow pre-pass
pub const SHADOW_DEPTH_SHADER: &str = "shadow_depth";
/// Unlit colored line program used by debug overlays
pub const DEBUG_LINES_SHADER: &str = "debug_lines";

/// Shared 1x1 fallback textures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placeholder {
    White,
    Black,
}

/// Resolves asset names to GPU handles
pub trait AssetProvider {
    fn texture(&self, name: &str) -> Option<TextureHandle>;
    fn shader_program(&self, name: &str) -> Option<ShaderHandle>;
    /// Always available
    fn placeholder(&self, kind: Placeholder) -> TextureHandle;
}

/// In-memory name -> handle table
#[derive(Clone, Debug)]
pub struct AssetTable {
    textures: HashMap<String, TextureHandle>,
    shaders: HashMap<String, ShaderHandle>,
    white: TextureHandle,
    black: TextureHandle,
}

impl AssetTable {
    pub fn new(white: TextureHandle, black: TextureHandle) -> Self {
        Self {
            textures: HashMap::new(),
            shaders: HashMap::new(),
            white,
            black,
        }
    }

    /// A table with the built-in programs registered under fixed handles
    pub fn with_builtin_shaders() -> Self {
        Self::default()
            .with_shader(LIT_SHADER, ShaderHandle(1))
            .with_shader(SHADOW_DEPTH_SHADER, ShaderHandle(2))
            .with_shader(DEBUG_LINES_SHADER, ShaderHandle(3))
    }

    pub fn with_texture(mut self, name: impl Into<String>, texture: TextureHandle) -> Self {
        self.insert_texture(name, texture);
        self
    }

    pub fn with_shader(mut self, name: impl Into<String>, shader: ShaderHandle) -> Self {
        self.insert_shader(name, shader);
        self
    }

    pub fn insert_texture(&mut self, name: impl Into<String>, texture: TextureHandle) {
        self.textures.insert(name.into(), texture);
    }

    pub fn insert_shader(&mut self, name: impl Into<String>, shader: ShaderHandle) {
        self.shaders.insert(name.into(), shader);
    }

    pub fn remove_shader(&mut self, name: &str) -> Option<ShaderHandle> {
        self.shaders.remove(name)
    }
}

impl Default for AssetTable {
    fn default() -> Self {
        Self::new(TextureHandle(1), TextureHandle(2))
    }
}

impl AssetProvider for AssetTable {
    fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    fn shader_program(&self, name: &str) -> Option<ShaderHandle> {
        self.shaders.get(name).copied()
    }

    fn placeholder(&self, kind: Placeholder) -> TextureHandle {
        match kind {
            Placeholder::White => self.white,
            Placeholder::Black => self.black,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let assets = AssetTable::with_builtin_shaders().with_texture("brick", TextureHandle(40));
        assert_eq!(assets.texture("brick"), Some(TextureHandle(40)));
        assert_eq!(assets.texture("missing"), None);
        assert_eq!(assets.shader_program(SHADOW_DEPTH_SHADER), Some(ShaderHandle(2)));
        assert_ne!(
            assets.placeholder(Placeholder::White),
            assets.placeholder(Placeholder::Black)
        );
    }
}
