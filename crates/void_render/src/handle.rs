//! Opaque GPU resource handles
//!
//! Handles are plain indices owned by the graphics backend. The runtime never
//! dereferences them; it only passes them back to a [`GraphicsContext`].
//!
//! [`GraphicsContext`]: crate::context::GraphicsContext

use core::fmt;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Raw backend index
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

gpu_handle!(
    /// A texture (color or depth) living on the GPU
    TextureHandle,
    "Texture"
);
gpu_handle!(
    /// A linked shader program
    ShaderHandle,
    "Shader"
);
gpu_handle!(
    /// Vertex array / vertex buffer binding
    VertexArrayHandle,
    "VertexArray"
);
gpu_handle!(
    /// An offscreen render target (framebuffer)
    RenderTargetHandle,
    "RenderTarget"
);
