//! Built-in layers
//!
//! | Layer            | Capability     | Default priority | Commands                  |
//! |------------------|----------------|------------------|---------------------------|
//! | [`InputLayer`]   | input receiver | -100             | none                      |
//! | [`UpdateLayer`]  | updatable      | 0                | none                      |
//! | [`WorldLayer`]   | 3D renderable  | 100              | clear, state, draw arrays |
//! | [`SpriteLayer`]  | 2D renderable  | 200              | textures, shaders         |
//! | [`DebugPanelLayer`] | debug panel | 1000             | text, scissor, window, GPU |

mod debug_panel;
mod input;
mod sprite;
mod update;
mod world;

pub use debug_panel::DebugPanelLayer;
pub use input::InputLayer;
pub use sprite::{SpriteLayer, SPRITE_SHADER};
pub use update::UpdateLayer;
pub use world::{WorldLayer, WorldSettings, WorldStats};

/// Default priorities of the built-in layers
pub mod priority {
    pub const INPUT: i32 = -100;
    pub const UPDATE: i32 = 0;
    pub const WORLD: i32 = 100;
    pub const SPRITE: i32 = 200;
    pub const DEBUG_PANEL: i32 = 1000;
}
