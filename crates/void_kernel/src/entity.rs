//! Game objects and their capabilities
//!
//! An entity implements [`GameObject`] plus any number of small capability
//! traits. Layers never inspect concrete types: they check the
//! [`Capabilities`] bitset when an entity is registered and use the `as_*`
//! probes at run time.
//!
//! ```ignore
//! struct Spinner { id: EntityId, transform: Transform, enabled: bool }
//!
//! impl GameObject for Spinner {
//!     fn id(&self) -> EntityId { self.id }
//!     fn name(&self) -> &str { "spinner" }
//!     fn is_enabled(&self) -> bool { self.enabled }
//!     fn set_enabled(&mut self, enabled: bool) { self.enabled = enabled }
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::UPDATABLE | Capabilities::RENDERABLE_3D
//!     }
//!     fn as_updatable_mut(&mut self) -> Option<&mut dyn Updatable> { Some(self) }
//!     fn as_renderable_3d(&self) -> Option<&dyn Renderable3D> { Some(self) }
//! }
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use void_core::{FrameTime, Id};
use void_render::{
    Aabb, BoundingSphere, Bounds, CommandList, GraphicsContext, Material, PhysicsShape,
    ShadowPass,
};

use crate::env::RenderView;
use crate::input::InputState;
use crate::transform::{Transform, Transform2D};

/// Identity of a game object
pub type EntityId = Id;

/// Entities are shared between layers and dispatcher actions
pub type SharedEntity = Arc<RwLock<dyn GameObject>>;

/// Wrap an entity for registration
pub fn share<T: GameObject + 'static>(entity: T) -> SharedEntity {
    Arc::new(RwLock::new(entity))
}

/// Capability flags (bitflags-style)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const UPDATABLE: Self = Self(1 << 0);
    pub const INPUT_RECEIVER: Self = Self(1 << 1);
    pub const RENDERABLE_2D: Self = Self(1 << 2);
    pub const RENDERABLE_3D: Self = Self(1 << 3);
    pub const DEBUG_PANEL: Self = Self(1 << 4);

    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl core::ops::BitOr for Capabilities {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Base contract of every entity
pub trait GameObject: Send + Sync {
    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);

    /// Capabilities this object implements
    fn capabilities(&self) -> Capabilities;

    fn as_updatable_mut(&mut self) -> Option<&mut dyn Updatable> {
        None
    }

    fn as_input_receiver_mut(&mut self) -> Option<&mut dyn InputReceiver> {
        None
    }

    fn as_renderable_2d(&self) -> Option<&dyn Renderable2D> {
        None
    }

    fn as_renderable_3d(&self) -> Option<&dyn Renderable3D> {
        None
    }

    fn as_debug_panel_mut(&mut self) -> Option<&mut dyn DebugPanel> {
        None
    }
}

/// Per-frame logic
pub trait Updatable {
    fn update(&mut self, frame: &FrameTime);
}

/// Receives the frame's input snapshot
pub trait InputReceiver {
    fn handle_input(&mut self, input: &InputState);
}

/// Screen-space object that describes itself as render commands
pub trait Renderable2D {
    fn transform_2d(&self) -> Transform2D;
    fn collect_render_commands(&self, out: &mut CommandList);
}

/// Object drawn by the 3D layer
pub trait Renderable3D {
    /// World transform
    fn transform(&self) -> Transform;

    /// Local-space box; a scale-derived sphere is used when `None`
    fn local_bounds(&self) -> Option<Aabb> {
        None
    }

    /// Return `false` to skip frustum culling for this object
    fn cull_enabled(&self) -> bool {
        true
    }

    fn material(&self) -> Option<&Material> {
        None
    }

    fn receive_shadows(&self) -> bool {
        true
    }

    /// State commands executed by the 3D layer before its passes
    fn collect_render_commands(&self, _out: &mut CommandList) {}

    /// Opaque draw. The material, if any, is already bound
    fn draw(&self, view: &mut RenderView<'_>);

    fn as_shadow_caster(&self) -> Option<&dyn ShadowCaster> {
        None
    }

    fn as_transparent(&self) -> Option<&dyn TransparentRenderable> {
        None
    }

    /// Collision shape drawn by the physics debug overlay
    fn physics_shape(&self) -> Option<PhysicsShape> {
        None
    }

    /// World-space bounds used for culling
    fn world_bounds(&self) -> Bounds {
        let transform = self.transform();
        match self.local_bounds() {
            Some(aabb) => Bounds::Box(aabb.transformed(&transform.matrix())),
            None => Bounds::Sphere(BoundingSphere::from_scale(
                transform.position,
                transform.scale,
            )),
        }
    }
}

/// Writes depth into the shadow map
pub trait ShadowCaster {
    /// `u_model` is already uploaded when this is called
    fn draw_shadow(&self, gfx: &mut dyn GraphicsContext, pass: &ShadowPass);
}

/// Drawn back-to-front after all opaque geometry
pub trait TransparentRenderable {
    fn draw_transparent(&self, view: &mut RenderView<'_>);
}

/// Object that contributes an on-screen debug panel
pub trait DebugPanel {
    fn panel_title(&self) -> &str;
    /// Emit the panel's text, scissor and window commands
    fn build_panel(&mut self, out: &mut CommandList);
}
