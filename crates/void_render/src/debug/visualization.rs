//! Debug Visualization Configuration

use serde::{Deserialize, Serialize};

/// Debug visualization flags (bitflags-style)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DebugVisualization(u32);

impl DebugVisualization {
    /// No debug visualization
    pub const NONE: Self = Self(0);

    /// Wireframe AABB per in-view entity
    pub const BOUNDS: Self = Self(1 << 0);

    /// Outline of each entity's physics shape
    pub const PHYSICS_SHAPES: Self = Self(1 << 1);

    /// Draw geometry as lines instead of filled triangles
    pub const WIREFRAME: Self = Self(1 << 2);

    #[inline]
    pub const fn empty() -> Self {
        Self::NONE
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Check if contains flag
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Set a flag to a specific state
    #[inline]
    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// True when any line overlay is requested
    #[inline]
    pub const fn wants_lines(&self) -> bool {
        self.0 & (Self::BOUNDS.0 | Self::PHYSICS_SHAPES.0) != 0
    }
}

impl core::ops::BitOr for DebugVisualization {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for DebugVisualization {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Debug overlay configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Active debug visualizations
    pub flags: DebugVisualization,

    /// Overlay line width (pixels)
    pub line_width: f32,

    /// Bounding box color (RGBA)
    pub bounds_color: [f32; 4],

    /// Physics shape color (RGBA)
    pub physics_color: [f32; 4],
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            flags: DebugVisualization::empty(),
            line_width: 2.0,
            bounds_color: [0.0, 1.0, 0.0, 1.0],
            physics_color: [0.0, 1.0, 1.0, 1.0],
        }
    }
}

impl DebugConfig {
    pub fn with_flags(flags: DebugVisualization) -> Self {
        Self {
            flags,
            ..Default::default()
        }
    }

    pub fn enable(&mut self, flag: DebugVisualization) -> &mut Self {
        self.flags.insert(flag);
        self
    }

    pub fn disable(&mut self, flag: DebugVisualization) -> &mut Self {
        self.flags.remove(flag);
        self
    }

    pub fn is_enabled(&self, flag: DebugVisualization) -> bool {
        self.flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut config = DebugConfig::default();
        assert!(!config.flags.wants_lines());

        config.enable(DebugVisualization::WIREFRAME);
        assert!(!config.flags.wants_lines());

        config.enable(DebugVisualization::PHYSICS_SHAPES);
        assert!(config.flags.wants_lines());
        assert!(config.is_enabled(DebugVisualization::WIREFRAME | DebugVisualization::PHYSICS_SHAPES));

        config.disable(DebugVisualization::PHYSICS_SHAPES);
        assert!(!config.is_enabled(DebugVisualization::PHYSICS_SHAPES));
    }
}
