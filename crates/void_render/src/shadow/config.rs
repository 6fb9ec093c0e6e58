//! Shadow Configuration
//!
//! Settings for the single directional shadow map, loadable from the engine
//! TOML file.

use serde::{Deserialize, Serialize};

/// Directional shadow map settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Enable the shadow pre-pass
    pub enabled: bool,

    /// Shadow map resolution (power of 2)
    pub resolution: u32,

    /// Distance from the focus point to the light's eye
    pub distance: f32,

    /// Lower bound of the orthographic half extent
    pub min_half_extent: f32,

    /// Upper bound of the orthographic half extent
    pub max_half_extent: f32,

    /// Near plane of the light projection
    pub near_plane: f32,

    /// Depth bias to prevent shadow acne
    pub depth_bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 2048,
            distance: 50.0,
            min_half_extent: 10.0,
            max_half_extent: 100.0,
            near_plane: 0.1,
            depth_bias: 0.005,
        }
    }
}

impl ShadowConfig {
    /// Create a configuration with shadows disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        self.resolution = self.resolution.clamp(256, 8192).next_power_of_two();
        self.distance = self.distance.max(1.0);
        self.min_half_extent = self.min_half_extent.max(0.1);
        self.max_half_extent = self.max_half_extent.max(self.min_half_extent);
        self.near_plane = self.near_plane.clamp(0.001, self.distance * 0.5);
        self.depth_bias = self.depth_bias.clamp(0.0, 0.1);
    }
}
