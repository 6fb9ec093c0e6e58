//! Engine configuration
//!
//! Loaded from TOML; every section and field is optional.
//!
//! ```toml
//! [window]
//! width = 1920
//! height = 1080
//!
//! [render]
//! frustum_culling = true
//! debug_bounds = true
//!
//! [shadow]
//! resolution = 4096
//!
//! [dispatcher]
//! budget = 16
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use void_render::{DebugConfig, DebugVisualization, ShadowConfig};

use crate::dispatcher::DispatcherConfig;
use crate::layers::WorldSettings;

/// Errors from config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Void Engine".to_string(),
            vsync: true,
        }
    }
}

/// 3D pipeline switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub frustum_culling: bool,
    pub wireframe: bool,
    /// Draw both faces; only for meshes with broken winding
    pub disable_face_culling: bool,
    pub debug_bounds: bool,
    pub debug_physics: bool,
    pub debug_line_width: f32,
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            wireframe: false,
            disable_face_culling: false,
            debug_bounds: false,
            debug_physics: false,
            debug_line_width: 2.0,
            clear_color: [0.1, 0.1, 0.12, 1.0],
        }
    }
}

impl RenderConfig {
    /// Settings for the 3D layer
    pub fn world_settings(&self, shadow: &ShadowConfig) -> WorldSettings {
        let mut flags = DebugVisualization::empty();
        flags.set(DebugVisualization::BOUNDS, self.debug_bounds);
        flags.set(DebugVisualization::PHYSICS_SHAPES, self.debug_physics);
        let debug = DebugConfig {
            line_width: self.debug_line_width,
            ..DebugConfig::with_flags(flags)
        };

        WorldSettings {
            frustum_culling: self.frustum_culling,
            wireframe: self.wireframe,
            disable_face_culling: self.disable_face_culling,
            debug,
            shadow: shadow.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub shadow: ShadowConfig,
    pub dispatcher: DispatcherConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let mut config: EngineConfig = toml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Clamp out-of-range values
    pub fn validate(&mut self) {
        self.window.width = self.window.width.max(1);
        self.window.height = self.window.height.max(1);
        self.render.debug_line_width = self.render.debug_line_width.clamp(0.5, 16.0);
        for channel in &mut self.render.clear_color {
            *channel = channel.clamp(0.0, 1.0);
        }
        self.shadow.validate();
        self.dispatcher.validate();
    }

    pub fn world_settings(&self) -> WorldSettings {
        self.render.world_settings(&self.shadow)
    }
}
