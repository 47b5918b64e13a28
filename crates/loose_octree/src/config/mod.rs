//! Configuration system
//!
//! Octree construction parameters, loadable from TOML or RON files.

pub use serde::{Serialize, Deserialize};

use crate::foundation::math::Vec3;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// # Octree Configuration
///
/// Construction parameters for a [`LooseOctree`](crate::spatial::LooseOctree).
/// Values are taken as-is here; the tree applies its own corrections
/// (looseness clamping, minimum size coercion) when it is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Edge length of the initial root node
    pub initial_size: f32,
    /// Center of the initial root node
    pub initial_center: [f32; 3],
    /// Nodes at or below this edge length never split
    pub min_node_size: f32,
    /// Loose bounds multiplier, clamped to [1.0, 2.0]
    pub looseness: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            initial_size: 100.0,
            initial_center: [0.0, 0.0, 0.0],
            min_node_size: 1.0,
            looseness: 1.25,
        }
    }
}

impl Config for OctreeConfig {}

impl OctreeConfig {
    /// Create a configuration with the given root size and center
    pub fn new(initial_size: f32, initial_center: Vec3) -> Self {
        Self {
            initial_size,
            initial_center: [initial_center.x, initial_center.y, initial_center.z],
            ..Default::default()
        }
    }

    /// Set the minimum node size
    pub fn with_min_node_size(mut self, min_node_size: f32) -> Self {
        self.min_node_size = min_node_size;
        self
    }

    /// Set the looseness factor
    pub fn with_looseness(mut self, looseness: f32) -> Self {
        self.looseness = looseness;
        self
    }

    /// Initial center as a vector
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.initial_center[0], self.initial_center[1], self.initial_center[2])
    }

    /// Validate the configuration
    ///
    /// Rejects values no tree could be built from. Values the tree merely
    /// corrects (looseness out of range, min size above initial size) pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_size.is_finite() && self.initial_size > 0.0) {
            return Err(ConfigError::Parse(format!(
                "initial_size must be positive and finite, got {}", self.initial_size
            )));
        }

        if !(self.min_node_size.is_finite() && self.min_node_size > 0.0) {
            return Err(ConfigError::Parse(format!(
                "min_node_size must be positive and finite, got {}", self.min_node_size
            )));
        }

        if !self.looseness.is_finite() {
            return Err(ConfigError::Parse("looseness must be finite".to_string()));
        }

        if self.initial_center.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::Parse("initial_center must be finite".to_string()));
        }

        Ok(())
    }
}
