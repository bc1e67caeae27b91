//! Simulation configuration.
//!
//! Loaded from / saved to JSON or YAML. Every load is validated, so a
//! `SimConfig` coming out of this module is safe to build a simulation from.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::serde_utils::{deserialize_dvec3, serialize_dvec3};

pub use crate::pressure::PressureScheme;

/// A force re-applied every tick at a fixed world-space position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbientForce {
    /// Position in the centred world frame (origin at the box center)
    #[serde(serialize_with = "serialize_dvec3", deserialize_with = "deserialize_dvec3")]
    pub position: DVec3,
    /// Velocity triplet written at that cell
    #[serde(serialize_with = "serialize_dvec3", deserialize_with = "deserialize_dvec3")]
    pub force: DVec3,
}

impl AmbientForce {
    /// Unit +Z jet at the center of the box.
    pub fn central_jet() -> Self {
        Self {
            position: DVec3::ZERO,
            force: DVec3::Z,
        }
    }
}

/// Parameters of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cells in X
    pub width: usize,
    /// Cells in Y
    pub height: usize,
    /// Cells in Z
    pub depth: usize,
    /// Time step
    pub delta_t: f64,
    /// Reynolds number. Larger means less viscous.
    #[serde(alias = "re")]
    pub reynolds: f64,
    /// SOR relaxation factor
    pub omega: f64,
    /// Number of tracer particles
    pub tracer_count: usize,
    /// Smallest proxy scale handed to the presentation layer
    pub min_size: f64,
    /// Proxy scale gained per unit of tracer speed
    pub size_mul: f64,
    /// Cell written by `step(.., true)`
    pub default_force_cell: [usize; 3],
    /// Velocity triplet written by `step(.., true)`
    #[serde(serialize_with = "serialize_dvec3", deserialize_with = "deserialize_dvec3")]
    pub default_force_vector: DVec3,
    /// Optional forcing applied on every tick
    pub ambient_force: Option<AmbientForce>,
    /// Pressure sweeps per tick
    pub pressure_iterations: usize,
    pub pressure_scheme: PressureScheme,
    /// Spread the cell-independent stages over rayon's thread pool
    pub parallel: bool,
    /// Tracer RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 12,
            height: 12,
            depth: 12,
            delta_t: 0.2,
            reynolds: 1_000_000.0,
            omega: 1.8,
            tracer_count: 1024,
            min_size: 0.1,
            size_mul: 0.1,
            default_force_cell: [6, 6, 6],
            default_force_vector: DVec3::new(0.99, 0.0, 0.0),
            ambient_force: None,
            pressure_iterations: 10,
            pressure_scheme: PressureScheme::Sor,
            parallel: false,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Config for a `width x height x depth` box with every other value at
    /// its default.
    pub fn with_dims(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
            ..Self::default()
        }
    }

    /// Grid extents as `[width, height, depth]`.
    pub fn dims(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// Check the configuration, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, size) in ['x', 'y', 'z'].into_iter().zip(self.dims()) {
            if size < 3 {
                return Err(ConfigError::GridTooSmall { axis, size });
            }
        }
        if self.tracer_count == 0 {
            return Err(ConfigError::NoTracers);
        }
        if self.delta_t == 0.0 || !self.delta_t.is_finite() {
            return Err(ConfigError::InvalidTimeStep(self.delta_t));
        }
        if self.reynolds == 0.0 || !self.reynolds.is_finite() {
            return Err(ConfigError::InvalidReynolds(self.reynolds));
        }
        if !self.omega.is_finite() {
            return Err(ConfigError::InvalidRelaxation(self.omega));
        }
        if self.pressure_iterations == 0 {
            return Err(ConfigError::NoPressureIterations);
        }
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn save_yaml(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Load configuration from YAML file
    pub fn load_yaml(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON or YAML file, picked by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Self::load_json(path),
            "yaml" | "yml" => Self::load_yaml(path),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}
