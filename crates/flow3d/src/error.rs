//! Error types.

use thiserror::Error;

/// Errors from building, validating, loading or saving a [`SimConfig`].
///
/// [`SimConfig`]: crate::config::SimConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A grid axis has no interior layer.
    #[error("grid {axis} extent must be at least 3, got {size}")]
    GridTooSmall { axis: char, size: usize },
    /// The tracer collection would be empty.
    #[error("tracer_count must be positive")]
    NoTracers,
    /// Zero or non-finite time step.
    #[error("delta_t must be finite and non-zero, got {0}")]
    InvalidTimeStep(f64),
    /// Zero or non-finite Reynolds number (the viscous term divides by it).
    #[error("Reynolds number must be finite and non-zero, got {0}")]
    InvalidReynolds(f64),
    /// Non-finite SOR relaxation factor.
    #[error("omega must be finite, got {0}")]
    InvalidRelaxation(f64),
    /// The pressure solve would never run.
    #[error("pressure_iterations must be positive")]
    NoPressureIterations,
    /// Config file extension is neither JSON nor YAML.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    /// Wrapper for standard I/O errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
