//! Error types for configuration, stepping and snapshots.

use thiserror::Error;

use crate::sim::PointId;

/// Result type alias for the crate's top-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or loading an experiment description.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Grid has no points in one direction.
    #[error("invalid grid dimensions: {width}x{height}")]
    InvalidGrid {
        /// Points per row.
        width: usize,
        /// Number of rows.
        height: usize,
    },

    /// Grid spacing is zero, negative or non-finite.
    #[error("invalid grid spacing: dx={dx}, dy={dy}")]
    InvalidSpacing {
        /// Horizontal spacing.
        dx: f32,
        /// Vertical spacing.
        dy: f32,
    },

    /// Boundary box has no area.
    #[error("degenerate bounds: ({x}, {y}, {z})")]
    DegenerateBounds {
        /// Horizontal extent.
        x: f32,
        /// Vertical extent.
        y: f32,
        /// Reach extent.
        z: f32,
    },

    /// Any other out-of-range parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Config file could not be read or written.
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected layout.
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(details: impl Into<String>) -> Self {
        Self::InvalidParameter(details.into())
    }
}

/// Errors raised by a step. Both are fatal for the surface instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A point position became NaN or infinite.
    #[error("non-finite position at point {point} on step {step}")]
    Unstable {
        /// First offending point.
        point: PointId,
        /// Step counter when it was detected.
        step: u64,
    },

    /// The surface already went unstable and refuses to step.
    #[error("surface is poisoned by an earlier instability")]
    Poisoned,
}

/// Errors raised while loading a snapshot. Callers may rebuild from config instead.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Truncated or malformed snapshot data.
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Snapshot written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the data.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// Snapshot decoded but its topology is inconsistent.
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),

    /// Snapshot file could not be read or written.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error for drivers that touch every layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidGrid {
            width: 0,
            height: 4,
        };
        assert!(format!("{err}").contains("0x4"));

        let err = ConfigError::invalid_parameter("elasticity must be positive");
        assert!(format!("{err}").contains("elasticity"));

        let err = SimError::Unstable {
            point: PointId(7),
            step: 3,
        };
        assert!(format!("{err}").contains("point 7"));

        let err = SnapshotError::UnsupportedVersion {
            found: 9,
            expected: 1,
        };
        assert!(format!("{err}").contains("version 9"));
    }

    #[test]
    fn test_top_level_conversion() {
        let err: Error = SimError::Poisoned.into();
        assert!(matches!(err, Error::Sim(SimError::Poisoned)));
    }
}
