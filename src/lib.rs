//! Cloth Cutter - position-based cloth simulation for pattern cutting
//!
//! Core modules:
//! - `sim`: Deterministic simulation (mass points, links, actuator, stepping, scoring)
//! - `config`: Experiment description loaded from JSON
//! - `persistence`: Versioned snapshots of a running surface
//! - `error`: Error types shared across the crate

pub mod config;
pub mod error;
pub mod persistence;
pub mod sim;

pub use config::{ActuatorConfig, ClothConfig, ExperimentConfig, PinCondition, SimulationConfig};
pub use error::{ConfigError, Error, Result, SimError, SnapshotError};
pub use persistence::Snapshot;
pub use sim::{Actuator, ActuatorInput, ActuatorMode, Scorer, Simulation, Surface, TargetShape};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (~60 Hz)
    pub const SIM_DT: f32 = 0.016;
    /// Constraint relaxation passes per step
    pub const RELAXATION_ITERATIONS: u32 = 5;
    /// Fraction of velocity kept by Verlet integration
    pub const DAMPING: f32 = 0.99;
    /// Downward acceleration (units/s²)
    pub const GRAVITY: f32 = 1200.0;

    /// Grid defaults
    pub const GRID_WIDTH: usize = 50;
    pub const GRID_HEIGHT: usize = 50;
    pub const GRID_SPACING: f32 = 10.0;
    pub const GRID_ORIGIN: f32 = 50.0;

    /// Free-integration steps used to reach the initial drape
    pub const SETTLE_STEPS: u32 = 200;

    /// Actuator defaults
    pub const ACTUATOR_INFLUENCE: f32 = 20.0;
    pub const ACTUATOR_CUT_RADIUS: f32 = 5.0;
    pub const ACTUATOR_HEIGHT_LIMIT: f32 = 10.0;

    /// Outline upsampling factor for registered shapes
    pub const INTERPOLATION_FACTOR: usize = 10;
    /// Distance from the outline that still counts as "on the shape"
    pub const OUTLINE_THRESHOLD: f32 = 20.0;
    /// Annulus membership tolerance, in squared units
    pub const ANNULUS_TOLERANCE: f32 = 2000.0;

    /// Default circular pattern
    pub const PATTERN_CENTER: f32 = 300.0;
    pub const PATTERN_RADIUS: f32 = 150.0;
    pub const PATTERN_WAYPOINTS: usize = 100;
}

/// Axis-aligned simulation box anchored at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    /// Vertical reach of the actuator
    pub z: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x: 600.0,
            y: 600.0,
            z: 800.0,
        }
    }
}

impl Bounds {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Clamp a planar position into the box
    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.x), p.y.clamp(0.0, self.y))
    }

    #[inline]
    pub fn clamp_height(&self, z: f32) -> f32 {
        z.clamp(0.0, self.z)
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..=self.x).contains(&p.x) && (0.0..=self.y).contains(&p.y)
    }

    /// True when the box has no planar area or carries non-finite extents
    pub fn is_degenerate(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite())
            || self.x <= 0.0
            || self.y <= 0.0
            || self.z < 0.0
    }
}

/// Convert polar (r, theta) around `center` to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(center: Vec2, r: f32, theta: f32) -> Vec2 {
    center + Vec2::new(r * theta.cos(), r * theta.sin())
}
