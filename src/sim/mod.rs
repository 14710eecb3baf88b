//! Deterministic cloth simulation
//!
//! Everything that moves lives here. This module stays pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by point id)
//! - No rendering or platform dependencies

pub mod actuator;
pub mod link;
pub mod point;
pub mod region;
pub mod score;
pub mod simulation;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use actuator::{Actuator, ActuatorInput, ActuatorMode};
pub use link::Link;
pub use point::{Anchor, Integration, MassPoint, PointId, Region};
pub use region::{ShapePredicate, TargetShape};
pub use score::{ScoreBreakdown, ScoreConfig, Scorer};
pub use simulation::Simulation;
pub use state::{Removal, Surface, Tensioner};
pub use tick::StepReport;
pub use trajectory::{TrajectoryDriver, circle, upsample};
