//! Target-pattern classification
//!
//! A point belongs to the target region when the shape predicate accepts its
//! construction position. Membership is fixed at construction.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::point::Region;
use super::trajectory::upsample;
use crate::consts::{ANNULUS_TOLERANCE, INTERPOLATION_FACTOR, OUTLINE_THRESHOLD};

/// Boolean membership test over planar positions
pub trait ShapePredicate {
    fn contains(&self, p: Vec2) -> bool;

    fn classify(&self, p: Vec2) -> Region {
        if self.contains(p) {
            Region::Target
        } else {
            Region::Background
        }
    }
}

impl<F> ShapePredicate for F
where
    F: Fn(Vec2) -> bool,
{
    fn contains(&self, p: Vec2) -> bool {
        self(p)
    }
}

/// Serializable target patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetShape {
    /// Thin ring: `|d² - radius²| < tolerance` where `d` is the distance to `center`
    Annulus {
        center: Vec2,
        radius: f32,
        tolerance: f32,
    },
    /// Within `threshold` of any sample of a (pre-upsampled) outline
    Outline { points: Vec<Vec2>, threshold: f32 },
    /// Whole surface is target
    Everywhere,
    /// No target region at all
    Empty,
}

impl Default for TargetShape {
    fn default() -> Self {
        use crate::consts::{PATTERN_CENTER, PATTERN_RADIUS};
        Self::annulus(Vec2::splat(PATTERN_CENTER), PATTERN_RADIUS)
    }
}

impl TargetShape {
    /// Ring with the default squared tolerance
    pub fn annulus(center: Vec2, radius: f32) -> Self {
        Self::Annulus {
            center,
            radius,
            tolerance: ANNULUS_TOLERANCE,
        }
    }

    /// Outline already in simulation coordinates, upsampled with the default factor
    pub fn from_outline(points: &[Vec2]) -> Self {
        Self::from_outline_with(points, INTERPOLATION_FACTOR, OUTLINE_THRESHOLD)
    }

    pub fn from_outline_with(points: &[Vec2], factor: usize, threshold: f32) -> Self {
        Self::Outline {
            points: upsample(points, factor),
            threshold,
        }
    }
}

impl ShapePredicate for TargetShape {
    fn contains(&self, p: Vec2) -> bool {
        match self {
            Self::Annulus {
                center,
                radius,
                tolerance,
            } => (p.distance_squared(*center) - radius * radius).abs() < *tolerance,
            Self::Outline { points, threshold } => {
                let limit = threshold * threshold;
                points.iter().any(|q| q.distance_squared(p) < limit)
            }
            Self::Everywhere => true,
            Self::Empty => false,
        }
    }
}
