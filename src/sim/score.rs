//! Cut scoring
//!
//! A point counts as cut once it is removed from the cloth or hangs in a
//! piece no longer attached to the main body. Cutting target points earns
//! reward, cutting background points costs the overcut penalty. The result
//! is normalised so a perfect cut scores 1.0.

use serde::{Deserialize, Serialize};

use super::point::Region;
use super::region::ShapePredicate;
use super::state::Surface;
use crate::error::ConfigError;

/// Weighting policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Reward for the fraction of target points cut
    pub target_weight: f32,
    /// Cost for the fraction of background points cut
    pub overcut_penalty: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            target_weight: 1.0,
            overcut_penalty: 1.0,
        }
    }
}

impl ScoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.target_weight.is_finite()
            && self.overcut_penalty.is_finite()
            && self.target_weight > 0.0
            && self.overcut_penalty >= 0.0;
        if !ok {
            return Err(ConfigError::invalid_parameter(format!(
                "score weights out of range: target_weight={} overcut_penalty={}",
                self.target_weight, self.overcut_penalty
            )));
        }
        Ok(())
    }
}

/// Counts behind a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBreakdown {
    pub target_total: usize,
    pub target_cut: usize,
    pub background_total: usize,
    pub background_cut: usize,
}

impl ScoreBreakdown {
    pub fn target_fraction(&self) -> f32 {
        fraction(self.target_cut, self.target_total)
    }

    pub fn background_fraction(&self) -> f32 {
        fraction(self.background_cut, self.background_total)
    }

    fn count(&mut self, region: Region, cut: bool) {
        match region {
            Region::Target => {
                self.target_total += 1;
                self.target_cut += cut as usize;
            }
            Region::Background => {
                self.background_total += 1;
                self.background_cut += cut as usize;
            }
        }
    }
}

fn fraction(part: usize, whole: usize) -> f32 {
    if whole == 0 {
        0.0
    } else {
        part as f32 / whole as f32
    }
}

/// Stateless evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    pub config: ScoreConfig,
}

impl Scorer {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    /// Classify every point ever built by `shape` over its construction position
    pub fn breakdown<S>(&self, surface: &Surface, shape: &S) -> ScoreBreakdown
    where
        S: ShapePredicate + ?Sized,
    {
        let body = surface.body_mask();
        let mut counts = ScoreBreakdown::default();
        for point in surface.points() {
            counts.count(shape.classify(point.origin), !body[point.id.index()]);
        }
        for removal in surface.removed() {
            counts.count(shape.classify(removal.origin), true);
        }
        counts
    }

    /// Same counts using the region tags assigned at construction
    pub fn region_breakdown(&self, surface: &Surface) -> ScoreBreakdown {
        let body = surface.body_mask();
        let mut counts = ScoreBreakdown::default();
        for point in surface.points() {
            counts.count(point.region, !body[point.id.index()]);
        }
        for removal in surface.removed() {
            counts.count(removal.region, true);
        }
        counts
    }

    pub fn score<S>(&self, surface: &Surface, shape: &S) -> f32
    where
        S: ShapePredicate + ?Sized,
    {
        self.evaluate(&self.breakdown(surface, shape))
    }

    pub fn score_regions(&self, surface: &Surface) -> f32 {
        self.evaluate(&self.region_breakdown(surface))
    }

    /// Weighted score clamped to [-1, 1]
    pub fn evaluate(&self, counts: &ScoreBreakdown) -> f32 {
        let ScoreConfig {
            target_weight,
            overcut_penalty,
        } = self.config;
        let raw = target_weight * counts.target_fraction()
            - overcut_penalty * counts.background_fraction();
        let normalized = if target_weight > 0.0 {
            raw / target_weight
        } else {
            raw
        };
        normalized.clamp(-1.0, 1.0)
    }
}
