//! Distance constraints between neighbouring points

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::point::{MassPoint, PointId};

/// A distance constraint, stored in its owner's link list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub partner: PointId,
    pub rest_length: f32,
}

impl Link {
    /// Link to `partner`, resting at the current distance between the endpoints
    pub fn new(partner: PointId, owner_pos: Vec2, partner_pos: Vec2) -> Self {
        Self {
            partner,
            rest_length: owner_pos.distance(partner_pos),
        }
    }

    /// Degenerate zero-length links cannot be corrected or severed meaningfully
    pub fn is_severable(&self) -> bool {
        self.rest_length > 0.0
    }

    /// Stretched past `tear_factor` times its rest length
    pub fn is_overstretched(&self, owner_pos: Vec2, partner_pos: Vec2, tear_factor: f32) -> bool {
        owner_pos.distance(partner_pos) > self.rest_length * tear_factor
    }

    /// Move both endpoints toward the rest length.
    ///
    /// `stiffness` 1.0 satisfies the link exactly in one call. The error is split
    /// evenly, or given entirely to the free endpoint when the other is fixed.
    pub fn apply_correction(&self, owner: &mut MassPoint, partner: &mut MassPoint, stiffness: f32) {
        let delta = owner.pos - partner.pos;
        let dist = delta.length();
        if dist <= f32::EPSILON {
            return;
        }

        let offset = delta * ((self.rest_length - dist) / dist * stiffness);
        match (owner.is_fixed(), partner.is_fixed()) {
            (true, true) => {}
            (false, false) => {
                owner.pos += offset * 0.5;
                partner.pos -= offset * 0.5;
            }
            (true, false) => partner.pos -= offset,
            (false, true) => owner.pos += offset,
        }
    }
}
