//! Mass points
//!
//! A point owns the links it created at construction (to its row-above and
//! column-left neighbours) and counts the links its later neighbours own.
//! Once both are empty the point is detached and the surface removes it.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::link::Link;
use crate::Bounds;

/// Stable point identifier (grid scan order, also the arena slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(pub u32);

impl PointId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the cut pattern a point was classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Target,
    Background,
}

/// Soft pin: the point may wander up to `max_displacement` from `position`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub position: Vec2,
    pub max_displacement: f32,
}

impl Anchor {
    /// Pull `pos` back onto the anchor radius if it strayed past it
    pub fn constrain(&self, pos: Vec2) -> Vec2 {
        let offset = pos - self.position;
        let dist = offset.length();
        if dist > self.max_displacement && dist > 0.0 {
            self.position + offset * (self.max_displacement / dist)
        } else {
            pos
        }
    }
}

/// Per-step integration parameters shared by every point
#[derive(Debug, Clone, Copy)]
pub struct Integration {
    pub dt: f32,
    pub damping: f32,
    pub acceleration: Vec2,
    pub bounds: Bounds,
}

/// A single particle of the cloth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassPoint {
    pub id: PointId,
    pub pos: Vec2,
    pub prev: Vec2,
    /// Position at construction, used for classification and scoring
    pub origin: Vec2,
    pub pinned: bool,
    /// Driven by the actuator instead of integrating freely
    pub grabbed: bool,
    pub anchor: Option<Anchor>,
    pub region: Region,
    pub(crate) links: Vec<Link>,
    /// Links owned by neighbours that point at this one
    pub(crate) incoming: u32,
}

impl MassPoint {
    pub fn new(id: PointId, pos: Vec2, region: Region) -> Self {
        Self {
            id,
            pos,
            prev: pos,
            origin: pos,
            pinned: false,
            grabbed: false,
            anchor: None,
            region,
            links: Vec::new(),
            incoming: 0,
        }
    }

    /// Links this point owns and corrects
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Owned plus incoming links
    pub fn link_count(&self) -> usize {
        self.links.len() + self.incoming as usize
    }

    /// No link of any direction remains
    pub fn is_detached(&self) -> bool {
        self.links.is_empty() && self.incoming == 0
    }

    /// Does not yield to constraint corrections
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.pinned || self.grabbed
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.pos - self.prev
    }

    pub(crate) fn owns_link_to(&self, partner: PointId) -> bool {
        self.links.iter().any(|l| l.partner == partner)
    }

    /// Drop the owned link to `partner`, returning whether one existed
    pub(crate) fn remove_link_to(&mut self, partner: PointId) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.partner != partner);
        self.links.len() != before
    }

    /// Advance one Verlet step. `drag` is the actuator displacement for grabbed points.
    pub fn integrate(&mut self, step: &Integration, drag: Vec2) {
        if self.pinned {
            return;
        }

        let old = self.pos;
        if self.grabbed {
            self.pos += drag;
        } else {
            let velocity = self.velocity() * step.damping;
            self.pos += velocity + step.acceleration * step.dt * step.dt;
        }
        self.prev = old;

        // Leave non-finite values for the caller to detect; clamping would mask them
        if self.pos.is_finite() {
            self.pos = step.bounds.clamp(self.pos);
            if let Some(anchor) = self.anchor {
                self.pos = anchor.constrain(self.pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn integration() -> Integration {
        Integration {
            dt: 0.5,
            damping: 1.0,
            acceleration: Vec2::new(0.0, -4.0),
            bounds: Bounds::new(100.0, 100.0, 10.0),
        }
    }

    #[test]
    fn test_pinned_point_does_not_move() {
        let mut p = MassPoint::new(PointId(0), Vec2::new(10.0, 10.0), Region::Background);
        p.pinned = true;
        p.integrate(&integration(), Vec2::new(5.0, 5.0));
        assert_eq!(p.pos, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_verlet_step() {
        let mut p = MassPoint::new(PointId(0), Vec2::new(10.0, 50.0), Region::Background);
        p.prev = Vec2::new(9.0, 50.0);
        p.integrate(&integration(), Vec2::ZERO);
        // velocity (1, 0) plus gravity -4 * 0.25
        assert_relative_eq!(p.pos.x, 11.0);
        assert_relative_eq!(p.pos.y, 49.0);
        assert_eq!(p.prev, Vec2::new(10.0, 50.0));
        assert_relative_eq!(p.velocity().x, 1.0);
        assert_relative_eq!(p.velocity().y, -1.0);
    }

    #[test]
    fn test_grabbed_point_follows_drag() {
        let mut p = MassPoint::new(PointId(0), Vec2::new(10.0, 50.0), Region::Background);
        p.grabbed = true;
        p.integrate(&integration(), Vec2::new(3.0, -2.0));
        assert_eq!(p.pos, Vec2::new(13.0, 48.0));
    }

    #[test]
    fn test_integration_clamps_to_bounds() {
        let mut p = MassPoint::new(PointId(0), Vec2::new(99.0, 1.0), Region::Background);
        p.prev = Vec2::new(90.0, 1.0);
        p.integrate(&integration(), Vec2::ZERO);
        assert_eq!(p.pos.x, 100.0);
        assert_eq!(p.pos.y, 0.0);
    }

    #[test]
    fn test_anchor_is_one_sided() {
        let anchor = Anchor {
            position: Vec2::ZERO,
            max_displacement: 5.0,
        };
        assert_eq!(anchor.constrain(Vec2::new(3.0, 0.0)), Vec2::new(3.0, 0.0));
        let pulled = anchor.constrain(Vec2::new(0.0, 20.0));
        assert_relative_eq!(pulled.y, 5.0);
    }

    #[test]
    fn test_non_finite_position_is_not_masked() {
        let mut p = MassPoint::new(PointId(0), Vec2::new(f32::NAN, 1.0), Region::Background);
        p.integrate(&integration(), Vec2::ZERO);
        assert!(!p.pos.is_finite());
    }
}
