//! Surface state and topology bookkeeping
//!
//! Everything that has to survive a snapshot lives here. Points are kept in
//! an arena indexed by `PointId`; a removed point leaves an empty slot so ids
//! stay stable and iteration order stays the grid scan order.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actuator::{Actuator, ActuatorMode};
use super::link::Link;
use super::point::{Anchor, MassPoint, PointId, Region};
use super::region::ShapePredicate;
use crate::Bounds;
use crate::config::{ClothConfig, validate_bounds};
use crate::error::ConfigError;

/// Handle for a pinned point that can be pulled later
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tensioner {
    pub point: PointId,
    /// Where the point was when pinned
    pub pinned_at: Vec2,
    /// Accumulated pull relative to `pinned_at`
    pub offset: Vec2,
    /// Soft pin radius, also the limit on how far it can be pulled
    pub max_displacement: Option<f32>,
}

/// Record of a point that left the cloth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Removal {
    pub id: PointId,
    pub origin: Vec2,
    pub region: Region,
    /// Step during which the point was removed
    pub step: u64,
}

/// The mass-point/link network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    config: ClothConfig,
    bounds: Bounds,
    pub(crate) points: Vec<Option<MassPoint>>,
    /// Live target-region ids, ascending
    pub(crate) target: Vec<PointId>,
    /// Live background ids, ascending
    pub(crate) background: Vec<PointId>,
    pub(crate) tensioners: Vec<Tensioner>,
    pub(crate) removed: Vec<Removal>,
    pub(crate) steps: u64,
    pub(crate) poisoned: bool,
}

impl Surface {
    /// Build the grid and classify every point with `shape`
    pub fn new<S>(config: &ClothConfig, bounds: Bounds, shape: &S) -> Result<Self, ConfigError>
    where
        S: ShapePredicate + ?Sized,
    {
        config.validate()?;
        validate_bounds(&bounds)?;

        let (width, height) = (config.width, config.height);
        let mut points: Vec<Option<MassPoint>> = Vec::with_capacity(width * height);
        let mut target = Vec::new();
        let mut background = Vec::new();

        for row in 0..height {
            for col in 0..width {
                let id = PointId((row * width + col) as u32);
                let pos = config.origin
                    + Vec2::new(col as f32 * config.dx, row as f32 * config.dy);
                let mut point = MassPoint::new(id, pos, shape.classify(pos));
                point.pinned = config.pin.pins(row, col, width, height);

                if row > 0 {
                    link_new(&mut point, &mut points, PointId(id.0 - width as u32));
                }
                if col > 0 {
                    link_new(&mut point, &mut points, PointId(id.0 - 1));
                }

                match point.region {
                    Region::Target => target.push(id),
                    Region::Background => background.push(id),
                }
                points.push(Some(point));
            }
        }

        log::debug!(
            "Built {}x{} surface: {} target points, {} background points",
            width,
            height,
            target.len(),
            background.len()
        );

        Ok(Self {
            config: config.clone(),
            bounds,
            points,
            target,
            background,
            tensioners: Vec::new(),
            removed: Vec::new(),
            steps: 0,
            poisoned: false,
        })
    }

    pub fn config(&self) -> &ClothConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Steps taken since construction
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn point(&self, id: PointId) -> Option<&MassPoint> {
        self.points.get(id.index())?.as_ref()
    }

    pub fn point_mut(&mut self, id: PointId) -> Option<&mut MassPoint> {
        self.points.get_mut(id.index())?.as_mut()
    }

    /// Live points in scan order
    pub fn points(&self) -> impl Iterator<Item = &MassPoint> + '_ {
        self.points.iter().flatten()
    }

    pub fn live_count(&self) -> usize {
        self.target.len() + self.background.len()
    }

    pub fn target_points(&self) -> &[PointId] {
        &self.target
    }

    pub fn background_points(&self) -> &[PointId] {
        &self.background
    }

    pub fn removed(&self) -> &[Removal] {
        &self.removed
    }

    /// (target, background) sizes at construction
    pub fn initial_region_counts(&self) -> (usize, usize) {
        let removed_target = self
            .removed
            .iter()
            .filter(|r| r.region == Region::Target)
            .count();
        let removed_background = self.removed.len() - removed_target;
        (
            self.target.len() + removed_target,
            self.background.len() + removed_background,
        )
    }

    pub fn tensioners(&self) -> &[Tensioner] {
        &self.tensioners
    }

    /// Every link as (owner, partner), in scan order
    pub fn links(&self) -> Vec<(PointId, PointId)> {
        self.points()
            .flat_map(|p| p.links.iter().map(move |l| (p.id, l.partner)))
            .collect()
    }

    pub fn link_count(&self) -> usize {
        self.points().map(|p| p.links.len()).sum()
    }

    /// Whether a link joins `a` and `b`, whichever owns it
    pub fn has_link(&self, a: PointId, b: PointId) -> bool {
        let owns = |owner: PointId, partner: PointId| {
            self.point(owner).is_some_and(|p| p.owns_link_to(partner))
        };
        owns(a, b) || owns(b, a)
    }

    /// Remove the link between `a` and `b`. Returns whether one existed.
    pub fn sever_link(&mut self, a: PointId, b: PointId) -> bool {
        for (owner, partner) in [(a, b), (b, a)] {
            let removed = self
                .point_mut(owner)
                .is_some_and(|p| p.remove_link_to(partner));
            if removed {
                if let Some(p) = self.point_mut(partner) {
                    p.incoming = p.incoming.saturating_sub(1);
                }
                return true;
            }
        }
        false
    }

    /// Cut every link touching `id`. The point itself goes at the next cleanup.
    pub fn sever_all_links(&mut self, id: PointId) -> usize {
        let neighbours = self.neighbours(id);
        neighbours
            .into_iter()
            .filter(|&other| self.sever_link(id, other))
            .count()
    }

    /// Points linked to `id` in either direction
    pub fn neighbours(&self, id: PointId) -> Vec<PointId> {
        let Some(point) = self.point(id) else {
            return Vec::new();
        };
        let mut out: Vec<PointId> = point.links.iter().map(|l| l.partner).collect();
        if point.incoming > 0 {
            out.extend(
                self.points()
                    .filter(|p| p.owns_link_to(id))
                    .map(|p| p.id),
            );
        }
        out
    }

    /// Nearest live point accepted by `filter`
    pub fn nearest_point<F>(&self, target: Vec2, filter: F) -> Option<PointId>
    where
        F: Fn(&MassPoint) -> bool,
    {
        self.points()
            .filter(|p| filter(p))
            .min_by(|a, b| {
                a.pos
                    .distance_squared(target)
                    .partial_cmp(&b.pos.distance_squared(target))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| p.id)
    }

    /// Pin the nearest point. `max_displacement` turns it into a soft pin.
    pub fn pin_position(&mut self, x: f32, y: f32, max_displacement: Option<f32>) -> Option<Tensioner> {
        let id = self.nearest_point(Vec2::new(x, y), |_| true)?;
        let point = self.point_mut(id)?;
        let pinned_at = point.pos;
        match max_displacement {
            None => point.pinned = true,
            Some(max) => {
                point.anchor = Some(Anchor {
                    position: pinned_at,
                    max_displacement: max.max(0.0),
                })
            }
        }

        let tensioner = Tensioner {
            point: id,
            pinned_at,
            offset: Vec2::ZERO,
            max_displacement: max_displacement.map(|m| m.max(0.0)),
        };
        self.tensioners.retain(|t| t.point != id);
        self.tensioners.push(tensioner);
        log::debug!("Pinned point {} at ({:.1}, {:.1})", id, pinned_at.x, pinned_at.y);
        Some(tensioner)
    }

    /// Release the nearest hard- or soft-pinned point
    pub fn unpin_position(&mut self, x: f32, y: f32) -> Option<PointId> {
        let id = self.nearest_point(Vec2::new(x, y), |p| p.pinned || p.anchor.is_some())?;
        let point = self.point_mut(id)?;
        point.pinned = false;
        point.anchor = None;
        self.tensioners.retain(|t| t.point != id);
        log::debug!("Unpinned point {}", id);
        Some(id)
    }

    /// Pull a pinned point by `delta`, limited to its pin radius.
    /// Returns the new pin position.
    pub fn tension(&mut self, id: PointId, delta: Vec2) -> Option<Vec2> {
        if !delta.is_finite() {
            return None;
        }
        let bounds = self.bounds;
        let tensioner = self.tensioners.iter_mut().find(|t| t.point == id)?;
        let mut offset = tensioner.offset + delta;
        if let Some(max) = tensioner.max_displacement {
            offset = offset.clamp_length_max(max);
        }
        let target = bounds.clamp(tensioner.pinned_at + offset);
        tensioner.offset = target - tensioner.pinned_at;

        let point = self.points.get_mut(id.index())?.as_mut()?;
        match point.anchor.as_mut() {
            Some(anchor) => anchor.position = target,
            None => {
                point.pos = target;
                point.prev = target;
            }
        }
        Some(target)
    }

    /// Grab every free point within the actuator's influence radius
    pub fn grab(&mut self, actuator: &Actuator) -> usize {
        let center = actuator.position();
        let reach = actuator.influence() * actuator.influence();
        let mut grabbed = 0;
        for point in self.points.iter_mut().flatten() {
            if !point.pinned && point.pos.distance_squared(center) <= reach {
                point.grabbed = true;
                grabbed += 1;
            }
        }
        if grabbed > 0 {
            log::debug!("Grabbed {} points", grabbed);
        }
        grabbed
    }

    pub fn has_grabbed(&self) -> bool {
        self.points().any(|p| p.grabbed)
    }

    /// Return grabbed points to free integration
    pub fn release_grabbed(&mut self) {
        for point in self.points.iter_mut().flatten() {
            point.grabbed = false;
        }
    }

    /// Sever links under an engaged cut-mode actuator
    pub fn cut(&mut self, actuator: &Actuator) -> usize {
        if actuator.mode() != ActuatorMode::Cut || !actuator.is_engaged() {
            return 0;
        }
        self.cut_at(actuator.position(), actuator.cut_radius())
    }

    /// Sever every link whose midpoint lies within `radius` of `center`
    pub fn cut_at(&mut self, center: Vec2, radius: f32) -> usize {
        let reach = radius * radius;
        let mut doomed = Vec::new();
        for point in self.points.iter().flatten() {
            for link in &point.links {
                let Some(partner) = self.point(link.partner) else {
                    continue;
                };
                let midpoint = (point.pos + partner.pos) * 0.5;
                if midpoint.distance_squared(center) <= reach {
                    doomed.push((point.id, link.partner));
                }
            }
        }

        for &(owner, partner) in &doomed {
            self.sever_link(owner, partner);
        }
        if !doomed.is_empty() {
            log::debug!(
                "Cut {} links at ({:.1}, {:.1})",
                doomed.len(),
                center.x,
                center.y
            );
        }
        doomed.len()
    }

    /// Per arena slot, whether the point still hangs from the main body: a
    /// piece holding a pinned or anchored point, or the largest piece when
    /// nothing is pinned. Removed slots are `false`.
    pub fn body_mask(&self) -> Vec<bool> {
        const UNSEEN: usize = usize::MAX;
        let n = self.points.len();
        let mut adjacency = vec![Vec::new(); n];
        for (a, b) in self.links() {
            adjacency[a.index()].push(b.index());
            adjacency[b.index()].push(a.index());
        }

        let mut piece = vec![UNSEEN; n];
        let mut sizes = Vec::new();
        let mut held = Vec::new();
        for start in 0..n {
            if self.points[start].is_none() || piece[start] != UNSEEN {
                continue;
            }
            let id = sizes.len();
            let (mut size, mut pinned) = (0usize, false);
            let mut stack = vec![start];
            piece[start] = id;
            while let Some(i) = stack.pop() {
                size += 1;
                if let Some(p) = &self.points[i] {
                    pinned |= p.pinned || p.anchor.is_some();
                }
                for &j in &adjacency[i] {
                    if piece[j] == UNSEEN {
                        piece[j] = id;
                        stack.push(j);
                    }
                }
            }
            sizes.push(size);
            held.push(pinned);
        }

        let any_held = held.iter().any(|&h| h);
        let largest = sizes
            .iter()
            .enumerate()
            .max_by_key(|&(_, size)| *size)
            .map(|(id, _)| id);
        piece
            .into_iter()
            .map(|id| {
                if id == UNSEEN {
                    false
                } else if any_held {
                    held[id]
                } else {
                    Some(id) == largest
                }
            })
            .collect()
    }

    /// Every live point is in exactly the id list its tag names, the lists
    /// hold nothing else and every tensioner holds a live point
    pub fn check_partition(&self) -> bool {
        let mut seen = vec![0u8; self.points.len()];
        for (ids, region) in [(&self.target, Region::Target), (&self.background, Region::Background)] {
            for id in ids {
                let tagged = self.point(*id).is_some_and(|p| p.region == region);
                match seen.get_mut(id.index()) {
                    Some(count) if tagged => *count += 1,
                    _ => return false,
                }
            }
        }
        self.points()
            .all(|p| seen.get(p.id.index()).is_some_and(|&count| count == 1))
            && self.tensioners.iter().all(|t| self.point(t.point).is_some())
    }

    /// Every point sits in the slot its id names, link partners are live and
    /// incoming counts match the owners' lists
    pub fn check_topology(&self) -> bool {
        let slots_match = self
            .points
            .iter()
            .enumerate()
            .all(|(slot, p)| p.as_ref().is_none_or(|p| p.id.index() == slot));
        if !slots_match {
            return false;
        }

        let mut incoming = vec![0u32; self.points.len()];
        for point in self.points() {
            for link in &point.links {
                if link.partner == point.id
                    || self.point(link.partner).is_none()
                    || !link.is_severable()
                {
                    return false;
                }
                incoming[link.partner.index()] += 1;
            }
        }
        self.points().all(|p| p.incoming == incoming[p.id.index()])
    }

    /// Take points with no links out of the arena and their region list
    pub(crate) fn remove_detached(&mut self) -> Vec<PointId> {
        let detached: Vec<PointId> = self
            .points()
            .filter(|p| p.is_detached())
            .map(|p| p.id)
            .collect();
        if detached.is_empty() {
            return detached;
        }

        for &id in &detached {
            if let Some(point) = self.points[id.index()].take() {
                self.removed.push(Removal {
                    id,
                    origin: point.origin,
                    region: point.region,
                    step: self.steps,
                });
            }
        }

        let points = &self.points;
        let live = |id: &PointId| points.get(id.index()).is_some_and(Option::is_some);
        self.target.retain(live);
        self.background.retain(live);
        self.tensioners.retain(|t| live(&t.point));

        debug_assert!(self.check_partition());
        detached
    }
}

/// Link a point under construction to an already placed neighbour
fn link_new(point: &mut MassPoint, placed: &mut [Option<MassPoint>], partner: PointId) {
    if let Some(neighbour) = placed[partner.index()].as_mut() {
        point.links.push(Link::new(partner, point.pos, neighbour.pos));
        neighbour.incoming += 1;
    }
}

/// Borrow two distinct arena slots mutably
pub(crate) fn pair_mut(
    points: &mut [Option<MassPoint>],
    a: PointId,
    b: PointId,
) -> Option<(&mut MassPoint, &mut MassPoint)> {
    let (i, j) = (a.index(), b.index());
    if i == j || i >= points.len() || j >= points.len() {
        return None;
    }
    if i < j {
        let (lo, hi) = points.split_at_mut(j);
        Some((lo[i].as_mut()?, hi[0].as_mut()?))
    } else {
        let (lo, hi) = points.split_at_mut(i);
        Some((hi[0].as_mut()?, lo[j].as_mut()?))
    }
}
