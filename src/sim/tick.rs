//! Fixed timestep surface step
//!
//! One step applies the actuator, relaxes the links, integrates, checks for
//! numeric blow-up and finally drops points that lost every link. Removal is
//! collected first and applied afterwards so no list is mutated mid-pass.

use glam::Vec2;

use super::actuator::{Actuator, ActuatorMode};
use super::point::{Integration, PointId};
use super::state::{Surface, pair_mut};
use crate::error::SimError;

/// What changed during one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Step counter after this step
    pub step: u64,
    /// Links cut by the actuator
    pub cut: usize,
    /// Links torn by overstretching
    pub torn: usize,
    /// Points removed in cleanup
    pub removed: Vec<PointId>,
}

impl StepReport {
    /// Fold a later report into this one
    pub fn merge(&mut self, other: StepReport) {
        self.step = other.step;
        self.cut += other.cut;
        self.torn += other.torn;
        self.removed.extend(other.removed);
    }
}

impl Surface {
    /// Advance the surface by one fixed timestep
    pub fn step(&mut self, actuator: &mut Actuator) -> Result<StepReport, SimError> {
        if self.poisoned {
            return Err(SimError::Poisoned);
        }
        self.steps += 1;

        let cut = self.apply_actuator(actuator);
        let torn = self.relax();
        self.check_finite()?;

        self.integrate(actuator.take_delta());
        self.check_finite()?;

        let removed = self.remove_detached();
        if cut + torn > 0 || !removed.is_empty() {
            log::debug!(
                "Step {}: cut {} links, tore {}, removed {} points",
                self.steps,
                cut,
                torn,
                removed.len()
            );
        }

        Ok(StepReport {
            step: self.steps,
            cut,
            torn,
            removed,
        })
    }

    /// Grab, cut or release according to the actuator state. Returns links cut.
    fn apply_actuator(&mut self, actuator: &mut Actuator) -> usize {
        if !actuator.is_engaged() {
            if self.has_grabbed() {
                self.release_grabbed();
            }
            return 0;
        }

        match actuator.mode() {
            ActuatorMode::Drag => {
                // Fresh grabs start where the actuator is now
                if !self.has_grabbed() && self.grab(actuator) > 0 {
                    actuator.take_delta();
                }
                0
            }
            ActuatorMode::Cut => {
                if self.has_grabbed() {
                    self.release_grabbed();
                }
                self.cut(actuator)
            }
        }
    }

    /// Run the configured relaxation passes. Returns links torn.
    pub(crate) fn relax(&mut self) -> usize {
        let stiffness = 1.0 / self.config().elasticity;
        let tear_factor = self.config().tear_factor;
        let mut torn = 0;

        for _ in 0..self.config().iterations {
            let mut overstretched = Vec::new();

            for index in 0..self.points.len() {
                let Some(point) = &self.points[index] else {
                    continue;
                };
                let owner = point.id;

                for k in 0..point.links.len() {
                    let link = self.points[index]
                        .as_ref()
                        .and_then(|p| p.links.get(k).copied());
                    let Some(link) = link else {
                        break;
                    };
                    let Some((a, b)) = pair_mut(&mut self.points, owner, link.partner) else {
                        continue;
                    };
                    if tear_factor.is_some_and(|f| link.is_overstretched(a.pos, b.pos, f)) {
                        overstretched.push((owner, link.partner));
                        continue;
                    }
                    link.apply_correction(a, b, stiffness);
                }
            }

            for (owner, partner) in overstretched {
                if self.sever_link(owner, partner) {
                    torn += 1;
                }
            }

            for point in self.points.iter_mut().flatten() {
                if let Some(anchor) = point.anchor {
                    point.pos = anchor.constrain(point.pos);
                }
            }
        }

        torn
    }

    fn integrate(&mut self, drag: Vec2) {
        let config = self.config();
        let step = Integration {
            dt: config.dt,
            damping: config.damping,
            acceleration: Vec2::new(0.0, -config.gravity),
            bounds: self.bounds(),
        };
        for point in self.points.iter_mut().flatten() {
            point.integrate(&step, drag);
        }
    }

    /// Poison the surface on the first non-finite position
    fn check_finite(&mut self) -> Result<(), SimError> {
        let Some(bad) = self
            .points()
            .find(|p| !(p.pos.is_finite() && p.prev.is_finite()))
            .map(|p| p.id)
        else {
            return Ok(());
        };

        self.poisoned = true;
        log::warn!(
            "Surface went unstable at point {} on step {}",
            bad,
            self.steps
        );
        Err(SimError::Unstable {
            point: bad,
            step: self.steps,
        })
    }
}
