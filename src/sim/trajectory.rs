//! Cut trajectories and the scripted driver that replays them
//!
//! A driver turns a list of waypoints into one `ActuatorInput` per decision
//! tick. Optional seeded jitter emulates noisy hand or robot input while
//! staying reproducible.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::actuator::{ActuatorInput, ActuatorMode};
use crate::polar_to_cartesian;

/// `count` evenly spaced waypoints around a full circle
pub fn circle(center: Vec2, radius: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| polar_to_cartesian(center, radius, TAU * i as f32 / count as f32))
        .collect()
}

/// Linearly resample a polyline into `points.len() * factor` samples,
/// keeping both endpoints
pub fn upsample(points: &[Vec2], factor: usize) -> Vec<Vec2> {
    if points.len() < 2 || factor <= 1 {
        return points.to_vec();
    }

    let samples = points.len() * factor;
    let last = (points.len() - 1) as f32;
    (0..samples)
        .map(|i| {
            let s = last * i as f32 / (samples - 1) as f32;
            let seg = (s.floor() as usize).min(points.len() - 2);
            let t = s - seg as f32;
            points[seg].lerp(points[seg + 1], t)
        })
        .collect()
}

/// Replays waypoints as cut-mode actuator input
#[derive(Debug, Clone)]
pub struct TrajectoryDriver {
    waypoints: Vec<Vec2>,
    cursor: usize,
    jitter: f32,
    rng: Pcg32,
}

impl TrajectoryDriver {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self {
            waypoints,
            cursor: 0,
            jitter: 0.0,
            rng: Pcg32::seed_from_u64(0),
        }
    }

    /// Offset every waypoint by up to `amount` per axis, drawn from a seeded stream
    pub fn with_jitter(mut self, amount: f32, seed: u64) -> Self {
        self.jitter = amount.abs();
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    pub fn remaining(&self) -> usize {
        self.waypoints.len() - self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.waypoints.len()
    }

    fn noise(&mut self) -> Vec2 {
        if self.jitter > 0.0 {
            Vec2::new(
                self.rng.random_range(-self.jitter..=self.jitter),
                self.rng.random_range(-self.jitter..=self.jitter),
            )
        } else {
            Vec2::ZERO
        }
    }
}

impl Iterator for TrajectoryDriver {
    type Item = ActuatorInput;

    fn next(&mut self) -> Option<ActuatorInput> {
        let waypoint = *self.waypoints.get(self.cursor)?;
        let first = self.cursor == 0;
        self.cursor += 1;

        let target = waypoint + self.noise();
        // First tick arms the blade; later ticks only move it
        Some(ActuatorInput {
            move_to: Some(target),
            press: first,
            mode: first.then_some(ActuatorMode::Cut),
            ..Default::default()
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}
