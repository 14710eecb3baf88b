//! Pointer-like actuator that drags or cuts the cloth
//!
//! The actuator is owned by whoever drives the simulation and passed into
//! each step explicitly. Input is noisy by nature, so every coordinate is
//! clamped into the bounds instead of rejected.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Bounds;
use crate::config::ActuatorConfig;

/// What the actuator does to the cloth while engaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorMode {
    /// Grab points within the influence radius and carry them along
    #[default]
    Drag,
    /// Sever links whose midpoint lies within the cut radius
    Cut,
}

/// Input events for a single decision tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActuatorInput {
    /// Target planar position
    pub move_to: Option<Vec2>,
    /// Target height above the cloth
    pub height: Option<f32>,
    /// Button down
    pub press: bool,
    /// Button up (wins over `press` when both are set)
    pub release: bool,
    /// Switch between drag and cut
    pub mode: Option<ActuatorMode>,
}

/// The interactive influence source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actuator {
    pos: Vec2,
    /// Position last consumed by a surface step
    prev: Vec2,
    z: f32,
    height_limit: f32,
    pressed: bool,
    mode: ActuatorMode,
    influence: f32,
    cut_radius: f32,
    bounds: Bounds,
}

impl Actuator {
    /// Released drag-mode actuator at `pos` with default radii
    pub fn new(pos: Vec2, bounds: Bounds) -> Self {
        let config = ActuatorConfig {
            x: pos.x,
            y: pos.y,
            ..Default::default()
        };
        Self::from_config(&config, bounds)
    }

    pub fn from_config(config: &ActuatorConfig, bounds: Bounds) -> Self {
        let pos = bounds.clamp(Vec2::new(config.x, config.y));
        Self {
            pos,
            prev: pos,
            z: bounds.clamp_height(config.z),
            height_limit: config.height_limit,
            pressed: config.down,
            mode: config.mode,
            influence: config.influence.max(0.0),
            cut_radius: config.cut.max(0.0),
            bounds,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn previous(&self) -> Vec2 {
        self.prev
    }

    pub fn height(&self) -> f32 {
        self.z
    }

    pub fn mode(&self) -> ActuatorMode {
        self.mode
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn influence(&self) -> f32 {
        self.influence
    }

    pub fn cut_radius(&self) -> f32 {
        self.cut_radius
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Move to (x, y), clamped into bounds. Non-finite input is ignored.
    pub fn move_to(&mut self, x: f32, y: f32) {
        let target = Vec2::new(x, y);
        if target.is_finite() {
            self.pos = self.bounds.clamp(target);
        }
    }

    pub fn set_height(&mut self, z: f32) {
        if z.is_finite() {
            self.z = self.bounds.clamp_height(z);
        }
    }

    pub fn press(&mut self) {
        self.pressed = true;
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }

    pub fn set_mode(&mut self, mode: ActuatorMode) {
        self.mode = mode;
    }

    pub fn set_influence(&mut self, radius: f32) {
        self.influence = radius.max(0.0);
    }

    pub fn set_cut_radius(&mut self, radius: f32) {
        self.cut_radius = radius.max(0.0);
    }

    /// Pressed and low enough to touch the cloth
    pub fn is_engaged(&self) -> bool {
        self.pressed && self.z <= self.height_limit
    }

    /// Apply one tick of input
    pub fn apply(&mut self, input: &ActuatorInput) {
        if let Some(mode) = input.mode {
            self.set_mode(mode);
        }
        if let Some(z) = input.height {
            self.set_height(z);
        }
        if let Some(target) = input.move_to {
            self.move_to(target.x, target.y);
        }
        if input.press {
            self.press();
        }
        if input.release {
            self.release();
        }
    }

    /// Displacement not yet consumed by a step
    pub fn delta(&self) -> Vec2 {
        self.pos - self.prev
    }

    /// Consume the pending displacement so sub-steps do not repeat it
    pub(crate) fn take_delta(&mut self) -> Vec2 {
        let delta = self.delta();
        self.prev = self.pos;
        delta
    }
}
