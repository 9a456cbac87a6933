//! Shrinking safe zone ("ring")

use super::physics::PhysicsSystem;
use super::rules::GameRules;

/// Safe-zone singleton. Center is fixed at the map origin.
#[derive(Debug, Clone)]
pub struct SafeZone {
    pub center_x: f32,
    pub center_z: f32,
    /// Current radius
    pub radius: f32,
    /// Seconds of shrinking left
    pub countdown: f32,
    initial_radius: f32,
    min_radius: f32,
    shrink_secs: f32,
}

impl SafeZone {
    pub fn new(rules: &GameRules) -> Self {
        Self {
            center_x: 0.0,
            center_z: 0.0,
            radius: rules.ring_initial_radius,
            countdown: rules.ring_shrink_secs,
            initial_radius: rules.ring_initial_radius,
            min_radius: rules.ring_min_radius,
            shrink_secs: rules.ring_shrink_secs,
        }
    }

    /// Advance the shrink by `dt` seconds.
    ///
    /// Radius is linear in elapsed shrink time between the initial radius and
    /// the floor, and never grows.
    pub fn shrink(&mut self, dt: f32) {
        if self.radius <= self.min_radius {
            return;
        }

        self.countdown = (self.countdown - dt).max(0.0);
        let progress = if self.shrink_secs > 0.0 {
            1.0 - (self.countdown / self.shrink_secs).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let target = self.initial_radius + (self.min_radius - self.initial_radius) * progress;
        self.radius = target.max(self.min_radius).min(self.radius);
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        PhysicsSystem::is_in_zone(x, z, self.center_x, self.center_z, self.radius)
    }
}
