//! Combat system - projectiles, fire zones, damage

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::physics::PhysicsSystem;

/// Active projectile in the game
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub x: f32,
    pub z: f32,
    pub vx: f32,
    pub vz: f32,
    pub damage: f32,
    /// Simulated age in milliseconds
    pub age_ms: f32,
}

impl Projectile {
    /// Create a projectile from client-supplied kinematics with a fresh id
    pub fn new(owner_id: Uuid, x: f32, z: f32, vx: f32, vz: f32, damage: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            x,
            z,
            vx,
            vz,
            damage,
            age_ms: 0.0,
        }
    }

    /// Integrate position by velocity over `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let (x, z) = PhysicsSystem::integrate(self.x, self.z, self.vx, self.vz, dt);
        self.x = x;
        self.z = z;
        self.age_ms += dt * 1000.0;
    }

    /// Check collision with a target
    pub fn check_hit(&self, target_x: f32, target_z: f32, hit_radius: f32) -> bool {
        PhysicsSystem::within(self.x, self.z, target_x, target_z, hit_radius)
    }
}

/// Burning area left by a molotov
#[derive(Debug, Clone)]
pub struct FireZone {
    pub id: Uuid,
    pub x: f32,
    pub z: f32,
    pub radius: f32,
    pub remaining_ms: f32,
}

impl FireZone {
    pub fn new(x: f32, z: f32, radius: f32, lifetime_ms: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            z,
            radius,
            remaining_ms: lifetime_ms,
        }
    }

    /// Count down by `elapsed_ms`, returns false once burnt out
    pub fn update(&mut self, elapsed_ms: f32) -> bool {
        self.remaining_ms -= elapsed_ms;
        self.remaining_ms > 0.0
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        PhysicsSystem::is_in_zone(x, z, self.x, self.z, self.radius)
    }
}

/// What killed a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeathCause {
    Projectile,
    Damage,
    Zone,
    Fire,
}

/// Combat rules for damage application
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to health, returns (new_health, is_dead).
    /// Result is clamped to [0, max_health].
    pub fn apply_damage(current_health: f32, damage: f32, max_health: f32) -> (f32, bool) {
        let new_health = (current_health - damage).clamp(0.0, max_health);
        (new_health, new_health <= 0.0)
    }

    /// Damage for a damage-over-time source across `dt` seconds
    pub fn damage_over_time(damage_per_second: f32, dt: f32) -> f32 {
        damage_per_second * dt
    }
}
