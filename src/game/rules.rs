//! Gameplay tuning shared by the validator and the tick loop

/// Gameplay constants
#[derive(Debug, Clone)]
pub struct GameRules {
    /// Maximum (and respawn) health
    pub max_health: f32,
    /// Max displacement accepted per move update
    pub max_move_per_update: f32,
    /// Chat messages are truncated to this many characters
    pub max_chat_len: usize,
    /// Distance at which a projectile hits a player
    pub hit_radius: f32,
    /// Simulated age after which a projectile is dropped
    pub projectile_max_age_ms: f32,

    /// Safe-zone radius at game start
    pub ring_initial_radius: f32,
    /// Safe-zone floor
    pub ring_min_radius: f32,
    /// Seconds to shrink from initial radius to floor
    pub ring_shrink_secs: f32,
    /// Damage per second outside the safe zone
    pub ring_damage_per_sec: f32,

    /// Fire-zone lifetime
    pub fire_lifetime_ms: f32,
    /// Damage per second inside a fire zone
    pub fire_damage_per_sec: f32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_move_per_update: 2.0,
            max_chat_len: 200,
            hit_radius: 0.8,
            projectile_max_age_ms: 3000.0,
            ring_initial_radius: 80.0,
            ring_min_radius: 5.0,
            ring_shrink_secs: 420.0,
            ring_damage_per_sec: 5.0,
            fire_lifetime_ms: 5000.0,
            fire_damage_per_sec: 15.0,
        }
    }
}
