//! Command validation ("light anti-cheat")
//!
//! Stateless checks run before a command touches the world. A rejection is
//! never reported to the client; the command is dropped.

use super::physics::PhysicsSystem;
use super::rules::GameRules;
use super::state::Player;
use crate::ws::protocol::MoveCmd;

/// Why a command was dropped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Unknown player")]
    UnknownPlayer,
    #[error("Player is dead")]
    PlayerDead,
    #[error("Player is still alive")]
    PlayerAlive,
    #[error("Moved {distance:.2} units, cap is {cap}")]
    MoveTooFar { distance: f32, cap: f32 },
    #[error("Invalid damage amount: {0}")]
    InvalidDamage(f32),
}

/// Player must exist
pub fn require_player(player: Option<&Player>) -> Result<&Player, Rejection> {
    player.ok_or(Rejection::UnknownPlayer)
}

/// Player must exist and be alive
pub fn require_alive(player: Option<&Player>) -> Result<&Player, Rejection> {
    let player = require_player(player)?;
    if !player.is_alive() {
        return Err(Rejection::PlayerDead);
    }
    Ok(player)
}

/// Anti-teleport: displacement from the last accepted position must stay
/// under the per-update cap. Non-finite coordinates fail the comparison.
pub fn validate_move(player: &Player, cmd: &MoveCmd, rules: &GameRules) -> Result<(), Rejection> {
    let distance = PhysicsSystem::distance(player.x, player.z, cmd.x, cmd.z);
    if !(distance < rules.max_move_per_update) || !cmd.angle.is_finite() {
        return Err(Rejection::MoveTooFar {
            distance,
            cap: rules.max_move_per_update,
        });
    }
    Ok(())
}

/// Damage must be a non-negative finite amount
pub fn validate_damage(amount: f32) -> Result<(), Rejection> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Rejection::InvalidDamage(amount));
    }
    Ok(())
}

/// Respawn is only valid for dead players
pub fn validate_respawn(player: Option<&Player>) -> Result<&Player, Rejection> {
    let player = require_player(player)?;
    if player.is_alive() {
        return Err(Rejection::PlayerAlive);
    }
    Ok(player)
}

/// Clamp a chat line to `max_chars` characters
pub fn truncate_chat(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}
