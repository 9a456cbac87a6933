//! Snapshot building for newly connected clients

use uuid::Uuid;

use crate::ws::protocol::{FireZoneView, PlayerView, ProjectileView, RingView, Snapshot};

use super::combat::{FireZone, Projectile};
use super::ring::SafeZone;
use super::state::{Player, WorldState};

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            x: p.x,
            z: p.z,
            angle: p.angle,
            health: p.health,
            flashlight: p.flashlight,
        }
    }
}

impl From<&Projectile> for ProjectileView {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            x: p.x,
            z: p.z,
            vx: p.vx,
            vz: p.vz,
            damage: p.damage,
        }
    }
}

impl From<&FireZone> for FireZoneView {
    fn from(zone: &FireZone) -> Self {
        Self {
            id: zone.id,
            x: zone.x,
            z: zone.z,
            radius: zone.radius,
            remaining_ms: zone.remaining_ms,
        }
    }
}

impl From<&SafeZone> for RingView {
    fn from(ring: &SafeZone) -> Self {
        Self {
            radius: ring.radius,
            countdown: ring.countdown,
        }
    }
}

/// Build the full-state snapshot sent to `self_id` on connect
pub fn build_snapshot(state: &WorldState, self_id: Uuid) -> Snapshot {
    Snapshot {
        self_id,
        players: state.players.values().map(PlayerView::from).collect(),
        projectiles: state.projectiles.iter().map(ProjectileView::from).collect(),
        fire_zones: state.fire_zones.iter().map(FireZoneView::from).collect(),
        ring: RingView::from(&state.ring),
    }
}
