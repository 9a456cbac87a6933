//! Per-tick world advancement

use std::collections::HashSet;

use uuid::Uuid;

use crate::util::time::tick_interval_ms;
use crate::ws::protocol::{RingView, ServerMsg};

use super::combat::{CombatSystem, DeathCause};
use super::state::WorldState;
use super::Outbound;

/// True when a whole-second boundary lies in (prev_ms, now_ms]
pub fn crossed_second(prev_ms: u64, now_ms: u64) -> bool {
    prev_ms / 1000 != now_ms / 1000
}

impl WorldState {
    /// Advance the world by `dt` seconds of real time.
    ///
    /// `prev_ms`/`now_ms` are the clock readings of the previous and current
    /// tick; they only drive the once-per-second ring broadcast.
    pub fn tick(&mut self, dt: f32, prev_ms: u64, now_ms: u64) -> Vec<Outbound> {
        let mut events = Vec::new();
        self.tick += 1;

        // Shrink the safe zone
        if self.started {
            self.ring.shrink(dt);
        }

        // Damage players outside it
        events.extend(self.apply_ring_damage(dt));

        // Move projectiles and resolve collisions
        events.extend(self.update_projectiles(dt));

        // Burn fire zones
        events.extend(self.update_fire_zones(dt));

        if crossed_second(prev_ms, now_ms) {
            events.push(Outbound::all(ServerMsg::RingUpdate(RingView::from(
                &self.ring,
            ))));
        }

        events
    }

    fn apply_ring_damage(&mut self, dt: f32) -> Vec<Outbound> {
        let mut events = Vec::new();
        let damage = CombatSystem::damage_over_time(self.rules.ring_damage_per_sec, dt);

        for player in self.players.values_mut() {
            if !player.is_alive() || self.ring.contains(player.x, player.z) {
                continue;
            }

            let (health, killed) =
                CombatSystem::apply_damage(player.health, damage, self.rules.max_health);
            player.health = health;

            if killed {
                events.push(Outbound::all(ServerMsg::PlayerDied {
                    player_id: player.id,
                    killer_id: None,
                    cause: DeathCause::Zone,
                }));
            } else {
                events.push(Outbound::only(player.id, ServerMsg::RingDamage { health }));
            }
        }

        events
    }

    /// Each projectile leaves for at most one reason, checked in order:
    /// wall, first living non-owner player in range, out of bounds, age.
    fn update_projectiles(&mut self, dt: f32) -> Vec<Outbound> {
        let mut events = Vec::new();
        let mut removed: Vec<Uuid> = Vec::new();
        let hit_radius = self.rules.hit_radius;
        let max_health = self.rules.max_health;

        for projectile in self.projectiles.iter_mut() {
            projectile.update(dt);

            if self.map.is_inside_any_wall(projectile.x, projectile.z) {
                removed.push(projectile.id);
                continue;
            }

            let target = self.players.values_mut().find(|p| {
                p.is_alive()
                    && p.id != projectile.owner_id
                    && projectile.check_hit(p.x, p.z, hit_radius)
            });

            if let Some(target) = target {
                let (health, killed) =
                    CombatSystem::apply_damage(target.health, projectile.damage, max_health);
                target.health = health;

                events.push(Outbound::all(ServerMsg::PlayerHit {
                    target_id: target.id,
                    shooter_id: projectile.owner_id,
                    projectile_id: projectile.id,
                    damage: projectile.damage,
                    health,
                }));
                if killed {
                    events.push(Outbound::all(ServerMsg::PlayerDied {
                        player_id: target.id,
                        killer_id: Some(projectile.owner_id),
                        cause: DeathCause::Projectile,
                    }));
                }
                removed.push(projectile.id);
                continue;
            }

            if self.map.is_out_of_bounds(projectile.x, projectile.z)
                || projectile.age_ms >= self.rules.projectile_max_age_ms
            {
                removed.push(projectile.id);
            }
        }

        if !removed.is_empty() {
            let gone: HashSet<Uuid> = removed.iter().copied().collect();
            self.projectiles.retain(|p| !gone.contains(&p.id));
            events.push(Outbound::all(ServerMsg::ProjectilesRemoved { ids: removed }));
        }

        events
    }

    /// Lifetimes count down by the nominal tick length; damage scales by `dt`.
    /// A player standing in several zones is burnt once per tick.
    fn update_fire_zones(&mut self, dt: f32) -> Vec<Outbound> {
        let mut events = Vec::new();
        let elapsed_ms = tick_interval_ms();

        let mut expired: Vec<Uuid> = Vec::new();
        for zone in self.fire_zones.iter_mut() {
            if !zone.update(elapsed_ms) {
                expired.push(zone.id);
            }
        }
        if !expired.is_empty() {
            self.fire_zones.retain(|z| z.remaining_ms > 0.0);
        }

        let damage = CombatSystem::damage_over_time(self.rules.fire_damage_per_sec, dt);
        for player in self.players.values_mut() {
            if !player.is_alive() {
                continue;
            }
            let Some(zone) = self.fire_zones.iter().find(|z| z.contains(player.x, player.z)) else {
                continue;
            };

            let (health, killed) =
                CombatSystem::apply_damage(player.health, damage, self.rules.max_health);
            player.health = health;

            if killed {
                events.push(Outbound::all(ServerMsg::PlayerDied {
                    player_id: player.id,
                    killer_id: None,
                    cause: DeathCause::Fire,
                }));
            } else {
                events.push(Outbound::only(
                    player.id,
                    ServerMsg::FireDamage {
                        zone_id: zone.id,
                        health,
                    },
                ));
            }
        }

        if !expired.is_empty() {
            events.push(Outbound::all(ServerMsg::FireZonesRemoved { ids: expired }));
        }

        events
    }
}
