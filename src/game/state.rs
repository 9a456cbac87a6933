//! Authoritative world state and command application

use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::ws::protocol::{
    FireZoneView, MolotovCmd, MoveCmd, PlayerView, ProjectileView, ServerMsg, ShootCmd,
    TakeDamageCmd,
};

use super::combat::{CombatSystem, DeathCause, FireZone, Projectile};
use super::map::MapGeometry;
use super::ring::SafeZone;
use super::rules::GameRules;
use super::validator::{self, Rejection};
use super::Outbound;

/// Player state (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,

    // Position on the ground plane
    pub x: f32,
    pub z: f32,
    pub angle: f32,

    /// Health in [0, max]; dead at 0
    pub health: f32,
    pub flashlight: bool,
}

impl Player {
    pub fn new(id: Uuid, name: String, x: f32, z: f32, health: f32) -> Self {
        Self {
            id,
            name,
            x,
            z,
            angle: 0.0,
            health,
            flashlight: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// World state, owned by the world task
pub struct WorldState {
    pub rules: GameRules,
    pub map: Arc<MapGeometry>,
    pub players: HashMap<Uuid, Player>,
    pub projectiles: Vec<Projectile>,
    pub fire_zones: Vec<FireZone>,
    pub ring: SafeZone,
    /// Set when the first player connects; the ring only shrinks afterwards
    pub started: bool,
    pub tick: u64,
    rng: ChaCha8Rng,
}

impl WorldState {
    pub fn new(map: Arc<MapGeometry>, rules: GameRules, seed: u64) -> Self {
        let ring = SafeZone::new(&rules);
        Self {
            rules,
            map,
            players: HashMap::new(),
            projectiles: Vec::new(),
            fire_zones: Vec::new(),
            ring,
            started: false,
            tick: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create a player at a random spawn point
    pub fn add_player(&mut self, id: Uuid, name: String) -> &Player {
        let (x, z) = self.map.random_spawn(&mut self.rng);
        let player = Player::new(id, name, x, z, self.rules.max_health);
        self.started = true;
        self.players.entry(id).or_insert(player)
    }

    pub fn remove_player(&mut self, id: Uuid) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.is_alive()).count()
    }

    pub fn handle_move(&mut self, id: Uuid, cmd: MoveCmd) -> Result<Vec<Outbound>, Rejection> {
        let player = validator::require_alive(self.players.get(&id))?;
        validator::validate_move(player, &cmd, &self.rules)?;

        let player = self.players.get_mut(&id).ok_or(Rejection::UnknownPlayer)?;
        player.x = cmd.x;
        player.z = cmd.z;
        player.angle = cmd.angle;

        Ok(vec![Outbound::all_except(
            id,
            ServerMsg::PlayerMoved {
                player_id: id,
                x: cmd.x,
                z: cmd.z,
                angle: cmd.angle,
            },
        )])
    }

    /// Spawn every projectile in the volley. Kinematics are trusted, ids are ours.
    pub fn handle_shoot(&mut self, id: Uuid, cmd: ShootCmd) -> Result<Vec<Outbound>, Rejection> {
        validator::require_alive(self.players.get(&id))?;
        if cmd.projectiles.is_empty() {
            return Ok(Vec::new());
        }

        let fired: Vec<Projectile> = cmd
            .projectiles
            .iter()
            .map(|spec| Projectile::new(id, spec.x, spec.z, spec.vx, spec.vz, spec.damage))
            .collect();
        let views = fired.iter().map(ProjectileView::from).collect();
        self.projectiles.extend(fired);

        Ok(vec![Outbound::all(ServerMsg::ProjectilesFired {
            owner_id: id,
            projectiles: views,
        })])
    }

    pub fn handle_molotov(
        &mut self,
        id: Uuid,
        cmd: MolotovCmd,
    ) -> Result<Vec<Outbound>, Rejection> {
        validator::require_alive(self.players.get(&id))?;

        let zone = FireZone::new(cmd.x, cmd.z, cmd.radius, self.rules.fire_lifetime_ms);
        let view = FireZoneView::from(&zone);
        self.fire_zones.push(zone);

        Ok(vec![Outbound::all(ServerMsg::FireCreated { zone: view })])
    }

    pub fn handle_flashlight(&mut self, id: Uuid, on: bool) -> Result<Vec<Outbound>, Rejection> {
        let player = self.players.get_mut(&id).ok_or(Rejection::UnknownPlayer)?;
        player.flashlight = on;

        Ok(vec![Outbound::all_except(
            id,
            ServerMsg::FlashlightToggled { player_id: id, on },
        )])
    }

    pub fn handle_take_damage(
        &mut self,
        id: Uuid,
        cmd: TakeDamageCmd,
    ) -> Result<Vec<Outbound>, Rejection> {
        validator::require_alive(self.players.get(&id))?;
        validator::validate_damage(cmd.amount)?;

        let max_health = self.rules.max_health;
        let player = self.players.get_mut(&id).ok_or(Rejection::UnknownPlayer)?;
        let (health, killed) = CombatSystem::apply_damage(player.health, cmd.amount, max_health);
        player.health = health;

        let mut events = vec![Outbound::all(ServerMsg::PlayerDamaged {
            player_id: id,
            amount: cmd.amount,
            health,
            from_player_id: cmd.from_player_id,
        })];
        if killed {
            events.push(Outbound::all(ServerMsg::PlayerDied {
                player_id: id,
                killer_id: cmd.from_player_id,
                cause: DeathCause::Damage,
            }));
        }
        Ok(events)
    }

    pub fn handle_respawn(&mut self, id: Uuid) -> Result<Vec<Outbound>, Rejection> {
        validator::validate_respawn(self.players.get(&id))?;

        let (x, z) = self.map.random_spawn(&mut self.rng);
        let max_health = self.rules.max_health;
        let player = self.players.get_mut(&id).ok_or(Rejection::UnknownPlayer)?;
        player.health = max_health;
        player.x = x;
        player.z = z;
        player.angle = 0.0;

        Ok(vec![Outbound::all(ServerMsg::PlayerRespawned {
            player: PlayerView::from(&*player),
        })])
    }

    pub fn handle_chat(&mut self, id: Uuid, message: &str) -> Result<Vec<Outbound>, Rejection> {
        let player = validator::require_player(self.players.get(&id))?;

        Ok(vec![Outbound::all(ServerMsg::Chat {
            player_id: id,
            name: player.name.clone(),
            message: validator::truncate_chat(message, self.rules.max_chat_len),
        })])
    }
}
