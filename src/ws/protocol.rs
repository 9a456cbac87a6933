//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON object `{"type": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::DeathCause;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Position update, validated against the movement cap
    Move(MoveCmd),

    /// Fire one or more projectiles (pistol = 1, shotgun = 20 pellets)
    Shoot(ShootCmd),

    /// Throw a molotov, leaving a fire zone
    Molotov(MolotovCmd),

    /// Cosmetic flashlight state
    ToggleFlashlight(bool),

    /// Client-reported damage
    TakeDamage(TakeDamageCmd),

    /// Come back after dying
    Respawn,

    /// Chat line, truncated server-side
    Chat(String),

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave the game
    Disconnect,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveCmd {
    pub x: f32,
    pub z: f32,
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShootCmd {
    pub projectiles: Vec<ProjectileSpec>,
}

/// Client-supplied projectile kinematics. The server assigns the id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub x: f32,
    pub z: f32,
    pub vx: f32,
    pub vz: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MolotovCmd {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeDamageCmd {
    pub amount: f32,
    #[serde(default)]
    pub from_player_id: Option<Uuid>,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Full world snapshot for a new connection
    Init(Snapshot),

    PlayerJoined {
        player: PlayerView,
    },

    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: Uuid,
    },

    #[serde(rename_all = "camelCase")]
    PlayerMoved {
        player_id: Uuid,
        x: f32,
        z: f32,
        angle: f32,
    },

    #[serde(rename_all = "camelCase")]
    ProjectilesFired {
        owner_id: Uuid,
        projectiles: Vec<ProjectileView>,
    },

    /// Every projectile removed during one tick
    ProjectilesRemoved {
        ids: Vec<Uuid>,
    },

    FireCreated {
        zone: FireZoneView,
    },

    /// Every fire zone that burnt out during one tick
    FireZonesRemoved {
        ids: Vec<Uuid>,
    },

    #[serde(rename_all = "camelCase")]
    FlashlightToggled {
        player_id: Uuid,
        on: bool,
    },

    /// Projectile hit
    #[serde(rename_all = "camelCase")]
    PlayerHit {
        target_id: Uuid,
        shooter_id: Uuid,
        projectile_id: Uuid,
        damage: f32,
        health: f32,
    },

    /// Direct damage from a takeDamage command
    #[serde(rename_all = "camelCase")]
    PlayerDamaged {
        player_id: Uuid,
        amount: f32,
        health: f32,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        from_player_id: Option<Uuid>,
    },

    #[serde(rename_all = "camelCase")]
    PlayerDied {
        player_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        killer_id: Option<Uuid>,
        cause: DeathCause,
    },

    PlayerRespawned {
        player: PlayerView,
    },

    /// Safe-zone state, once per second
    RingUpdate(RingView),

    /// Ring damage, sent to the damaged player only
    RingDamage {
        health: f32,
    },

    /// Fire damage, sent to the damaged player only
    #[serde(rename_all = "camelCase")]
    FireDamage {
        zone_id: Uuid,
        health: f32,
    },

    #[serde(rename_all = "camelCase")]
    Chat {
        player_id: Uuid,
        name: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Full world state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The receiving connection's player id
    pub self_id: Uuid,
    pub players: Vec<PlayerView>,
    pub projectiles: Vec<ProjectileView>,
    pub fire_zones: Vec<FireZoneView>,
    pub ring: RingView,
}

/// Player state as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub z: f32,
    pub angle: f32,
    /// Health (0-100)
    pub health: f32,
    pub flashlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub x: f32,
    pub z: f32,
    pub vx: f32,
    pub vz: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireZoneView {
    pub id: Uuid,
    pub x: f32,
    pub z: f32,
    pub radius: f32,
    pub remaining_ms: f32,
}

/// Safe-zone (ring) state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingView {
    pub radius: f32,
    /// Seconds of shrinking left
    pub countdown: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_commands() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"move","data":{"x":1.5,"z":-2,"angle":0.5}}"#)
                .unwrap();
        assert!(matches!(msg, ClientMsg::Move(MoveCmd { x, .. }) if x == 1.5));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"toggleFlashlight","data":true}"#).unwrap();
        assert!(matches!(msg, ClientMsg::ToggleFlashlight(true)));

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"respawn"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Respawn));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"takeDamage","data":{"amount":150}}"#).unwrap();
        assert!(
            matches!(msg, ClientMsg::TakeDamage(cmd) if cmd.amount == 150.0 && cmd.from_player_id.is_none())
        );

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"chat","data":"gg"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Chat(ref text) if text == "gg"));
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"teleport","data":{}}"#).is_err());
    }

    #[test]
    fn server_events_use_camel_case() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ServerMsg::PlayerDied {
            player_id: id,
            killer_id: None,
            cause: DeathCause::Zone,
        })
        .unwrap();

        assert_eq!(json["type"], "playerDied");
        assert_eq!(json["data"]["cause"], "zone");
        assert!(json["data"].get("killerId").is_none());
        assert!(json["data"].get("playerId").is_some());

        let json = serde_json::to_value(ServerMsg::RingUpdate(RingView {
            radius: 80.0,
            countdown: 420.0,
        }))
        .unwrap();
        assert_eq!(json["type"], "ringUpdate");
        assert_eq!(json["data"]["radius"], 80.0);
    }
}
