//! Game simulation modules

pub mod broadcast;
pub mod combat;
pub mod map;
pub mod physics;
pub mod ring;
pub mod rules;
pub mod server;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod validator;

pub use map::MapGeometry;
pub use rules::GameRules;
pub use server::{GameServer, WorldHandle};
pub use state::WorldState;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Everything the world task receives from connections
#[derive(Debug)]
pub enum WorldInput {
    /// A client link opened
    Connect {
        player_id: Uuid,
        name: String,
        outbound: mpsc::UnboundedSender<ServerMsg>,
    },
    /// A parsed client command
    Command { player_id: Uuid, msg: ClientMsg },
    /// The client link closed
    Disconnect { player_id: Uuid },
}

/// Fan-out target for an outbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    All,
    AllExcept(Uuid),
    Only(Uuid),
}

/// An event paired with who should receive it
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipients,
    pub msg: ServerMsg,
}

impl Outbound {
    pub fn all(msg: ServerMsg) -> Self {
        Self {
            to: Recipients::All,
            msg,
        }
    }

    pub fn all_except(player_id: Uuid, msg: ServerMsg) -> Self {
        Self {
            to: Recipients::AllExcept(player_id),
            msg,
        }
    }

    pub fn only(player_id: Uuid, msg: ServerMsg) -> Self {
        Self {
            to: Recipients::Only(player_id),
            msg,
        }
    }
}
