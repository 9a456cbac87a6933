//! Outbound event fan-out

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

use super::{Outbound, Recipients};

/// Maps each connection to its outbound channel
#[derive(Default)]
pub struct Broadcaster {
    connections: HashMap<Uuid, mpsc::UnboundedSender<ServerMsg>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, player_id: Uuid, outbound: mpsc::UnboundedSender<ServerMsg>) {
        self.connections.insert(player_id, outbound);
    }

    /// Dropping the sender closes the connection's writer
    pub fn unregister(&mut self, player_id: Uuid) -> bool {
        self.connections.remove(&player_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Deliver one event to its recipients
    pub fn deliver(&self, outbound: Outbound) {
        match outbound.to {
            Recipients::All => {
                for (id, tx) in &self.connections {
                    Self::send(*id, tx, outbound.msg.clone());
                }
            }
            Recipients::AllExcept(excluded) => {
                for (id, tx) in self.connections.iter().filter(|(id, _)| **id != excluded) {
                    Self::send(*id, tx, outbound.msg.clone());
                }
            }
            Recipients::Only(target) => match self.connections.get(&target) {
                Some(tx) => Self::send(target, tx, outbound.msg),
                None => debug!(player_id = %target, "No connection for targeted event"),
            },
        }
    }

    pub fn deliver_all(&self, events: impl IntoIterator<Item = Outbound>) {
        for event in events {
            self.deliver(event);
        }
    }

    fn send(player_id: Uuid, tx: &mpsc::UnboundedSender<ServerMsg>, msg: ServerMsg) {
        if tx.send(msg).is_err() {
            debug!(player_id = %player_id, "Outbound channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn fan_out_respects_recipients() {
        let mut broadcaster = Broadcaster::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        broadcaster.register(a, tx_a);
        broadcaster.register(b, tx_b);

        broadcaster.deliver_all([
            Outbound::all(ServerMsg::Pong { t: 1 }),
            Outbound::all_except(a, ServerMsg::Pong { t: 2 }),
            Outbound::only(a, ServerMsg::Pong { t: 3 }),
        ]);

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMsg::Pong { t: 1 }, ServerMsg::Pong { t: 3 }]
        );
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMsg::Pong { t: 1 }, ServerMsg::Pong { t: 2 }]
        );
    }

    #[test]
    fn closed_or_missing_connections_are_skipped() {
        let mut broadcaster = Broadcaster::new();
        let a = Uuid::new_v4();
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        broadcaster.register(a, tx_a);
        drop(rx_a);

        broadcaster.deliver(Outbound::all(ServerMsg::Pong { t: 1 }));
        broadcaster.deliver(Outbound::only(Uuid::new_v4(), ServerMsg::Pong { t: 2 }));

        assert!(broadcaster.unregister(a));
        assert!(!broadcaster.unregister(a));
        assert!(broadcaster.is_empty());
    }
}
