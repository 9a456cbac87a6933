//! World task: connection management and the authoritative tick loop
//!
//! A single task owns the [`WorldState`]. Connections talk to it only through
//! [`WorldHandle`], so commands and ticks never interleave.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::time::{Clock, SystemClock, TICK_DURATION_MICROS};
use crate::ws::protocol::{ClientMsg, PlayerView, ServerMsg};

use super::broadcast::Broadcaster;
use super::snapshot::build_snapshot;
use super::state::WorldState;
use super::validator::Rejection;
use super::{Outbound, WorldInput};

/// The world task has stopped
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("World task is not running")]
pub struct WorldClosed;

/// Cloneable handle used by connections to reach the world task
#[derive(Clone)]
pub struct WorldHandle {
    input_tx: mpsc::UnboundedSender<WorldInput>,
    player_count: Arc<AtomicUsize>,
    tick: Arc<AtomicU64>,
}

impl WorldHandle {
    /// Open a client link for `player_id` and return its event stream
    pub fn connect(
        &self,
        player_id: Uuid,
        name: String,
    ) -> Result<mpsc::UnboundedReceiver<ServerMsg>, WorldClosed> {
        let (outbound, rx) = mpsc::unbounded_channel();
        self.input_tx
            .send(WorldInput::Connect {
                player_id,
                name,
                outbound,
            })
            .map_err(|_| WorldClosed)?;
        Ok(rx)
    }

    pub fn command(&self, player_id: Uuid, msg: ClientMsg) -> Result<(), WorldClosed> {
        self.input_tx
            .send(WorldInput::Command { player_id, msg })
            .map_err(|_| WorldClosed)
    }

    pub fn disconnect(&self, player_id: Uuid) -> Result<(), WorldClosed> {
        self.input_tx
            .send(WorldInput::Disconnect { player_id })
            .map_err(|_| WorldClosed)
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }
}

/// The authoritative game server
pub struct GameServer<C: Clock = SystemClock> {
    state: WorldState,
    broadcaster: Broadcaster,
    input_rx: mpsc::UnboundedReceiver<WorldInput>,
    clock: C,
    last_tick_ms: u64,
    player_count: Arc<AtomicUsize>,
    tick: Arc<AtomicU64>,
}

impl GameServer<SystemClock> {
    pub fn new(state: WorldState) -> (Self, WorldHandle) {
        Self::with_clock(state, SystemClock)
    }
}

impl<C: Clock> GameServer<C> {
    pub fn with_clock(state: WorldState, clock: C) -> (Self, WorldHandle) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let player_count = Arc::new(AtomicUsize::new(0));
        let tick = Arc::new(AtomicU64::new(0));

        let handle = WorldHandle {
            input_tx,
            player_count: player_count.clone(),
            tick: tick.clone(),
        };

        let last_tick_ms = clock.now_millis();
        let server = Self {
            state,
            broadcaster: Broadcaster::new(),
            input_rx,
            clock,
            last_tick_ms,
            player_count,
            tick,
        };

        (server, handle)
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        info!(
            walls = self.state.map.walls.len(),
            spawn_points = self.state.map.spawn_points.len(),
            "World simulation started"
        );

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.last_tick_ms = self.clock.now_millis();

        loop {
            tokio::select! {
                _ = tick_interval.tick() => self.run_tick(),
                input = self.input_rx.recv() => match input {
                    Some(input) => self.handle_input(input),
                    None => break,
                },
            }
        }

        info!(tick = self.state.tick, "World simulation stopped");
    }

    /// Advance by the real time elapsed since the previous tick
    fn run_tick(&mut self) {
        let now_ms = self.clock.now_millis();
        let prev_ms = self.last_tick_ms;
        let dt = now_ms.saturating_sub(prev_ms) as f32 / 1000.0;
        self.last_tick_ms = now_ms;

        let events = self.state.tick(dt, prev_ms, now_ms);
        self.broadcaster.deliver_all(events);
        self.tick.store(self.state.tick, Ordering::Relaxed);
    }

    fn handle_input(&mut self, input: WorldInput) {
        match input {
            WorldInput::Connect {
                player_id,
                name,
                outbound,
            } => self.handle_connect(player_id, name, outbound),
            // A rejection drops only this command; the loop keeps ticking
            WorldInput::Command { player_id, msg } => match self.dispatch(player_id, msg) {
                Ok(events) => self.broadcaster.deliver_all(events),
                Err(rejection) => {
                    debug!(player_id = %player_id, reason = %rejection, "Dropped command");
                }
            },
            WorldInput::Disconnect { player_id } => self.handle_disconnect(player_id),
        }
    }

    /// Route one command to its handler
    fn dispatch(&mut self, player_id: Uuid, msg: ClientMsg) -> Result<Vec<Outbound>, Rejection> {
        match msg {
            ClientMsg::Move(cmd) => self.state.handle_move(player_id, cmd),
            ClientMsg::Shoot(cmd) => self.state.handle_shoot(player_id, cmd),
            ClientMsg::Molotov(cmd) => self.state.handle_molotov(player_id, cmd),
            ClientMsg::ToggleFlashlight(on) => self.state.handle_flashlight(player_id, on),
            ClientMsg::TakeDamage(cmd) => self.state.handle_take_damage(player_id, cmd),
            ClientMsg::Respawn => self.state.handle_respawn(player_id),
            ClientMsg::Chat(message) => self.state.handle_chat(player_id, &message),
            ClientMsg::Ping { t } => Ok(vec![Outbound::only(player_id, ServerMsg::Pong { t })]),
            ClientMsg::Disconnect => {
                self.handle_disconnect(player_id);
                Ok(Vec::new())
            }
        }
    }

    fn handle_connect(
        &mut self,
        player_id: Uuid,
        name: String,
        outbound: mpsc::UnboundedSender<ServerMsg>,
    ) {
        if self.state.players.contains_key(&player_id) {
            debug!(player_id = %player_id, "Player already connected");
            return;
        }

        self.broadcaster.register(player_id, outbound);
        let player = PlayerView::from(self.state.add_player(player_id, name));
        let snapshot = build_snapshot(&self.state, player_id);

        self.broadcaster.deliver_all([
            Outbound::only(player_id, ServerMsg::Init(snapshot)),
            Outbound::all_except(player_id, ServerMsg::PlayerJoined { player }),
        ]);
        self.player_count
            .store(self.state.players.len(), Ordering::Relaxed);

        info!(
            player_id = %player_id,
            player_count = self.state.players.len(),
            connections = self.broadcaster.len(),
            "Player joined"
        );
    }

    fn handle_disconnect(&mut self, player_id: Uuid) {
        self.broadcaster.unregister(player_id);
        if self.state.remove_player(player_id).is_none() {
            return;
        }

        self.broadcaster
            .deliver(Outbound::all(ServerMsg::PlayerLeft { player_id }));
        self.player_count
            .store(self.state.players.len(), Ordering::Relaxed);

        info!(
            player_id = %player_id,
            player_count = self.state.players.len(),
            alive = self.state.alive_count(),
            "Player left"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::tests::test_world;
    use crate::util::time::ManualClock;
    use crate::ws::protocol::{MoveCmd, TakeDamageCmd};

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn join(
        server: &mut GameServer<ManualClock>,
        name: &str,
    ) -> (Uuid, mpsc::UnboundedReceiver<ServerMsg>) {
        let id = Uuid::new_v4();
        let (outbound, rx) = mpsc::unbounded_channel();
        server.handle_input(WorldInput::Connect {
            player_id: id,
            name: name.to_string(),
            outbound,
        });
        (id, rx)
    }

    #[test]
    fn connect_sends_snapshot_then_announces() {
        let (mut server, handle) = GameServer::with_clock(test_world(), ManualClock::new(0));
        let (a, mut rx_a) = join(&mut server, "alice");
        let (b, mut rx_b) = join(&mut server, "bob");

        let to_a = drain(&mut rx_a);
        assert!(matches!(&to_a[0], ServerMsg::Init(s) if s.self_id == a && s.players.len() == 1));
        assert!(matches!(&to_a[1], ServerMsg::PlayerJoined { player } if player.id == b));
        assert_eq!(to_a.len(), 2);

        let to_b = drain(&mut rx_b);
        assert_eq!(to_b.len(), 1);
        assert!(matches!(&to_b[0], ServerMsg::Init(s) if s.players.len() == 2));
        assert_eq!(handle.player_count(), 2);
    }

    #[test]
    fn disconnect_removes_player_once() {
        let (mut server, handle) = GameServer::with_clock(test_world(), ManualClock::new(0));
        let (a, _rx_a) = join(&mut server, "alice");
        let (_b, mut rx_b) = join(&mut server, "bob");
        drain(&mut rx_b);

        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::Disconnect,
        });
        server.handle_input(WorldInput::Disconnect { player_id: a });

        assert_eq!(drain(&mut rx_b), vec![ServerMsg::PlayerLeft { player_id: a }]);
        assert!(!server.state.players.contains_key(&a));
        assert_eq!(handle.player_count(), 1);
    }

    #[test]
    fn rejected_moves_are_silent() {
        let (mut server, _handle) = GameServer::with_clock(test_world(), ManualClock::new(0));
        let (a, mut rx_a) = join(&mut server, "alice");
        let (_b, mut rx_b) = join(&mut server, "bob");
        drain(&mut rx_a);
        drain(&mut rx_b);

        let start = server.state.players[&a].clone();
        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::Move(MoveCmd {
                x: start.x + 10.0,
                z: start.z,
                angle: 1.0,
            }),
        });

        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(server.state.players[&a].x, start.x);

        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::Move(MoveCmd {
                x: start.x + 1.0,
                z: start.z,
                angle: 1.0,
            }),
        });
        assert!(drain(&mut rx_a).is_empty());
        assert!(matches!(
            drain(&mut rx_b).as_slice(),
            [ServerMsg::PlayerMoved { player_id, .. }] if *player_id == a
        ));
    }

    #[test]
    fn ticks_use_clock_delta_and_broadcast_ring_each_second() {
        let clock = ManualClock::new(10_000);
        let (mut server, handle) = GameServer::with_clock(test_world(), clock.clone());
        let (a, mut rx_a) = join(&mut server, "alice");
        drain(&mut rx_a);

        // Park the player outside the ring
        server.state.players.get_mut(&a).unwrap().x = 95.0;
        server.state.players.get_mut(&a).unwrap().z = 0.0;

        clock.advance(400);
        server.run_tick();
        assert!((server.state.players[&a].health - 98.0).abs() < 1e-4);
        assert!(matches!(
            drain(&mut rx_a).as_slice(),
            [ServerMsg::RingDamage { .. }]
        ));

        clock.advance(700);
        server.run_tick();
        let events = drain(&mut rx_a);
        assert!(events.iter().any(|m| matches!(m, ServerMsg::RingUpdate(_))));
        assert_eq!(handle.tick(), 2);
    }

    #[test]
    fn bad_commands_between_ticks_do_not_stop_simulation() {
        let clock = ManualClock::new(0);
        let (mut server, handle) = GameServer::with_clock(test_world(), clock.clone());
        let (a, mut rx_a) = join(&mut server, "alice");
        drain(&mut rx_a);

        clock.advance(16);
        server.run_tick();

        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::TakeDamage(TakeDamageCmd {
                amount: f32::NAN,
                from_player_id: None,
            }),
        });
        server.handle_input(WorldInput::Command {
            player_id: Uuid::new_v4(),
            msg: ClientMsg::Respawn,
        });

        clock.advance(16);
        server.run_tick();

        assert_eq!(handle.tick(), 2);
        assert_eq!(server.state.players[&a].health, 100.0);

        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::Ping { t: 5 },
        });
        assert_eq!(drain(&mut rx_a), vec![ServerMsg::Pong { t: 5 }]);
    }

    #[test]
    fn dead_player_respawns_after_lethal_damage() {
        let (mut server, _handle) = GameServer::with_clock(test_world(), ManualClock::new(0));
        let (a, mut rx_a) = join(&mut server, "alice");
        drain(&mut rx_a);

        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::TakeDamage(TakeDamageCmd {
                amount: 150.0,
                from_player_id: None,
            }),
        });
        let events = drain(&mut rx_a);
        assert_eq!(
            events
                .iter()
                .filter(|m| matches!(m, ServerMsg::PlayerDied { .. }))
                .count(),
            1
        );

        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::Respawn,
        });
        assert!(matches!(
            drain(&mut rx_a).as_slice(),
            [ServerMsg::PlayerRespawned { player }] if player.health == 100.0
        ));
    }

    #[test]
    fn ping_is_answered_to_sender_only() {
        let (mut server, _handle) = GameServer::with_clock(test_world(), ManualClock::new(0));
        let (a, mut rx_a) = join(&mut server, "alice");
        let (_b, mut rx_b) = join(&mut server, "bob");
        drain(&mut rx_a);
        drain(&mut rx_b);

        server.handle_input(WorldInput::Command {
            player_id: a,
            msg: ClientMsg::Ping { t: 77 },
        });

        assert_eq!(drain(&mut rx_a), vec![ServerMsg::Pong { t: 77 }]);
        assert!(drain(&mut rx_b).is_empty());
    }

    #[test]
    fn run_loop_serves_handles_until_dropped() {
        let (server, handle) = GameServer::with_clock(test_world(), ManualClock::new(0));
        let id = Uuid::new_v4();
        let mut rx = handle.connect(id, "carol".to_string()).unwrap();
        handle
            .command(id, ClientMsg::ToggleFlashlight(true))
            .unwrap();
        drop(handle);

        tokio_test::block_on(server.run());

        let events = drain(&mut rx);
        assert!(matches!(&events[0], ServerMsg::Init(s) if s.self_id == id));
        // Flashlight toggles are not echoed to the sender
        assert_eq!(events.len(), 1);
    }
}
