//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::WorldHandle;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Longest display name kept from the query string
pub const MAX_NAME_LEN: usize = 16;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Requested display name
    pub name: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query.name, state))
}

/// Trimmed, length-limited display name, or a generated one
pub fn display_name(player_id: Uuid, requested: Option<&str>) -> String {
    let cleaned: String = requested
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        format!("Player_{}", &player_id.simple().to_string()[..8])
    } else {
        cleaned
    }
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, requested_name: Option<String>, state: AppState) {
    let player_id = Uuid::new_v4();
    let name = display_name(player_id, requested_name.as_deref());
    info!(player_id = %player_id, name = %name, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    let outbound_rx = match state.world.connect(player_id, name) {
        Ok(rx) => rx,
        Err(e) => {
            error!(player_id = %player_id, error = %e, "Failed to register connection");
            return;
        }
    };

    run_session(player_id, ws_sink, ws_stream, &state.world, outbound_rx).await;

    // No-op if the client already sent an explicit disconnect
    if state.world.disconnect(player_id).is_err() {
        debug!(player_id = %player_id, "World channel closed before disconnect");
    }

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    player_id: Uuid,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    world: &WorldHandle,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerMsg>,
) {
    // Writer task: world events -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Reader loop: WebSocket -> world task
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(client_msg) => {
                    let leaving = matches!(client_msg, ClientMsg::Disconnect);
                    if world.command(player_id, client_msg).is_err() {
                        debug!(player_id = %player_id, "World channel closed");
                        break;
                    }
                    if leaving {
                        info!(player_id = %player_id, "Client requested disconnect");
                        break;
                    }
                }
                Err(e) => {
                    warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received control frame");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Errors while writing to the socket
#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Socket error: {0}")]
    Socket(#[from] axum::Error),
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_names_are_cleaned() {
        let id = Uuid::new_v4();
        assert_eq!(display_name(id, Some("  ghost  ")), "ghost");
        assert_eq!(
            display_name(id, Some("abcdefghijklmnopqrstuvwxyz")),
            "abcdefghijklmnop"
        );
        assert_eq!(display_name(id, Some("a\u{0007}b")), "ab");
    }

    #[test]
    fn blank_names_are_generated() {
        let id = Uuid::new_v4();
        let expected = format!("Player_{}", &id.simple().to_string()[..8]);
        assert_eq!(display_name(id, None), expected);
        assert_eq!(display_name(id, Some("   ")), expected);
    }
}
