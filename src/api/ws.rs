// WebSocket handler: bidirectional game transport. Client commands are
// parsed and handed to the simulation thread; broadcast snapshots and the
// connection's one-shot direct events (`player_joined`) are forwarded back.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::engine::intake::{Command, InboundCommand};

use super::AppState;

static NEXT_CONN_ID: AtomicU32 = AtomicU32::new(1);

/// Client → server envelope: an event name plus its JSON payload.
#[derive(Deserialize)]
struct ClientEnvelope {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct NamePayload {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct MovePayload {
    x: f64,
    y: f64,
}

pub async fn ws_game(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    let mut broadcast_rx = state.game_server.subscribe();
    let mut direct_rx = state.game_server.register_connection(conn_id);

    loop {
        tokio::select! {
            // The joining client's one-shot `player_joined` event.
            msg = direct_rx.recv() => {
                match msg {
                    Some(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            // Per-tick broadcast snapshot, shared by every connected client.
            result = broadcast_rx.recv() => {
                match result {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(conn_id, skipped = n, "client lagged, snapshots dropped");
                    }
                }
            }
            // Inbound client message.
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(command) = parse_command(&text) {
                            state.game_server.submit(InboundCommand { conn_id, command });
                        } else {
                            tracing::debug!(conn_id, "dropped malformed client message");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::warn!(conn_id, %err, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    state.game_server.disconnect(conn_id);
}

/// Parse a client JSON envelope into a validated `Command`. Unrecognized
/// events and malformed payloads both yield `None`; the caller drops them.
fn parse_command(text: &str) -> Option<Command> {
    let envelope: ClientEnvelope = serde_json::from_str(text).ok()?;
    match envelope.event.as_str() {
        "join_game" => {
            let payload: NamePayload = serde_json::from_value(envelope.payload).ok()?;
            Some(Command::Join { name: payload.name })
        }
        "respawn" => {
            let payload: NamePayload = serde_json::from_value(envelope.payload).ok()?;
            Some(Command::Respawn { name: payload.name })
        }
        "player_move" => {
            let payload: MovePayload = serde_json::from_value(envelope.payload).ok()?;
            Some(Command::Move { x: payload.x, y: payload.y })
        }
        "player_boost" => Some(Command::Boost),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_game() {
        let cmd = parse_command(r#"{"event":"join_game","payload":{"name":"Ann"}}"#).unwrap();
        assert_eq!(cmd, Command::Join { name: "Ann".to_string() });
    }

    #[test]
    fn test_parse_player_move() {
        let cmd = parse_command(r#"{"event":"player_move","payload":{"x":1.5,"y":2.5}}"#).unwrap();
        assert_eq!(cmd, Command::Move { x: 1.5, y: 2.5 });
    }

    #[test]
    fn test_parse_player_boost() {
        let cmd = parse_command(r#"{"event":"player_boost","payload":{}}"#).unwrap();
        assert_eq!(cmd, Command::Boost);
    }

    #[test]
    fn test_parse_unknown_event_rejected() {
        assert!(parse_command(r#"{"event":"bogus","payload":{}}"#).is_none());
    }

    #[test]
    fn test_parse_malformed_json_rejected() {
        assert!(parse_command("not json").is_none());
    }

    #[test]
    fn test_parse_move_missing_fields_rejected() {
        assert!(parse_command(r#"{"event":"player_move","payload":{"x":1.0}}"#).is_none());
    }
}
