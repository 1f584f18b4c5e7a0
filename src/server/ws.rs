use crate::perf::leaderboard;
use crate::state::{AppState, WsMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let mut updates = state.ws_tx.subscribe();

    // New clients get the full snapshot plus a fresh leaderboard before
    // the incremental stream starts.
    let snapshot = state.snapshot_rx.borrow().clone();
    let board = WsMessage::Leaderboard {
        entries: leaderboard::compute_leaderboard(&snapshot.bots),
    };
    for initial in [serde_json::to_string(&snapshot), serde_json::to_string(&board)] {
        let Ok(json) = initial else { continue };
        if sink.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    // Forward broadcasts until the client goes away. Incoming client
    // messages are ignored; the surface is read-only.
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Ok(msg) = update else { break };
                let Ok(json) = serde_json::to_string(&msg) else { continue };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
}
