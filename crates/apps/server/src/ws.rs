//! WebSocket view streaming.
//!
//! Each connected session receives a hello, then every view update the
//! engine publishes (per tick while playing, and after every refresh).
//! Clients drive playback with small tagged commands.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::view::ViewUpdate;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientCommand {
    Play,
    Pause,
    Rewind,
    Ping { seq: u64 },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Hello {
        session_id: &'a str,
        server_version: &'a str,
        source: &'a str,
    },
    View {
        #[serde(flatten)]
        update: &'a ViewUpdate,
    },
    Pong {
        seq: u64,
    },
    Error {
        message: String,
    },
}

pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let hello = ServerMessage::Hello {
        session_id: &session_id,
        server_version: env!("CARGO_PKG_VERSION"),
        source: &state.summary.source,
    };
    if send_json(&mut ws_tx, &hello).await.is_err() {
        return;
    }
    info!("view session {session_id} connected");

    let mut updates = state.view_tx.subscribe();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    let msg = ServerMessage::View { update: &update };
                    if send_json(&mut ws_tx, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("view session {session_id} lagged, skipped {skipped} updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_command(&state, &text, &mut ws_tx).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("view session {session_id} closed by client");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("view session {session_id} receive error: {e}");
                    break;
                }
            },
        }
    }

    info!("view session {session_id} disconnected");
}

async fn handle_command(
    state: &AppState,
    text: &str,
    ws_tx: &mut SplitSink<WebSocket, Message>,
) {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            let _ = send_json(
                ws_tx,
                &ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    match command {
        ClientCommand::Play => state.engine.write().play(),
        ClientCommand::Pause => state.engine.write().pause(),
        ClientCommand::Rewind => state.engine.write().rewind(),
        ClientCommand::Ping { seq } => {
            let _ = send_json(ws_tx, &ServerMessage::Pong { seq }).await;
        }
    }
}

async fn send_json(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage<'_>,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(msg) {
        Ok(t) => t,
        Err(e) => {
            warn!("failed to serialize message: {e}");
            return Ok(());
        }
    };
    ws_tx.send(Message::Text(text)).await
}
