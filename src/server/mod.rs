// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The live WebSocket transport.
//!
//! Each connection gets the full snapshot as an `init` message, then both
//! sides exchange `patch` messages carrying structural diffs. Diffs a
//! client sent itself are not echoed back to it.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::format::live::{LiveSnapshot, StoreDiff};
use crate::sync::SyncEngine;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A structural diff produced by the client's local edit.
    Patch { diff: StoreDiff },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full snapshot, sent once on connect.
    Init { snapshot: LiveSnapshot },
    /// A change that originated elsewhere (another client or a file).
    Patch { diff: StoreDiff },
    Error { message: String },
}

pub fn router(engine: Arc<SyncEngine>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/sync", get(ws_handler))
        .route("/health", get(health))
        .with_state(engine)
}

async fn index() -> &'static str {
    "Triptych sync server - connect via WebSocket at /sync"
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(engine): State<Arc<SyncEngine>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, engine))
}

async fn handle_socket(socket: WebSocket, engine: Arc<SyncEngine>) {
    let client_id = Uuid::new_v4();
    info!(%client_id, "client connected");

    // Subscribe before snapshotting so nothing falls between.
    let mut events = engine.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let init = ServerMessage::Init {
        snapshot: engine.snapshot(),
    };
    let Some(init) = encode(&init) else { return };
    if sender.send(Message::Text(init.into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Patch { diff }) => {
                                if let Err(err) = engine.apply_live_patch(Some(client_id), &diff) {
                                    warn!(%client_id, error = %err, "error applying diff");
                                    let reply = ServerMessage::Error {
                                        message: err.to_string(),
                                    };
                                    if let Some(reply) = encode(&reply) {
                                        let _ = sender.send(Message::Text(reply.into())).await;
                                    }
                                }
                            }
                            Err(err) => {
                                warn!(%client_id, error = %err, "invalid message");
                                let reply = ServerMessage::Error {
                                    message: format!("invalid message: {err}"),
                                };
                                if let Some(reply) = encode(&reply) {
                                    let _ = sender.send(Message::Text(reply.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(%client_id, error = %err, "websocket error");
                        break;
                    }
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if event.origin == Some(client_id) {
                            continue;
                        }
                        let msg = ServerMessage::Patch { diff: event.diff };
                        let Some(msg) = encode(&msg) else { continue };
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        // Too far behind for incremental patches; start over.
                        warn!(%client_id, skipped, "client lagged, resending snapshot");
                        let msg = ServerMessage::Init {
                            snapshot: engine.snapshot(),
                        };
                        let Some(msg) = encode(&msg) else { continue };
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!(%client_id, "client disconnected");
}

fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(err) => {
            warn!(error = %err, "cannot encode server message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientMessage, ServerMessage};
    use crate::format::live::{LiveSnapshot, StoreDiff};

    #[test]
    fn client_patch_wire_shape() {
        let raw = r#"{"type":"patch","diff":{"added":{},"removed":{},"updated":{}}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).expect("parse client message");
        let ClientMessage::Patch { diff } = msg;
        assert!(diff.is_empty());
    }

    #[test]
    fn server_messages_carry_their_tag() {
        let init = ServerMessage::Init {
            snapshot: LiveSnapshot::default(),
        };
        let json = serde_json::to_value(&init).expect("serialize");
        assert_eq!(json["type"], "init");
        assert!(json["snapshot"]["store"].is_object());

        let patch = ServerMessage::Patch {
            diff: StoreDiff::default(),
        };
        let json = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(json["type"], "patch");

        let error = ServerMessage::Error {
            message: "nope".to_owned(),
        };
        let json = serde_json::to_value(&error).expect("serialize");
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "nope");
    }
}
