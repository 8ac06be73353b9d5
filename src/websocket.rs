//! The two subscriber-only sockets `spec.md` §6 exposes: a per-room stream
//! of `init`/`update` frames, and an index-wide `queue_update` ping.
//! Grounded in the teacher's `websocket::handler`/`connection` split, but
//! collapsed to a single file — there is no client-to-server game traffic
//! to parse, no message batching, and no token-binding handshake, so the
//! teacher's read/write loop is cut down to "forward the fanout until the
//! socket closes."

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::SinkExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::protocol::{ErrorBody, RoomServerMessage};
use crate::router::Router;

#[derive(Debug, Deserialize)]
struct RoomSocketQuery {
    #[serde(rename = "playerId")]
    player_id: Option<String>,
}

async fn room_socket(
    State(router): State<Arc<Router>>,
    Path(room_id): Path<String>,
    Query(query): Query<RoomSocketQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(room) = router.get_room(&room_id) else {
        return (StatusCode::NOT_FOUND, "room not found").into_response();
    };
    ws.on_upgrade(move |socket| handle_room_socket(socket, room, query.player_id))
}

async fn handle_room_socket(
    mut socket: WebSocket,
    room: crate::router::SharedRoom,
    player_id: Option<String>,
) {
    let (sub_id, mut rx, initial) = match room.subscribe(player_id.as_deref()).await {
        Ok(v) => v,
        Err(e) => {
            let _ = send_json(&mut socket, &ErrorBody::from(e)).await;
            let _ = socket.close().await;
            return;
        }
    };

    if send_json(&mut socket, &RoomServerMessage::Init { room: initial })
        .await
        .is_err()
    {
        room.unsubscribe(sub_id).await;
        return;
    }

    loop {
        tokio::select! {
            update = rx.recv() => {
                match update {
                    Some(frame) => {
                        if send_json(&mut socket, frame.as_ref()).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(error = %e, "room socket read error");
                        break;
                    }
                }
            }
        }
    }

    room.unsubscribe(sub_id).await;
}

async fn queue_socket(State(router): State<Arc<Router>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_queue_socket(socket, router))
}

async fn handle_queue_socket(mut socket: WebSocket, router: Arc<Router>) {
    let (sub_id, mut rx) = router.index.subscribe().await;

    loop {
        tokio::select! {
            update = rx.recv() => {
                match update {
                    Some(frame) => {
                        if send_json(&mut socket, frame.as_ref()).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(error = %e, "queue socket read error");
                        break;
                    }
                }
            }
        }
    }

    router.index.unsubscribe(sub_id).await;
}

async fn send_json<T: Serialize>(
    socket: &mut WebSocket,
    frame: &T,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text.into())).await
}

pub fn routes() -> axum::Router<Arc<Router>> {
    axum::Router::new()
        .route("/rooms/{id}/ws", get(room_socket))
        .route("/queue/ws", get(queue_socket))
}
