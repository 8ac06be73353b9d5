//! HTTP route handlers, one per `spec.md` §6 entry. Grounded in the
//! teacher's `websocket::routes::create_router` pattern (state-typed axum
//! `Router`, handlers returning `IntoResponse` types) but built around this
//! crate's `ApiResult`/`ApiError` envelope instead of the teacher's raw
//! `ServerMessage` frames, since here the bulk of the surface is plain
//! request/response JSON rather than a socket protocol.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::index::QueueEstimate;
use crate::protocol::response::Ok as ApiOk;
use crate::protocol::{ApiError, ApiResult, Color, Room, RoomError};
use crate::router::{CreateRoomParams, JoinQueueOutcome, Router};

/// Bare `{ok: true}` acknowledgement for actions with nothing else to
/// report.
#[derive(Debug, Serialize)]
struct Ack {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomBody {
    room_id: Option<String>,
    #[allow(dead_code)]
    max_players: Option<usize>,
    bid_duration_ms: Option<i64>,
    choice_duration_ms: Option<i64>,
    main_time_ms: Option<i64>,
    private: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomResponse {
    room_id: String,
    meta: Room,
}

async fn create_room(
    State(router): State<Arc<Router>>,
    Json(body): Json<CreateRoomBody>,
) -> ApiResult<CreateRoomResponse> {
    let room = router
        .create_room(CreateRoomParams {
            room_id: body.room_id,
            private: body.private.unwrap_or(false),
            main_time_ms: body.main_time_ms,
            bid_duration_ms: body.bid_duration_ms,
            choice_duration_ms: body.choice_duration_ms,
            creator: None,
        })
        .await?;
    Ok(ApiOk(CreateRoomResponse {
        room_id: room.room_id.clone(),
        meta: room,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinNextBody {
    player_id: String,
    name: Option<String>,
    main_time_ms: Option<i64>,
}

async fn join_next(
    State(router): State<Arc<Router>>,
    Json(body): Json<JoinNextBody>,
) -> ApiResult<Room> {
    if body.player_id.is_empty() {
        return Err(RoomError::PlayerIdRequired.into());
    }
    let name = body.name.unwrap_or_default();
    let room = router
        .join_next(body.player_id, name, body.main_time_ms)
        .await?;
    Ok(ApiOk(room))
}

#[derive(Debug, Serialize)]
struct AvailableCountResponse {
    count: usize,
}

async fn available_count(State(router): State<Arc<Router>>) -> ApiResult<AvailableCountResponse> {
    let count = router.available_count().await;
    Ok(ApiOk(AvailableCountResponse { count }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerIdBody {
    player_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueJoinBody {
    player_id: String,
    name: String,
    main_time_ms: i64,
}

#[derive(Debug, Serialize)]
#[serde(untagged, rename_all = "camelCase")]
enum QueueJoinResponse {
    Matched { room_id: String, room: Room },
    Queued { queued: bool, queue_position: usize },
}

async fn queue_join(
    State(router): State<Arc<Router>>,
    Json(body): Json<QueueJoinBody>,
) -> ApiResult<QueueJoinResponse> {
    if body.player_id.is_empty() {
        return Err(RoomError::PlayerIdRequired.into());
    }
    let outcome = router
        .join_queue(body.player_id, body.name, body.main_time_ms)
        .await?;
    let response = match outcome {
        JoinQueueOutcome::Matched(room) => QueueJoinResponse::Matched {
            room_id: room.room_id.clone(),
            room,
        },
        JoinQueueOutcome::Queued { position } => QueueJoinResponse::Queued {
            queued: true,
            queue_position: position,
        },
    };
    Ok(ApiOk(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueJoinAllBody {
    player_id: String,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueJoinAllResponse {
    matched: bool,
    rooms: Vec<Room>,
}

async fn queue_join_all(
    State(router): State<Arc<Router>>,
    Json(body): Json<QueueJoinAllBody>,
) -> ApiResult<QueueJoinAllResponse> {
    if body.player_id.is_empty() {
        return Err(RoomError::PlayerIdRequired.into());
    }
    let rooms = router.join_all_queues(body.player_id, body.name).await?;
    Ok(ApiOk(QueueJoinAllResponse {
        matched: !rooms.is_empty(),
        rooms,
    }))
}

async fn queue_leave(
    State(router): State<Arc<Router>>,
    Json(body): Json<PlayerIdBody>,
) -> ApiResult<Ack> {
    if body.player_id.is_empty() {
        return Err(RoomError::PlayerIdRequired.into());
    }
    router.leave_queue(&body.player_id).await;
    Ok(ApiOk(Ack {}))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckMatchResponse {
    matched: bool,
    room_id: Option<String>,
    in_queue: bool,
}

async fn queue_check_match(
    State(router): State<Arc<Router>>,
    Json(body): Json<PlayerIdBody>,
) -> ApiResult<CheckMatchResponse> {
    if body.player_id.is_empty() {
        return Err(RoomError::PlayerIdRequired.into());
    }
    let outcome = router.check_match(&body.player_id).await;
    Ok(ApiOk(CheckMatchResponse {
        matched: outcome.room.is_some(),
        room_id: outcome.room.map(|r| r.room_id),
        in_queue: outcome.in_queue,
    }))
}

async fn queue_heartbeat(
    State(router): State<Arc<Router>>,
    Json(body): Json<PlayerIdBody>,
) -> ApiResult<Ack> {
    if body.player_id.is_empty() {
        return Err(RoomError::PlayerIdRequired.into());
    }
    router.queue_heartbeat(&body.player_id).await;
    Ok(ApiOk(Ack {}))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueStatusEntryResponse {
    queue_length: usize,
    active_games: usize,
    estimate: QueueEstimate,
}

#[derive(Debug, Serialize)]
struct QueueStatusResponse {
    estimates: HashMap<String, QueueStatusEntryResponse>,
}

async fn queue_status(State(router): State<Arc<Router>>) -> ApiResult<QueueStatusResponse> {
    let estimates = router
        .queue_status()
        .await
        .into_iter()
        .map(|(tc, entry)| {
            (
                tc.to_string(),
                QueueStatusEntryResponse {
                    queue_length: entry.queue_length,
                    active_games: entry.active_games,
                    estimate: entry.estimate,
                },
            )
        })
        .collect();
    Ok(ApiOk(QueueStatusResponse { estimates }))
}

async fn get_room(
    State(router): State<Arc<Router>>,
    Path(room_id): Path<String>,
) -> ApiResult<Room> {
    let room_actor = router.get_room(&room_id).ok_or(RoomError::RoomNotFound)?;
    let room = room_actor.get_state().await?;
    Ok(ApiOk(room))
}

/// Body shape for every `POST /rooms/{id}/{action}` route. Only the fields
/// the dispatched action needs are read; the rest are ignored, matching the
/// "action-specific body" contract loosely rather than one struct per
/// action.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RoomActionBody {
    player_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    color: Option<Color>,
    #[serde(rename = "move", default)]
    mv: Option<String>,
    #[serde(default)]
    agree: Option<bool>,
}

async fn room_action(
    State(router): State<Arc<Router>>,
    Path((room_id, action)): Path<(String, String)>,
    Json(body): Json<RoomActionBody>,
) -> ApiResult<Room> {
    let room_actor = router.get_room(&room_id).ok_or(RoomError::RoomNotFound)?;
    let room = match action.as_str() {
        "join" => {
            room_actor
                .join(&body.player_id, body.name.as_deref().unwrap_or(""))
                .await?
        }
        "start-bidding" => room_actor.start_bidding(&body.player_id).await?,
        "submit-bid" => {
            let Some(amount) = body.amount.filter(|_| !body.player_id.is_empty()) else {
                return Err(ApiError::from(RoomError::PlayerIdAndAmountRequired));
            };
            room_actor.submit_bid(&body.player_id, amount).await?
        }
        "choose-color" => {
            let color = body.color.ok_or(RoomError::InvalidColor)?;
            room_actor.choose_color(&body.player_id, color).await?
        }
        "move" => {
            room_actor
                .make_move(&body.player_id, body.mv.as_deref().unwrap_or(""))
                .await?
        }
        "time-forfeit" => room_actor.claim_time_forfeit(&body.player_id).await?,
        "rematch" => {
            room_actor
                .rematch(&body.player_id, body.agree.unwrap_or(false))
                .await?
        }
        "leave" => room_actor.leave(&body.player_id).await?,
        "heartbeat" => room_actor.heartbeat(&body.player_id).await?,
        _ => return Err(ApiError::from(RoomError::RoomNotFound)),
    };
    Ok(ApiOk(room))
}

/// Route table for everything except the WebSocket upgrade, which
/// `websocket::routes` adds separately.
pub fn routes() -> axum::Router<Arc<Router>> {
    axum::Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/join-next", post(join_next))
        .route("/rooms/available-count", get(available_count))
        .route("/queue/join", post(queue_join))
        .route("/queue/joinAll", post(queue_join_all))
        .route("/queue/leave", post(queue_leave))
        .route("/queue/checkMatch", post(queue_check_match))
        .route("/queue/heartbeat", post(queue_heartbeat))
        .route("/queue/status", get(queue_status))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/{action}", post(room_action))
}
