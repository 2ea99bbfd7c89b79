//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    domain::{GameError, JoinCode, UserId},
    infrastructure::dto::http::{
        CreateRoomRequest, CreateRoomResponse, ErrorResponse, JoinRoomRequest, JoinRoomResponse,
        RoomSummaryDto,
    },
    ui::state::AppState,
};

type ErrorReply = (StatusCode, Json<ErrorResponse>);

/// GameError を HTTP ステータスコードへ対応付ける
fn status_for(error: &GameError) -> StatusCode {
    match error {
        GameError::RoomNotFound | GameError::UserNotFound => StatusCode::NOT_FOUND,
        GameError::AlreadyJoined
        | GameError::RoomFull
        | GameError::InvalidState
        | GameError::AlreadyAnswered
        | GameError::PlayerNotInRoom
        | GameError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        GameError::NotAuthorized => StatusCode::FORBIDDEN,
        GameError::NoQuestionsAvailable | GameError::Store(_) | GameError::Port(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_reply(error: GameError) -> ErrorReply {
    (
        status_for(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create a new room (`POST /api/rooms`)
///
/// 作成者は最初のプレイヤー（オーナー）としてルームに登録される。
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ErrorReply> {
    let user_id = UserId::new(request.user_id).map_err(error_reply)?;
    let category_ids = request.category_ids.unwrap_or_default();
    let created = state
        .room_service
        .create_room(&user_id, request.count_questions.unwrap_or(0), &category_ids)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::CREATED, Json(CreateRoomResponse::from(created))))
}

/// Join an existing room by join code (`POST /api/rooms/join`)
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, ErrorReply> {
    let user_id = UserId::new(request.user_id).map_err(error_reply)?;
    let code = JoinCode::new(request.code).map_err(error_reply)?;
    let room_id = state
        .room_service
        .join_by_code(&user_id, &code)
        .await
        .map_err(error_reply)?;

    Ok(Json(JoinRoomResponse {
        room_id: room_id.into_string(),
    }))
}

/// List rooms that are still waiting for players (`GET /api/rooms`)
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, ErrorReply> {
    let rooms = state
        .room_service
        .list_open_rooms()
        .await
        .map_err(error_reply)?;

    Ok(Json(rooms.into_iter().map(RoomSummaryDto::from).collect()))
}
