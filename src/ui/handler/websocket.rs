//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, GameError, RoomId, UserId},
    infrastructure::dto::ws::{AnswerData, EventEnvelope, RoomTargetData},
    ui::state::AppState,
    usecase::events,
};

use serde::Deserialize;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id_str = query.user_id;

    // Convert String -> UserId (Domain Model)
    let user_id = match UserId::new(user_id_str.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid user_id format: '{}'", user_id_str);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // 接続時点でユーザーディレクトリで解決できることを要求する
    match state.users.get_user(&user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::warn!("Unknown user '{}' attempted to connect", user_id_str);
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            tracing::error!("Failed to resolve user '{}': {}", user_id_str, e);
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    let connection_id = match ConnectionIdFactory::generate() {
        Ok(id) => id,
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    // Create a channel for this connection to receive pushed events
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .pusher
        .register_connection(connection_id.clone(), tx)
        .await;

    tracing::info!(
        "User '{}' connected (connection: {})",
        user_id_str,
        connection_id.as_str()
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id, connection_id, rx)))
}

/// Spawns a task that receives events from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound event flow: events produced by the game session
/// (via rx channel) are sent to this client's WebSocket connection.
///
/// # Arguments
///
/// * `rx` - Channel receiver for events addressed to this connection
/// * `sender` - WebSocket sink to send events to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            // Send the event to this client
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    user_id: UserId,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let user_id_clone = user_id.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(
                        "WebSocket error on connection '{}': {}",
                        connection_id_clone.as_str(),
                        e
                    );
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_frame(&state_clone, &connection_id_clone, &user_id_clone, &text).await;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Connection '{}' requested close",
                        connection_id_clone.as_str()
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to receive game events and send to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    disconnect(&state, &connection_id).await;
}

/// 受信フレームを 1 件処理する
///
/// 不正なフレームやユースケースのエラーは送信元の接続にだけ `error` イベントで
/// 返し、ルームの他の参加者には影響させない。
async fn handle_frame(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    user_id: &UserId,
    text: &str,
) {
    let envelope = match serde_json::from_str::<EventEnvelope>(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(
                "Failed to parse frame from connection '{}': {}",
                connection_id.as_str(),
                e
            );
            push_error(
                state,
                connection_id,
                "invalid frame: expected {\"event\", \"data\"}".to_string(),
            )
            .await;
            return;
        }
    };

    tracing::debug!(
        "Received '{}' from connection '{}'",
        envelope.event,
        connection_id.as_str()
    );

    if let Err(e) = dispatch_event(state, connection_id, user_id, envelope).await {
        push_error(state, connection_id, e.to_string()).await;
    }
}

/// イベント名でユースケース呼び出しへ振り分ける
async fn dispatch_event(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    user_id: &UserId,
    envelope: EventEnvelope,
) -> Result<(), GameError> {
    match envelope.event.as_str() {
        events::JOIN_ROOM => {
            let room_id = room_target(envelope.data)?;
            state
                .coordinator
                .attach_connection(connection_id, user_id, &room_id)
                .await?;
            state
                .presence
                .bind(connection_id.clone(), user_id.clone(), room_id)
                .await;
            Ok(())
        }
        events::LEAVE_ROOM => {
            let room_id = room_target(envelope.data)?;
            state.coordinator.leave_room(user_id, &room_id).await?;
            state.pusher.leave_channel(&room_id, connection_id).await;
            state.presence.unbind(connection_id).await;
            Ok(())
        }
        events::START_QUIZ => {
            let room_id = room_target(envelope.data)?;
            state.coordinator.start_quiz(user_id, &room_id).await
        }
        events::ANSWER => {
            let data: AnswerData = parse_data(envelope.data)?;
            let room_id = RoomId::new(data.room_id)?;
            // 締切超過（LateRejected）はプロトコル上のエラーにはしない
            state
                .coordinator
                .submit_answer(user_id, &room_id, data.answer)
                .await?;
            Ok(())
        }
        events::ROOM_STATUS => {
            let room_id = room_target(envelope.data)?;
            state.coordinator.broadcast_room_status(&room_id).await
        }
        events::SHOW_RESULT => {
            let room_id = room_target(envelope.data)?;
            state.coordinator.broadcast_result(&room_id).await
        }
        events::UPDATE_LEADERBOARD => {
            let room_id = room_target(envelope.data)?;
            state.coordinator.broadcast_leaderboard(&room_id).await
        }
        other => Err(GameError::InvalidInput(format!("unknown event '{other}'"))),
    }
}

/// data 部からルーム ID を取り出す
fn room_target(data: serde_json::Value) -> Result<RoomId, GameError> {
    let target: RoomTargetData = parse_data(data)?;
    RoomId::new(target.room_id)
}

fn parse_data<T: serde::de::DeserializeOwned>(data: serde_json::Value) -> Result<T, GameError> {
    serde_json::from_value(data).map_err(|e| GameError::InvalidInput(e.to_string()))
}

/// エラーイベントを送信元の接続にだけ返す
async fn push_error(state: &AppState, connection_id: &ConnectionId, message: String) {
    if let Err(e) = state
        .pusher
        .send_to(
            connection_id,
            events::ERROR,
            serde_json::json!({ "message": message }),
        )
        .await
    {
        tracing::debug!(
            "Failed to push error to connection '{}': {}",
            connection_id.as_str(),
            e
        );
    }
}

/// 切断処理
///
/// PresenceRegistry から接続に紐づくルームを復元し、明示的な `leave_room` と
/// 同じ退室処理を行う。先に明示的な退室やルーム解体が済んでいた場合は何もしない。
async fn disconnect(state: &Arc<AppState>, connection_id: &ConnectionId) {
    state.pusher.unregister_connection(connection_id).await;

    let Some(binding) = state.presence.lookup(connection_id).await else {
        tracing::info!(
            "Connection '{}' disconnected (not in a room)",
            connection_id.as_str()
        );
        return;
    };
    state.presence.unbind(connection_id).await;

    match state
        .coordinator
        .leave_room(&binding.user_id, &binding.room_id)
        .await
    {
        Ok(_) => {
            tracing::info!(
                "Connection '{}' disconnected, user '{}' left room '{}'",
                connection_id.as_str(),
                binding.user_id.as_str(),
                binding.room_id.as_str()
            );
        }
        Err(GameError::RoomNotFound) | Err(GameError::PlayerNotInRoom) => {
            tracing::debug!(
                "Connection '{}' disconnected, room '{}' already gone",
                connection_id.as_str(),
                binding.room_id.as_str()
            );
        }
        Err(e) => {
            tracing::warn!(
                "Failed to remove disconnected user '{}' from room '{}': {}",
                binding.user_id.as_str(),
                binding.room_id.as_str(),
                e
            );
        }
    }
}
