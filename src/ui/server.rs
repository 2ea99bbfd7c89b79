//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    domain::{EventPusher, PresenceRegistry, UserDirectory},
    usecase::{RoomService, SessionCoordinator},
};

use super::{
    handler::{create_room, health_check, join_room, list_rooms, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Quiz room server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(coordinator, room_service, users, presence, pusher);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// SessionCoordinator（ゲーム進行のユースケース）
    coordinator: Arc<SessionCoordinator>,
    /// RoomService（ルーム作成・参加のユースケース）
    room_service: Arc<RoomService>,
    /// UserDirectory（ユーザー解決ポート）
    users: Arc<dyn UserDirectory>,
    /// PresenceRegistry（接続とルームの対応表）
    presence: Arc<dyn PresenceRegistry>,
    /// EventPusher（ルーム単位のイベント配信）
    pusher: Arc<dyn EventPusher>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `coordinator` - UseCase for in-game session flow
    /// * `room_service` - UseCase for room creation and joining
    /// * `users` - Port for resolving user profiles
    /// * `presence` - Registry mapping connections to rooms
    /// * `pusher` - Gateway for pushing events to connections
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        room_service: Arc<RoomService>,
        users: Arc<dyn UserDirectory>,
        presence: Arc<dyn PresenceRegistry>,
        pusher: Arc<dyn EventPusher>,
    ) -> Self {
        Self {
            coordinator,
            room_service,
            users,
            presence,
            pusher,
        }
    }

    /// Run the quiz room server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(
        self,
        host: String,
        port: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);

        self.serve(listener).await
    }

    /// Run the server on an already-bound listener
    ///
    /// ポート 0 でバインドして実際のアドレスを先に知りたい場合はこちらを使う。
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let app_state = Arc::new(AppState {
            coordinator: self.coordinator,
            room_service: self.room_service,
            users: self.users,
            presence: self.presence,
            pusher: self.pusher,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(list_rooms).post(create_room))
            .route("/api/rooms/join", post(join_room))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // Start the server
        tracing::info!("Quiz room server listening on {}", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
