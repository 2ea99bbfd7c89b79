//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::{EventPusher, PresenceRegistry, UserDirectory};
use crate::usecase::{RoomService, SessionCoordinator};

/// Shared application state
pub struct AppState {
    /// SessionCoordinator（セッション進行のユースケース）
    pub coordinator: Arc<SessionCoordinator>,
    /// RoomService（ルーム作成・参加・一覧のユースケース）
    pub room_service: Arc<RoomService>,
    /// UserDirectory（ユーザー解決の抽象化）
    pub users: Arc<dyn UserDirectory>,
    /// PresenceRegistry（接続とユーザー・ルームの束縛の抽象化）
    pub presence: Arc<dyn PresenceRegistry>,
    /// EventPusher（イベント配信の抽象化）
    pub pusher: Arc<dyn EventPusher>,
}
