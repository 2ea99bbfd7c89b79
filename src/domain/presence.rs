//! PresenceRegistry trait 定義
//!
//! WebSocket 接続と (ユーザー, ルーム) の対応を保持するレジストリの
//! インターフェース。切断時に「どのユーザーをどのルームから退室させるか」を
//! 解決するためにのみ使用します。

use async_trait::async_trait;

use super::value_object::{ConnectionId, RoomId, UserId};

/// 接続に紐づくユーザーとルーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceBinding {
    pub user_id: UserId,
    pub room_id: RoomId,
}

/// Presence Registry trait
///
/// 接続 ID → (user_id, room_id) のマッピングのみを責務とする。
/// ルーム状態の変更は行わない（それは SessionCoordinator の責務）。
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// 接続をユーザーとルームに紐づける
    async fn bind(&self, connection_id: ConnectionId, user_id: UserId, room_id: RoomId);

    /// 接続の紐づけを取得（未登録の場合は None）
    async fn lookup(&self, connection_id: &ConnectionId) -> Option<PresenceBinding>;

    /// 接続の紐づけを解除（未登録でも冪等に成功する）
    async fn unbind(&self, connection_id: &ConnectionId);
}
