//! EventPusher trait 定義
//!
//! ルーム単位のイベント配信（ブロードキャスト）のインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 配信モデル
//!
//! - イベントはイベント名と JSON ペイロードの組
//! - ルーム内の全接続にファンアウトする（配信保証はベストエフォート）
//! - 切断済みの接続への送信失敗はブロードキャスト全体を失敗させない

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::PushError,
    value_object::{ConnectionId, RoomId},
};

/// クライアントへのメッセージ送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Event Pusher trait
///
/// WebSocket 接続の sender を管理し、ルーム単位のイベント配信を行う。
/// 「接続の受付」は UI 層、「sender の管理と配信」は Infrastructure 層の責務。
#[async_trait]
pub trait EventPusher: Send + Sync {
    /// 接続の sender を登録する
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の sender を登録解除する
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 接続をルームの配信チャンネルに参加させる
    async fn join_channel(&self, room_id: &RoomId, connection_id: &ConnectionId);

    /// 接続をルームの配信チャンネルから離脱させる
    async fn leave_channel(&self, room_id: &RoomId, connection_id: &ConnectionId);

    /// ルームの配信チャンネルを丸ごと破棄する（ルーム解体時）
    async fn drop_channel(&self, room_id: &RoomId);

    /// ルーム内の全接続にイベントを配信する
    ///
    /// 一部の接続への送信失敗は許容し、エラーにしない。
    async fn broadcast(
        &self,
        room_id: &RoomId,
        event: &str,
        data: serde_json::Value,
    ) -> Result<(), PushError>;

    /// 特定の接続にイベントを送信する
    async fn send_to(
        &self,
        connection_id: &ConnectionId,
        event: &str,
        data: serde_json::Value,
    ) -> Result<(), PushError>;
}
