//! WebSocket を使った EventPusher 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を管理（接続の登録・解除）
//! - ルームチャンネル（room_id → 参加中の接続の集合）を管理
//! - `{ "event": ..., "data": ... }` 形式のフレームの組み立てと送信
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、イベント送信に使用します。
//!
//! これにより、「WebSocket の生成」と「イベントの配信」が分離されます：
//! - UI 層: WebSocket 接続の受付、sender の生成
//! - Infrastructure 層: sender とチャンネルの管理、イベント配信

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, EventPusher, PushError, PusherChannel, RoomId};
use crate::infrastructure::dto::ws::EventEnvelope;

/// イベント名とペイロードを配信フレームへ組み立てる
fn encode_frame(event: &str, data: Value) -> Result<String, PushError> {
    let envelope = EventEnvelope {
        event: event.to_string(),
        data,
    };
    serde_json::to_string(&envelope).map_err(|e| PushError::PushFailed(e.to_string()))
}

/// WebSocket を使った EventPusher 実装
pub struct WebSocketEventPusher {
    /// 接続中の WebSocket sender
    ///
    /// Key: connection_id
    /// Value: PusherChannel
    connections: Mutex<HashMap<ConnectionId, PusherChannel>>,
    /// ルームチャンネル（room_id → 参加中の接続の集合）
    channels: Mutex<HashMap<RoomId, HashSet<ConnectionId>>>,
}

impl WebSocketEventPusher {
    /// 新しい WebSocketEventPusher を作成
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for WebSocketEventPusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPusher for WebSocketEventPusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id.clone(), sender);
        tracing::debug!("Connection '{}' registered to EventPusher", connection_id.as_str());
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id);
        drop(connections);

        // チャンネルに残っていたら掃除する（leave を経ない切断対策）
        let mut channels = self.channels.lock().await;
        for members in channels.values_mut() {
            members.remove(connection_id);
        }
        channels.retain(|_, members| !members.is_empty());
        tracing::debug!(
            "Connection '{}' unregistered from EventPusher",
            connection_id.as_str()
        );
    }

    async fn join_channel(&self, room_id: &RoomId, connection_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        channels
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone());
        tracing::debug!(
            "Connection '{}' joined channel '{}'",
            connection_id.as_str(),
            room_id.as_str()
        );
    }

    async fn leave_channel(&self, room_id: &RoomId, connection_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        if let Some(members) = channels.get_mut(room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                channels.remove(room_id);
            }
        }
        tracing::debug!(
            "Connection '{}' left channel '{}'",
            connection_id.as_str(),
            room_id.as_str()
        );
    }

    async fn drop_channel(&self, room_id: &RoomId) {
        let mut channels = self.channels.lock().await;
        channels.remove(room_id);
        tracing::debug!("Channel '{}' dropped", room_id.as_str());
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        event: &str,
        data: Value,
    ) -> Result<(), PushError> {
        let frame = encode_frame(event, data)?;

        let members: Vec<ConnectionId> = {
            let channels = self.channels.lock().await;
            match channels.get(room_id) {
                Some(members) => members.iter().cloned().collect(),
                None => {
                    tracing::debug!(
                        "No channel for room '{}', skipping '{}' broadcast",
                        room_id.as_str(),
                        event
                    );
                    return Ok(());
                }
            }
        };

        let connections = self.connections.lock().await;
        for member in members {
            if let Some(sender) = connections.get(&member) {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(frame.clone()) {
                    tracing::warn!(
                        "Failed to push '{}' to connection '{}': {}",
                        event,
                        member.as_str(),
                        e
                    );
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during broadcast, skipping",
                    member.as_str()
                );
            }
        }

        Ok(())
    }

    async fn send_to(
        &self,
        connection_id: &ConnectionId,
        event: &str,
        data: Value,
    ) -> Result<(), PushError> {
        let frame = encode_frame(event, data)?;

        let connections = self.connections.lock().await;
        if let Some(sender) = connections.get(connection_id) {
            sender
                .send(frame)
                .map_err(|e| PushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(PushError::ConnectionNotFound(
                connection_id.as_str().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::domain::{ConnectionIdFactory, RoomIdFactory};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - WebSocketEventPusher のフレーム組み立てと配信
    // - send_to: 特定の接続への送信
    // - broadcast: ルームチャンネル参加者への一斉送信
    // - エラーハンドリング（存在しない接続・閉じた接続）
    //
    // 【なぜこのテストが必要か】
    // - EventPusher は SessionCoordinator から呼ばれる配信層の中核
    // - チャンネルの境界（別ルームへ漏れないこと）を保証する必要がある
    // - 切断済みクライアントが残っていてもブロードキャストが止まらないこと
    //
    // 【どのようなシナリオをテストするか】
    // 1. send_to の成功ケースとフレーム形式
    // 2. send_to の失敗ケース（接続が存在しない）
    // 3. broadcast がチャンネル参加者だけに届くこと
    // 4. broadcast の部分失敗ケース（閉じた接続が混ざっている）
    // 5. leave_channel / drop_channel / unregister 後に届かないこと
    // ========================================

    async fn register(
        pusher: &WebSocketEventPusher,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = ConnectionIdFactory::generate().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_connection(connection_id.clone(), tx).await;
        (connection_id, rx)
    }

    #[tokio::test]
    async fn test_send_to_builds_event_frame() {
        // テスト項目: 特定の接続へ event/data 形式のフレームが届く
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();
        let (connection_id, mut rx) = register(&pusher).await;

        // when (操作):
        let result = pusher
            .send_to(
                &connection_id,
                "message",
                serde_json::json!({ "message": "hello" }),
            )
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        let frame = rx.recv().await.unwrap();
        let envelope: EventEnvelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(envelope.event, "message");
        assert_eq!(envelope.data["message"], "hello");
    }

    #[tokio::test]
    async fn test_send_to_connection_not_found() {
        // テスト項目: 存在しない接続への送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();
        let unknown = ConnectionIdFactory::generate().unwrap();

        // when (操作):
        let result = pusher
            .send_to(&unknown, "message", serde_json::Value::Null)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(PushError::ConnectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_channel_members_only() {
        // テスト項目: ブロードキャストはチャンネル参加者だけに届く
        // given (前提条件): ルーム A に 2 接続、ルーム B に 1 接続
        let pusher = WebSocketEventPusher::new();
        let room_a = RoomIdFactory::generate().unwrap();
        let room_b = RoomIdFactory::generate().unwrap();
        let (conn1, mut rx1) = register(&pusher).await;
        let (conn2, mut rx2) = register(&pusher).await;
        let (conn3, mut rx3) = register(&pusher).await;
        pusher.join_channel(&room_a, &conn1).await;
        pusher.join_channel(&room_a, &conn2).await;
        pusher.join_channel(&room_b, &conn3).await;

        // when (操作):
        let result = pusher
            .broadcast(&room_a, "answered", serde_json::json!({ "user_id": "alice" }))
            .await;

        // then (期待する結果): A の 2 接続にだけ届く
        assert!(result.is_ok());
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_tolerates_closed_connection() {
        // テスト項目: 閉じた接続が混ざっていてもブロードキャストは成功する
        // given (前提条件): 片方の受信側を先に閉じる
        let pusher = WebSocketEventPusher::new();
        let room_id = RoomIdFactory::generate().unwrap();
        let (conn1, mut rx1) = register(&pusher).await;
        let (conn2, rx2) = register(&pusher).await;
        pusher.join_channel(&room_id, &conn1).await;
        pusher.join_channel(&room_id, &conn2).await;
        drop(rx2);

        // when (操作):
        let result = pusher
            .broadcast(&room_id, "message", serde_json::Value::Null)
            .await;

        // then (期待する結果): 生きている接続には届く
        assert!(result.is_ok());
        assert!(rx1.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_leave_and_drop_channel_stop_delivery() {
        // テスト項目: チャンネル離脱・チャンネル破棄後は届かない
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();
        let room_id = RoomIdFactory::generate().unwrap();
        let (conn1, mut rx1) = register(&pusher).await;
        let (conn2, mut rx2) = register(&pusher).await;
        pusher.join_channel(&room_id, &conn1).await;
        pusher.join_channel(&room_id, &conn2).await;

        // when (操作): conn1 が離脱してからブロードキャストする
        pusher.leave_channel(&room_id, &conn1).await;
        pusher
            .broadcast(&room_id, "message", serde_json::Value::Null)
            .await
            .unwrap();

        // then (期待する結果): conn2 にだけ届く
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());

        // when (操作): チャンネルごと破棄してからブロードキャストする
        pusher.drop_channel(&room_id).await;
        pusher
            .broadcast(&room_id, "message", serde_json::Value::Null)
            .await
            .unwrap();

        // then (期待する結果): 誰にも届かない
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_sweeps_channels() {
        // テスト項目: 接続の登録解除でチャンネルからも取り除かれる
        // given (前提条件):
        let pusher = WebSocketEventPusher::new();
        let room_id = RoomIdFactory::generate().unwrap();
        let (connection_id, mut rx) = register(&pusher).await;
        pusher.join_channel(&room_id, &connection_id).await;

        // when (操作):
        pusher.unregister_connection(&connection_id).await;
        let result = pusher
            .broadcast(&room_id, "message", serde_json::Value::Null)
            .await;

        // then (期待する結果): エラーにならず、何も届かない
        assert!(result.is_ok());
        assert!(rx.try_recv().is_err());
    }
}
