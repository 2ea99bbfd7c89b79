//! WebSocket frame DTOs.
//!
//! すべての WebSocket フレームは `{ "event": ..., "data": ... }` の
//! エンベロープで表現される。`data` の中身はイベントごとに異なるため、
//! エンベロープ自体は `serde_json::Value` のまま保持し、イベント名で
//! ディスパッチした後に個別の payload 型へデシリアライズする。

use serde::{Deserialize, Serialize};

/// WebSocket フレームの共通エンベロープ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// イベント名（`join_room` / `answered` など）
    pub event: String,
    /// イベントごとのペイロード
    pub data: serde_json::Value,
}

/// ルーム ID のみを持つリクエストの `data` 部
///
/// `join_room` / `leave_room` / `start_quiz` / `room_status` /
/// `show_result` / `update_leaderboard` が共有する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTargetData {
    pub room_id: String,
}

/// `answer` リクエストの `data` 部
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerData {
    pub room_id: String,
    pub answer: String,
}
