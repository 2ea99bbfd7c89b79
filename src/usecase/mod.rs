//! UseCase 層：セッション進行・ルームライフサイクル・イベント語彙

pub mod coordinator;
pub mod events;
pub mod locks;
pub mod room_service;
pub mod scheduler;

use std::time::Duration;

use crate::domain::UntimedPolicy;

pub use coordinator::{AdvanceOutcome, AnswerAck, LeaveOutcome, SessionCoordinator};
pub use locks::LockRegistry;
pub use room_service::{CreatedRoom, RoomService, RoomSummary};

/// ゲーム進行のチューニング設定
///
/// サーバー起動時の引数から組み立てられ、SessionCoordinator と
/// 出題タイマー、ストアのリトライ方針がここから値を取る。
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// 解答公開から次の問題までの表示時間
    pub reveal_delay: Duration,
    /// 出題タイマーがルーム状態を読み直す間隔
    pub timer_tick: Duration,
    /// 制限時間なし（time_limit <= 0）の問題のスコアリング方針
    pub untimed_policy: UntimedPolicy,
    /// 一時的なストア障害を初回失敗後に再試行する回数
    pub store_retries: u32,
    /// ストア再試行のバックオフ基準待ち時間（試行ごとに 2 倍）
    pub store_retry_base_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_secs(5),
            timer_tick: Duration::from_secs(1),
            untimed_policy: UntimedPolicy::default(),
            store_retries: 3,
            store_retry_base_delay: Duration::from_millis(50),
        }
    }
}
