//! ドメインエンティティ定義
//!
//! クイズセッションの集約ルートである `Room` と、その構成要素
//! （`Player` / `Question` / `RoomStatus`）を定義します。
//!
//! `Room` はストアに保存されるスナップショットそのものであり、
//! 状態遷移の不変条件はこの集約のメソッドで守ります。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    error::GameError,
    value_object::{JoinCode, RoomId, Timestamp, UserId},
};

/// ルームのライフサイクル状態
///
/// Waiting → InQuestion → RevealingAnswer → (InQuestion | Finished)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// ロビーで開始待ち
    Waiting,
    /// 出題中（回答受付中）
    InQuestion,
    /// 正解公開中（次の問題までの間）
    RevealingAnswer,
    /// ゲーム終了
    Finished,
}

/// ルーム内のプレイヤー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: UserId,
    pub username: String,
    /// 累積スコア（単調増加）
    pub score: u32,
    /// 正解数
    pub correct: u32,
    /// 現在の問題に回答済みか（問題ごとにリセット）
    pub answered: bool,
    /// 現在の問題への回答内容（問題ごとにリセット）
    pub answer: Option<String>,
    pub joined_at: Timestamp,
}

impl Player {
    /// 新しい Player を作成（スコア 0、未回答状態）
    pub fn new(user_id: UserId, username: String, joined_at: Timestamp) -> Self {
        Self {
            user_id,
            username,
            score: 0,
            correct: 0,
            answered: false,
            answer: None,
            joined_at,
        }
    }

    /// 回答を記録する
    ///
    /// スコアと正解数は加算のみで、減少することはない。
    pub fn record_answer(&mut self, answer: String, delta: u32, is_correct: bool) {
        self.answered = true;
        self.answer = Some(answer);
        self.score += delta;
        if is_correct {
            self.correct += 1;
        }
    }

    /// 問題ごとの一時状態をリセットする
    pub fn reset_transient(&mut self) {
        self.answered = false;
        self.answer = None;
    }
}

/// クイズの問題
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    /// 正解（クライアントへ配信する DTO には含めない）
    pub correct_answer: String,
    /// 制限時間（秒）。0 以下は時間無制限として扱う
    pub time_limit: i64,
    pub category_id: Option<String>,
}

impl Question {
    /// 制限時間なし（time_limit <= 0）かどうか
    pub fn is_untimed(&self) -> bool {
        self.time_limit <= 0
    }
}

/// クイズセッションの集約ルート
///
/// ストアに保存されるスナップショット。1 ルームの全ゲーム状態
/// （プレイヤー・問題・進行状況）をこの 1 つの値が持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub status: RoomStatus,
    /// オーナーの user_id（players の中の 1 人を指す）
    pub owner_id: UserId,
    pub players: HashMap<UserId, Player>,
    pub questions: Vec<Question>,
    /// 現在の問題のインデックス。開始前は -1
    pub current_question_index: i32,
    pub max_players: usize,
    pub join_code: JoinCode,
    /// 現在の問題の回答締切（UTC ミリ秒の絶対時刻）。出題中のみ Some
    pub question_deadline: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// デフォルトのルーム定員
pub const DEFAULT_MAX_PLAYERS: usize = 10;

impl Room {
    /// 新しいルームを作成
    ///
    /// オーナーは最初のプレイヤーとして登録され、状態は Waiting になる。
    pub fn new(
        room_id: RoomId,
        owner: Player,
        questions: Vec<Question>,
        max_players: usize,
        join_code: JoinCode,
        created_at: Timestamp,
    ) -> Self {
        let owner_id = owner.user_id.clone();
        let mut players = HashMap::new();
        players.insert(owner_id.clone(), owner);
        Self {
            room_id,
            status: RoomStatus::Waiting,
            owner_id,
            players,
            questions,
            current_question_index: -1,
            max_players,
            join_code,
            question_deadline: None,
            created_at,
        }
    }

    /// プレイヤーを追加する
    ///
    /// Waiting 状態のルームにのみ追加できる。重複参加・定員超過は拒否。
    pub fn add_player(&mut self, player: Player) -> Result<(), GameError> {
        if self.status != RoomStatus::Waiting {
            return Err(GameError::InvalidState);
        }
        if self.players.contains_key(&player.user_id) {
            return Err(GameError::AlreadyJoined);
        }
        if self.players.len() >= self.max_players {
            return Err(GameError::RoomFull);
        }
        self.players.insert(player.user_id.clone(), player);
        Ok(())
    }

    /// プレイヤーを削除し、削除された Player を返す
    pub fn remove_player(&mut self, user_id: &UserId) -> Option<Player> {
        self.players.remove(user_id)
    }

    pub fn player(&self, user_id: &UserId) -> Option<&Player> {
        self.players.get(user_id)
    }

    pub fn player_mut(&mut self, user_id: &UserId) -> Option<&mut Player> {
        self.players.get_mut(user_id)
    }

    /// オーナーの Player を取得
    pub fn owner(&self) -> Option<&Player> {
        self.players.get(&self.owner_id)
    }

    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    /// オーナー離脱時の後継オーナーを決定する
    ///
    /// 決定的な選択: 参加時刻が最も早いプレイヤー。同時刻の場合は
    /// user_id の辞書順で最小のプレイヤー。
    pub fn successor_owner(&self) -> Option<&Player> {
        self.players.values().min_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.as_str().cmp(b.user_id.as_str()))
        })
    }

    /// 現在出題中の問題を取得
    pub fn current_question(&self) -> Option<&Question> {
        if self.current_question_index < 0 {
            return None;
        }
        self.questions.get(self.current_question_index as usize)
    }

    /// 現在の問題が最後の問題かどうか
    pub fn is_last_question(&self) -> bool {
        self.current_question_index >= 0
            && (self.current_question_index as usize) + 1 >= self.questions.len()
    }

    /// 全プレイヤーが現在の問題に回答済みかどうか
    ///
    /// プレイヤーが 0 人の場合は false（空のルームで締切前倒しをしない）。
    pub fn all_answered(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.answered)
    }

    /// 全プレイヤーの問題ごと一時状態をリセットする
    pub fn reset_answers(&mut self) {
        for player in self.players.values_mut() {
            player.reset_transient();
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// リーダーボード（スコア降順、同点は username 昇順）
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.username.cmp(&b.username))
        });
        players
    }
}
