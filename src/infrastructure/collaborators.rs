//! UserDirectory / QuestionSource / GameArchive のインメモリ実装
//!
//! 上流サービス（ユーザー管理・問題データベース・戦績アーカイブ）を
//! 持たない構成で使う実装群。ユーザー辞書は起動時に登録するか、
//! デモ用途では未知のユーザーをその場で登録する permissive モードで動かす。
//! 問題バンクはカテゴリで絞り込み、指定件数まで切り詰めて返す。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    GameArchive, PortError, Question, QuestionSource, Room, UserDirectory, UserId, UserProfile,
};

/// 件数未指定（0）のときに取得する問題数
pub(crate) const DEFAULT_QUESTION_COUNT: usize = 10;

/// インメモリ UserDirectory 実装
///
/// `new` で作ると登録済みユーザーのみを解決する。`permissive` で作ると
/// 未知の user_id をその場でプロフィール化して登録する（表示名は user_id
/// をそのまま使う）。認証を持たないデモ起動向け。
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
    auto_register: bool,
}

impl InMemoryUserDirectory {
    /// 登録済みユーザーのみを解決する UserDirectory を作成
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            auto_register: false,
        }
    }

    /// 未知のユーザーを自動登録する UserDirectory を作成
    pub fn permissive() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            auto_register: true,
        }
    }

    /// ユーザーを登録する（同じ user_id は上書き）
    pub async fn register(&self, profile: UserProfile) {
        let mut users = self.users.write().await;
        users.insert(profile.user_id.clone(), profile);
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, PortError> {
        {
            let users = self.users.read().await;
            if let Some(profile) = users.get(user_id) {
                return Ok(Some(profile.clone()));
            }
        }
        if !self.auto_register {
            return Ok(None);
        }

        // permissive モード: 初見の user_id をその場で登録して返す
        let profile = UserProfile {
            user_id: user_id.clone(),
            username: user_id.as_str().to_string(),
        };
        let mut users = self.users.write().await;
        let profile = users
            .entry(user_id.clone())
            .or_insert_with(|| profile)
            .clone();
        Ok(Some(profile))
    }
}

/// インメモリ QuestionSource 実装
///
/// 起動時に投入した問題から、カテゴリで絞り込み・件数で切り詰めて返す。
/// `category_ids` が空の場合は全カテゴリが対象。`count` が 0 の場合は
/// デフォルト件数（10 問）として扱う。
pub struct InMemoryQuestionBank {
    questions: Vec<Question>,
}

impl InMemoryQuestionBank {
    /// 指定した問題で QuestionBank を作成
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// 組み込みのサンプル問題で QuestionBank を作成（デモ起動向け）
    pub fn with_sample_questions() -> Self {
        let sample = |id: &str, text: &str, options: &[&str], correct: &str, limit: i64, category: &str| {
            Question {
                id: id.to_string(),
                text: text.to_string(),
                options: options.iter().map(|o| o.to_string()).collect(),
                correct_answer: correct.to_string(),
                time_limit: limit,
                category_id: Some(category.to_string()),
            }
        };
        Self::with_questions(vec![
            sample(
                "sample-01",
                "Which planet is closest to the Sun?",
                &["Mercury", "Venus", "Earth", "Mars"],
                "Mercury",
                20,
                "science",
            ),
            sample(
                "sample-02",
                "What is the chemical symbol for gold?",
                &["Au", "Ag", "Gd", "Go"],
                "Au",
                20,
                "science",
            ),
            sample(
                "sample-03",
                "How many continents are there on Earth?",
                &["5", "6", "7", "8"],
                "7",
                15,
                "geography",
            ),
            sample(
                "sample-04",
                "Which is the largest ocean on Earth?",
                &["Atlantic", "Indian", "Pacific", "Arctic"],
                "Pacific",
                15,
                "geography",
            ),
            sample(
                "sample-05",
                "What is the capital of Australia?",
                &["Sydney", "Melbourne", "Canberra", "Perth"],
                "Canberra",
                20,
                "geography",
            ),
            sample(
                "sample-06",
                "In which year did humans first land on the Moon?",
                &["1965", "1969", "1972", "1975"],
                "1969",
                30,
                "history",
            ),
        ])
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionBank {
    async fn get_questions(
        &self,
        count: usize,
        category_ids: &[String],
    ) -> Result<Vec<Question>, PortError> {
        let count = if count == 0 {
            DEFAULT_QUESTION_COUNT
        } else {
            count
        };
        let questions = self
            .questions
            .iter()
            .filter(|q| {
                category_ids.is_empty()
                    || q.category_id
                        .as_ref()
                        .is_some_and(|c| category_ids.contains(c))
            })
            .take(count)
            .cloned()
            .collect();
        Ok(questions)
    }
}

/// ログ出力のみの GameArchive 実装
///
/// 終了したゲームの最終順位を tracing ログへ書き出す。
/// 永続化ストレージへの保存はこの実装の対象外。
#[derive(Debug, Default)]
pub struct LoggingGameArchive;

#[async_trait]
impl GameArchive for LoggingGameArchive {
    async fn save_finished_game(&self, room: &Room) -> Result<(), PortError> {
        let placements: Vec<String> = room
            .leaderboard()
            .iter()
            .enumerate()
            .map(|(rank, p)| format!("#{} {} ({} pts, {} correct)", rank + 1, p.username, p.score, p.correct))
            .collect();
        tracing::info!(
            "Game finished in room '{}' after {} questions: {}",
            room.room_id.as_str(),
            room.questions.len(),
            placements.join(", ")
        );
        Ok(())
    }
}
