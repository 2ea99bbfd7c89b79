//! UseCase: ルーム作成・コード参加・ルーム一覧
//!
//! セッション進行（SessionCoordinator）の手前にある薄い入口。
//! 作成時にユーザー解決と問題取得を行い、参加コードとアクティブルーム索引を
//! ストアへ登録する。

use std::sync::Arc;

use crate::common::time::Clock;
use crate::domain::{
    DEFAULT_MAX_PLAYERS, GameError, JoinCode, JoinCodeFactory, Player, QuestionSource, Room,
    RoomId, RoomIdFactory, RoomStatus, RoomStore, StoreError, Timestamp, UserDirectory, UserId,
};

use super::coordinator::SessionCoordinator;

/// 参加コードの割り当てを試行する回数の上限
const MAX_CODE_ATTEMPTS: usize = 8;

/// ルーム作成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRoom {
    pub room_id: RoomId,
    pub join_code: JoinCode,
}

/// 参加待ちルーム一覧の 1 件分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub owner_username: String,
    pub player_count: usize,
    pub max_players: usize,
    pub join_code: JoinCode,
}

/// ルームのライフサイクル入口のユースケース
pub struct RoomService {
    /// RoomStore（ルーム状態ストアの抽象化）
    store: Arc<dyn RoomStore>,
    /// UserDirectory（ユーザー解決の抽象化）
    users: Arc<dyn UserDirectory>,
    /// QuestionSource（問題取得の抽象化）
    questions: Arc<dyn QuestionSource>,
    /// ロスター追加を委譲する SessionCoordinator
    coordinator: Arc<SessionCoordinator>,
    /// Clock（現在時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl RoomService {
    /// 新しい RoomService を作成
    pub fn new(
        store: Arc<dyn RoomStore>,
        users: Arc<dyn UserDirectory>,
        questions: Arc<dyn QuestionSource>,
        coordinator: Arc<SessionCoordinator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            users,
            questions,
            coordinator,
            clock,
        }
    }

    /// ルームを作成
    ///
    /// 作成者をオーナー兼最初のプレイヤーとして登録し、QuestionSource から
    /// 取得した問題で Waiting 状態のルームを保存する。参加コードと
    /// アクティブルーム索引への登録もここで行う。
    ///
    /// # Returns
    ///
    /// * `Ok(CreatedRoom)` - 作成したルームの ID と参加コード
    /// * `Err(GameError)` - ユーザーが存在しない・問題が取得できないなど
    pub async fn create_room(
        &self,
        user_id: &UserId,
        count_questions: usize,
        category_ids: &[String],
    ) -> Result<CreatedRoom, GameError> {
        // 1. 作成者を解決
        let profile = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(GameError::UserNotFound)?;

        // 2. 問題を取得
        let questions = self
            .questions
            .get_questions(count_questions, category_ids)
            .await?;
        if questions.is_empty() {
            return Err(GameError::NoQuestionsAvailable);
        }

        // 3. ルームを構築して保存
        let room_id = RoomIdFactory::generate()?;
        let join_code = self.allocate_join_code().await?;
        let now = Timestamp::new(self.clock.now_millis());
        let owner = Player::new(profile.user_id, profile.username, now);
        let room = Room::new(
            room_id.clone(),
            owner,
            questions,
            DEFAULT_MAX_PLAYERS,
            join_code.clone(),
            now,
        );
        self.store.save_room(&room).await?;
        self.store.save_room_code(&join_code, &room_id).await?;
        self.store.add_active_room(&room_id).await?;

        tracing::info!(
            "Room '{}' created by '{}' (code: {}, {} questions)",
            room_id.as_str(),
            user_id.as_str(),
            join_code.as_str(),
            room.questions.len()
        );

        Ok(CreatedRoom { room_id, join_code })
    }

    /// 参加コードでルームへ参加
    ///
    /// コードをルーム ID へ解決してから SessionCoordinator の参加処理へ委譲する。
    pub async fn join_by_code(
        &self,
        user_id: &UserId,
        code: &JoinCode,
    ) -> Result<RoomId, GameError> {
        let room_id = self
            .store
            .get_room_id_by_code(code)
            .await?
            .ok_or(GameError::RoomNotFound)?;
        let profile = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(GameError::UserNotFound)?;
        self.coordinator.join_room(&room_id, profile).await?;
        Ok(room_id)
    }

    /// 参加待ち（Waiting 状態）のルーム一覧
    pub async fn list_open_rooms(&self) -> Result<Vec<RoomSummary>, GameError> {
        let mut summaries = Vec::new();
        for room_id in self.store.get_active_room_ids().await? {
            let Some(room) = self.store.get_room(&room_id).await? else {
                continue;
            };
            if room.status != RoomStatus::Waiting {
                continue;
            }
            summaries.push(RoomSummary {
                owner_username: room.owner().map(|p| p.username.clone()).unwrap_or_default(),
                player_count: room.player_count(),
                max_players: room.max_players,
                join_code: room.join_code.clone(),
                room_id: room.room_id,
            });
        }

        // 取得順はストア実装依存なので ID で安定させる
        summaries.sort_by(|a, b| a.room_id.as_str().cmp(b.room_id.as_str()));

        Ok(summaries)
    }

    /// 未使用の参加コードを確保（衝突したら生成し直す）
    async fn allocate_join_code(&self) -> Result<JoinCode, GameError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = JoinCodeFactory::generate()?;
            if self.store.get_room_id_by_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(StoreError::Unavailable("could not allocate an unused room code".to_string()).into())
    }
}
