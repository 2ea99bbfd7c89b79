//! UseCase: クイズセッション進行処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SessionCoordinator の各状態遷移メソッド
//!   （join / leave / start / answer / reveal / advance / broadcast）
//! - Waiting → InQuestion → RevealingAnswer → (InQuestion | Finished) の遷移規則
//!
//! ### なぜこのテストが必要か
//! - スコア計算と回答締切の判定はゲームの公平性そのもの
//! - 「解答公開はちょうど 1 回」の保証（回答側とタイマー側の競合調停）
//! - 最後のプレイヤー退出時にルームの全データが確実に破棄されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加 → 開始 → 回答 → 公開 → 次の問題 → 終了の一連の流れ
//! - 異常系：満員・重複参加・オーナー以外の開始・二重回答・締切超過
//! - エッジケース：制限時間なしの問題、全員回答による早期公開、オーナー退出

use std::sync::Arc;

use serde::Serialize;

use crate::common::time::Clock;
use crate::domain::{
    AnswerOutcome, ConnectionId, EventPusher, GameArchive, GameError, Player, Question, Room,
    RoomId, RoomStatus, RoomStore, Timestamp, UserId, UserProfile, score_answer,
};

use super::GameConfig;
use super::events::{
    self, AnsweredPayload, LobbyPayload, QuestionPayload, RevealPayload, RoomStatusPayload,
};
use super::locks::LockRegistry;
use super::scheduler;

/// ルーム退出の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// 退出後もルームは存続する（オーナーが移譲された場合は新オーナーの ID を持つ）
    Left { new_owner: Option<UserId> },
    /// 最後のプレイヤーが退出したためルームを破棄した
    RoomClosed,
}

/// 回答受付の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerAck {
    /// 受理した（正解だったかどうかを持つ）
    Accepted { is_correct: bool },
    /// 締切超過のため記録せず破棄した
    LateRejected,
}

/// 次の問題への遷移の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// 次の問題へ進んだ（進んだ先の 0 始まりインデックス）
    NextQuestion(usize),
    /// 最終問題だったためゲームを終了した
    Finished,
    /// ルームが解答公開中ではなかったため何もしなかった
    Skipped,
}

/// タイマーから見た現在の出題フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuestionPhase {
    /// ルームが存在しない（破棄済み、または取得不能）
    Gone,
    /// 出題中ではない（解答公開や終了など別フェーズへ移行済み）
    Moved,
    /// 出題中かつ締切超過
    Expired,
    /// 出題中かつ締切前
    Counting,
}

/// クイズセッション進行のユースケース
///
/// ルームの状態遷移（参加・退出・開始・回答・解答公開・次の問題への遷移）を
/// すべてここで行う。各遷移はルーム単位のロックを取得してから
/// read-modify-write するため、同一ルームへの操作は直列化される。
pub struct SessionCoordinator {
    /// RoomStore（ルーム状態ストアの抽象化）
    store: Arc<dyn RoomStore>,
    /// EventPusher（ルームチャンネルへのイベント配信の抽象化）
    pusher: Arc<dyn EventPusher>,
    /// GameArchive（終了したゲームの保存先の抽象化）
    archive: Arc<dyn GameArchive>,
    /// ルーム単位の排他ロック
    locks: Arc<LockRegistry>,
    /// Clock（現在時刻取得の抽象化）
    clock: Arc<dyn Clock>,
    /// ゲーム進行のチューニング設定
    config: GameConfig,
}

impl SessionCoordinator {
    /// 新しい SessionCoordinator を作成
    pub fn new(
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn EventPusher>,
        archive: Arc<dyn GameArchive>,
        locks: Arc<LockRegistry>,
        clock: Arc<dyn Clock>,
        config: GameConfig,
    ) -> Self {
        Self {
            store,
            pusher,
            archive,
            locks,
            clock,
            config,
        }
    }

    /// ルームへの参加を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 参加先のルーム ID（Domain Model）
    /// * `profile` - 参加するユーザーのプロフィール
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 参加成功（参加後のルームのスナップショットを返す）
    /// * `Err(GameError)` - ルームが存在しない・満員・重複・開始済みなど
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        profile: UserProfile,
    ) -> Result<Room, GameError> {
        let _guard = self.locks.acquire(room_id).await;

        // 1. ルームを取得
        let mut room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;

        // 2. プレイヤーを追加（Waiting 以外・満員・重複はここで弾かれる）
        let player = Player::new(
            profile.user_id,
            profile.username,
            Timestamp::new(self.clock.now_millis()),
        );
        room.add_player(player)?;

        // 3. スナップショットを保存
        self.store.save_room(&room).await?;

        tracing::info!(
            "Player joined room '{}' ({}/{})",
            room_id.as_str(),
            room.player_count(),
            room.max_players
        );

        Ok(room)
    }

    /// WebSocket 接続をルームのチャンネルへ紐付け
    ///
    /// ロスター登録（join_room）が済んでいることが前提。チャンネル参加後、
    /// 本人へ ack を返し、ルーム全体へロビー情報を配信する。
    pub async fn attach_connection(
        &self,
        connection_id: &ConnectionId,
        user_id: &UserId,
        room_id: &RoomId,
    ) -> Result<(), GameError> {
        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;
        if room.player(user_id).is_none() {
            return Err(GameError::PlayerNotInRoom);
        }

        self.pusher.join_channel(room_id, connection_id).await;
        if let Err(e) = self
            .pusher
            .send_to(
                connection_id,
                events::MESSAGE,
                serde_json::json!({ "message": "Join room success" }),
            )
            .await
        {
            tracing::warn!(
                "Failed to ack join for connection '{}': {}",
                connection_id.as_str(),
                e
            );
        }
        self.broadcast_lobby(&room).await;

        Ok(())
    }

    /// ルームからの退出を実行
    ///
    /// ルームの状態に関わらずプレイヤーを削除する。オーナーが退出した場合は
    /// joined_at が最も古いプレイヤー（同時刻なら user_id 昇順）へ移譲し、
    /// 最後の 1 人が退出した場合はルームに紐づく全データを破棄する。
    ///
    /// # Returns
    ///
    /// * `Ok(LeaveOutcome::Left)` - 退出成功、ルームは存続
    /// * `Ok(LeaveOutcome::RoomClosed)` - 退出によりルームを破棄した
    /// * `Err(GameError)` - ルームが存在しない・ロスターに居ない
    pub async fn leave_room(
        &self,
        user_id: &UserId,
        room_id: &RoomId,
    ) -> Result<LeaveOutcome, GameError> {
        let _guard = self.locks.acquire(room_id).await;

        let mut room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;

        // 1. 退出するプレイヤーを削除
        let departed = room
            .remove_player(user_id)
            .ok_or(GameError::PlayerNotInRoom)?;

        // 2. 最後の 1 人だったらルームごと破棄
        if room.is_empty() {
            self.teardown_room(&room).await?;
            tracing::info!("Room '{}' closed (last player left)", room_id.as_str());
            return Ok(LeaveOutcome::RoomClosed);
        }

        // 3. オーナーが抜けた場合は後任へ移譲
        let mut new_owner = None;
        if departed.user_id == room.owner_id {
            if let Some(successor) = room.successor_owner().map(|p| p.user_id.clone()) {
                room.owner_id = successor.clone();
                new_owner = Some(successor);
            }
        }

        // 4. 保存してロビー情報を配信
        self.store.save_room(&room).await?;
        self.broadcast_lobby(&room).await;

        tracing::info!(
            "Player '{}' left room '{}' ({} remaining)",
            user_id.as_str(),
            room_id.as_str(),
            room.player_count()
        );

        Ok(LeaveOutcome::Left { new_owner })
    }

    /// クイズを開始
    ///
    /// オーナーのみが Waiting 状態のルームで実行できる。最初の問題を配信し、
    /// 締切を設定して出題タイマーを起動する。
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 開始成功
    /// * `Err(GameError)` - オーナー以外・Waiting 以外・問題が無いなど
    pub async fn start_quiz(
        self: &Arc<Self>,
        user_id: &UserId,
        room_id: &RoomId,
    ) -> Result<(), GameError> {
        let _guard = self.locks.acquire(room_id).await;

        let mut room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;

        // 1. 事前条件の検査
        if !room.is_owner(user_id) {
            return Err(GameError::NotAuthorized);
        }
        if room.status != RoomStatus::Waiting {
            return Err(GameError::InvalidState);
        }
        let question = room
            .questions
            .first()
            .cloned()
            .ok_or(GameError::NoQuestionsAvailable)?;

        // 2. 出題状態へ遷移して最初の問題の締切を設定
        room.reset_answers();
        room.current_question_index = 0;
        room.status = RoomStatus::InQuestion;
        room.question_deadline = self.question_deadline_for(&question);
        self.store.save_room(&room).await?;

        // 3. 最初の問題を配信してタイマーを起動
        self.notify(
            room_id,
            events::START_GAME,
            &QuestionPayload::new(&question, 1),
        )
        .await;
        scheduler::spawn_question_timer(Arc::clone(self), room_id.clone());

        tracing::info!(
            "Quiz started in room '{}' ({} questions)",
            room_id.as_str(),
            room.questions.len()
        );

        Ok(())
    }

    /// 回答を受け付け
    ///
    /// 締切からの残り時間で経過秒数を算出してスコアリングする。締切超過の
    /// 回答は記録せず破棄する（エラーにはしない）。受理した回答で全員が
    /// 回答済みになった場合は、その場で解答公開へ遷移する。
    ///
    /// # Returns
    ///
    /// * `Ok(AnswerAck::Accepted)` - 受理した（正誤を含む）
    /// * `Ok(AnswerAck::LateRejected)` - 締切超過のため破棄した
    /// * `Err(GameError)` - 出題中でない・二重回答など
    pub async fn submit_answer(
        &self,
        user_id: &UserId,
        room_id: &RoomId,
        answer: String,
    ) -> Result<AnswerAck, GameError> {
        let _guard = self.locks.acquire(room_id).await;

        let mut room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;

        // 1. 事前条件の検査
        if room.status != RoomStatus::InQuestion {
            return Err(GameError::InvalidState);
        }
        let question = room
            .current_question()
            .cloned()
            .ok_or(GameError::InvalidState)?;
        {
            let player = room.player(user_id).ok_or(GameError::PlayerNotInRoom)?;
            if player.answered {
                return Err(GameError::AlreadyAnswered);
            }
        }

        // 2. 締切からの残り時間で経過秒数を算出してスコアリング
        let elapsed_seconds = if question.is_untimed() {
            0.0
        } else {
            let deadline = room.question_deadline.ok_or(GameError::InvalidState)?;
            question.time_limit as f64
                - (deadline.value() - self.clock.now_millis()) as f64 / 1_000.0
        };
        let outcome = score_answer(
            &question,
            &answer,
            elapsed_seconds,
            self.config.untimed_policy,
        );

        let (delta, is_correct) = match outcome {
            AnswerOutcome::Late => {
                tracing::debug!(
                    "Late answer from '{}' in room '{}' discarded ({:.1}s elapsed)",
                    user_id.as_str(),
                    room_id.as_str(),
                    elapsed_seconds
                );
                return Ok(AnswerAck::LateRejected);
            }
            AnswerOutcome::Accepted { delta, is_correct } => (delta, is_correct),
        };

        // 3. 回答を記録し、全員回答済みなら解答公開へ遷移してから保存
        if let Some(player) = room.player_mut(user_id) {
            player.record_answer(answer, delta, is_correct);
        }
        let everyone_answered = room.all_answered();
        if everyone_answered {
            room.status = RoomStatus::RevealingAnswer;
        }
        self.store.save_room(&room).await?;

        // 4. 回答イベントを配信（全員回答済みなら解答公開イベントも続けて配信）
        self.notify(
            room_id,
            events::ANSWERED,
            &AnsweredPayload {
                user_id: user_id.as_str().to_string(),
                correct_answered: u8::from(is_correct),
            },
        )
        .await;
        if everyone_answered {
            self.broadcast_reveal(&room).await;
            tracing::info!(
                "All players answered in room '{}', revealing answer",
                room_id.as_str()
            );
        }

        Ok(AnswerAck::Accepted { is_correct })
    }

    /// 解答公開へ遷移
    ///
    /// 出題中でなければ何もしない（回答側の遷移が先行した場合の競合は
    /// ここで吸収される）。遷移した場合のみ正解を配信する。
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - この呼び出しで解答公開へ遷移した
    /// * `Ok(false)` - 既に別フェーズだったため何もしなかった
    pub async fn reveal_answer(&self, room_id: &RoomId) -> Result<bool, GameError> {
        let _guard = self.locks.acquire(room_id).await;

        let mut room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;
        if room.status != RoomStatus::InQuestion {
            return Ok(false);
        }

        room.status = RoomStatus::RevealingAnswer;
        self.store.save_room(&room).await?;
        self.broadcast_reveal(&room).await;

        Ok(true)
    }

    /// 次の問題へ遷移、または最終問題ならゲームを終了
    ///
    /// 解答公開中でなければ何もしない。次の問題がある場合は回答状態を
    /// リセットして新しい締切を設定し、タイマーを起動し直す。最終問題
    /// だった場合はアーカイブへ保存してゲーム終了を配信する。
    pub async fn advance_question(
        self: &Arc<Self>,
        room_id: &RoomId,
    ) -> Result<AdvanceOutcome, GameError> {
        let _guard = self.locks.acquire(room_id).await;

        let mut room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;
        if room.status != RoomStatus::RevealingAnswer {
            return Ok(AdvanceOutcome::Skipped);
        }

        room.reset_answers();

        // 最終問題だったらゲーム終了
        if room.is_last_question() {
            room.status = RoomStatus::Finished;
            room.question_deadline = None;
            self.store.save_room(&room).await?;
            self.store.remove_active_room(room_id).await?;

            // アーカイブ保存の失敗でゲーム終了自体は止めない
            if let Err(e) = self.archive.save_finished_game(&room).await {
                tracing::warn!(
                    "Failed to archive finished game for room '{}': {}",
                    room_id.as_str(),
                    e
                );
            }

            self.notify(room_id, events::END_OF_GAME, &serde_json::Value::Null)
                .await;
            tracing::info!("Game finished in room '{}'", room_id.as_str());
            return Ok(AdvanceOutcome::Finished);
        }

        // 次の問題へ
        let next_index = room.current_question_index + 1;
        let question = room
            .questions
            .get(next_index as usize)
            .cloned()
            .ok_or(GameError::InvalidState)?;
        room.current_question_index = next_index;
        room.status = RoomStatus::InQuestion;
        room.question_deadline = self.question_deadline_for(&question);
        self.store.save_room(&room).await?;

        let position = next_index as usize + 1;
        self.notify(
            room_id,
            events::GET_QUEST,
            &QuestionPayload::new(&question, position),
        )
        .await;
        scheduler::spawn_question_timer(Arc::clone(self), room_id.clone());

        tracing::info!(
            "Room '{}' advanced to question {}/{}",
            room_id.as_str(),
            position,
            room.questions.len()
        );

        Ok(AdvanceOutcome::NextQuestion(next_index as usize))
    }

    /// ルームの状態と現在の問題をチャンネル全体へ配信
    pub async fn broadcast_room_status(&self, room_id: &RoomId) -> Result<(), GameError> {
        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;
        self.notify(
            room_id,
            events::ROOM_STATUS,
            &RoomStatusPayload::from_room(&room),
        )
        .await;
        Ok(())
    }

    /// 最終結果（スコア降順）をチャンネル全体へ配信
    pub async fn broadcast_result(&self, room_id: &RoomId) -> Result<(), GameError> {
        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;
        self.notify(room_id, events::RESULT, &events::leaderboard_of(&room))
            .await;
        Ok(())
    }

    /// 現時点のリーダーボードをチャンネル全体へ配信
    pub async fn broadcast_leaderboard(&self, room_id: &RoomId) -> Result<(), GameError> {
        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(GameError::RoomNotFound)?;
        self.notify(
            room_id,
            events::UPDATE_LEADERBOARD,
            &events::leaderboard_of(&room),
        )
        .await;
        Ok(())
    }

    /// タイマーから見た現在の出題フェーズを判定
    ///
    /// ロックは取らない（読み取りのみ）。ストア障害はルーム消滅と同様に扱い、
    /// タイマー側を静かに終了させる。
    pub(crate) async fn question_phase(&self, room_id: &RoomId) -> QuestionPhase {
        let room = match self.store.get_room(room_id).await {
            Ok(Some(room)) => room,
            Ok(None) => return QuestionPhase::Gone,
            Err(e) => {
                tracing::debug!(
                    "Could not read room '{}' for timer, stopping: {}",
                    room_id.as_str(),
                    e
                );
                return QuestionPhase::Gone;
            }
        };
        if room.status != RoomStatus::InQuestion {
            return QuestionPhase::Moved;
        }
        match room.question_deadline {
            // 無制限問題は全員回答（またはルーム消滅）まで数え続ける
            None => QuestionPhase::Counting,
            Some(deadline) if self.clock.now_millis() < deadline.value() => QuestionPhase::Counting,
            Some(_) => QuestionPhase::Expired,
        }
    }

    pub(crate) fn config(&self) -> &GameConfig {
        &self.config
    }

    /// 制限時間から締切の絶対時刻を算出（無制限問題は締切なし）
    fn question_deadline_for(&self, question: &Question) -> Option<Timestamp> {
        if question.is_untimed() {
            None
        } else {
            Some(Timestamp::new(
                self.clock.now_millis() + question.time_limit * 1_000,
            ))
        }
    }

    /// ペイロードを JSON 化してルームチャンネルへ配信（失敗はログのみ）
    async fn notify<T: Serialize>(&self, room_id: &RoomId, event: &str, payload: &T) {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to serialize '{}' payload: {}", event, e);
                return;
            }
        };
        if let Err(e) = self.pusher.broadcast(room_id, event, data).await {
            tracing::warn!(
                "Failed to broadcast '{}' to room '{}': {}",
                event,
                room_id.as_str(),
                e
            );
        }
    }

    async fn broadcast_lobby(&self, room: &Room) {
        self.notify(
            &room.room_id,
            events::ALL_PLAYERS_IN_LOBBY,
            &LobbyPayload::from_room(room),
        )
        .await;
    }

    /// 正解とリーダーボード更新通知を配信（解答公開時）
    async fn broadcast_reveal(&self, room: &Room) {
        let payload = match room.current_question() {
            Some(question) => RevealPayload {
                correct_answer: question.correct_answer.clone(),
                sleep_timer: self.config.reveal_delay.as_secs(),
            },
            None => return,
        };
        self.notify(&room.room_id, events::SHOW_CORRECT_ANSWER, &payload)
            .await;
        self.notify(
            &room.room_id,
            events::NEED_UPDATE_LEADERBOARD,
            &serde_json::Value::Null,
        )
        .await;
    }

    /// ルームに紐づく全データを破棄
    /// （スナップショット・参加コード・アクティブ索引・チャンネル・ロック）
    async fn teardown_room(&self, room: &Room) -> Result<(), GameError> {
        self.store.delete_room(&room.room_id).await?;
        self.store.delete_room_code(&room.join_code).await?;
        self.store.remove_active_room(&room.room_id).await?;
        self.pusher.drop_channel(&room.room_id).await;
        self.locks.remove(&room.room_id).await;
        Ok(())
    }
}
