//! 出題タイマー
//!
//! 問題ごとに起動するバックグラウンドタスク。明示的なキャンセル機構は持たず、
//! tick ごとにルーム状態を読み直して「ルームが消えた・フェーズが動いた・
//! 締切が来た」を判定する。解答公開後の表示時間と次の問題への遷移は
//! 常にこのタスクが担う（全員回答による早期公開があっても遷移は 1 回だけ）。

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::RoomId;

use super::coordinator::{QuestionPhase, SessionCoordinator};

/// 現在の問題の出題タイマーを起動
///
/// 締切（または全員回答によるフェーズ移行）まで監視し、解答公開と
/// 次の問題への遷移までを行って終了する。次の問題がある場合は
/// 遷移側で新しいタイマーが起動される。
pub(crate) fn spawn_question_timer(
    coordinator: Arc<SessionCoordinator>,
    room_id: RoomId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_question_timer(coordinator, room_id).await;
    })
}

async fn run_question_timer(coordinator: Arc<SessionCoordinator>, room_id: RoomId) {
    // 締切までルーム状態を監視する（最初の判定は sleep より前に行う）
    loop {
        match coordinator.question_phase(&room_id).await {
            QuestionPhase::Gone => return,
            QuestionPhase::Moved | QuestionPhase::Expired => break,
            QuestionPhase::Counting => {
                tokio::time::sleep(coordinator.config().timer_tick).await;
            }
        }
    }

    // 締切超過なら解答公開へ（全員回答で公開済みの場合は何もしない）
    match coordinator.reveal_answer(&room_id).await {
        Ok(true) => {
            tracing::debug!("Question timed out in room '{}'", room_id.as_str());
        }
        Ok(false) => {}
        Err(e) => {
            tracing::debug!("Timer stopped for room '{}': {}", room_id.as_str(), e);
            return;
        }
    }

    // 解答の表示時間を置いてから次の問題へ
    tokio::time::sleep(coordinator.config().reveal_delay).await;

    if let Err(e) = coordinator.advance_question(&room_id).await {
        tracing::debug!("Timer could not advance room '{}': {}", room_id.as_str(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use crate::common::time::{SystemClock, utc_now_millis};
    use crate::domain::{
        ConnectionIdFactory, EventPusher, GameError, JoinCodeFactory, Player, Question, Room,
        RoomIdFactory, RoomStatus, RoomStore, Timestamp, UserId,
    };
    use crate::infrastructure::collaborators::LoggingGameArchive;
    use crate::infrastructure::dto::ws::EventEnvelope;
    use crate::infrastructure::gateway::WebSocketEventPusher;
    use crate::infrastructure::store::InMemoryRoomStore;
    use crate::usecase::{GameConfig, LockRegistry, events};

    struct Harness {
        coordinator: Arc<SessionCoordinator>,
        store: Arc<InMemoryRoomStore>,
        pusher: Arc<WebSocketEventPusher>,
    }

    /// 実時間で素早く回る設定（tick 20ms / 表示時間 50ms）
    fn fast_config() -> GameConfig {
        GameConfig {
            reveal_delay: Duration::from_millis(50),
            timer_tick: Duration::from_millis(20),
            ..GameConfig::default()
        }
    }

    fn create_harness() -> Harness {
        let store = Arc::new(InMemoryRoomStore::new());
        let pusher = Arc::new(WebSocketEventPusher::new());
        let coordinator = Arc::new(SessionCoordinator::new(
            store.clone(),
            pusher.clone(),
            Arc::new(LoggingGameArchive::default()),
            Arc::new(LockRegistry::new()),
            Arc::new(SystemClock),
            fast_config(),
        ));
        Harness {
            coordinator,
            store,
            pusher,
        }
    }

    fn question(id: &str, time_limit: i64) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            options: vec!["A".to_string(), "B".to_string()],
            correct_answer: "A".to_string(),
            time_limit,
            category_id: None,
        }
    }

    fn user_id(name: &str) -> UserId {
        UserId::new(name.to_string()).unwrap()
    }

    /// 出題中（指定した残り時間）のルームをストアへ直接用意する
    async fn seed_in_question(
        harness: &Harness,
        questions: Vec<Question>,
        remaining_millis: i64,
    ) -> crate::domain::RoomId {
        let room_id = RoomIdFactory::generate().unwrap();
        let code = JoinCodeFactory::generate().unwrap();
        let owner = Player::new(
            user_id("alice"),
            "alice".to_string(),
            Timestamp::new(utc_now_millis()),
        );
        let mut room = Room::new(
            room_id.clone(),
            owner,
            questions,
            10,
            code.clone(),
            Timestamp::new(utc_now_millis()),
        );
        room.status = RoomStatus::InQuestion;
        room.current_question_index = 0;
        room.question_deadline = Some(Timestamp::new(utc_now_millis() + remaining_millis));
        harness.store.save_room(&room).await.unwrap();
        harness.store.save_room_code(&code, &room_id).await.unwrap();
        harness.store.add_active_room(&room_id).await.unwrap();
        room_id
    }

    async fn subscribe(
        harness: &Harness,
        room_id: &crate::domain::RoomId,
    ) -> mpsc::UnboundedReceiver<String> {
        let connection_id = ConnectionIdFactory::generate().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        harness
            .pusher
            .register_connection(connection_id.clone(), tx)
            .await;
        harness.pusher.join_channel(room_id, &connection_id).await;
        rx
    }

    fn drain_events(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<EventEnvelope> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn test_timer_reveals_and_advances_on_timeout() {
        // テスト項目: 締切超過で解答公開 → 表示時間 → 次の問題へ遷移する
        // given (前提条件): 残り 300ms の 1 問目を出題中（全 2 問）
        let harness = create_harness();
        let room_id = seed_in_question(
            &harness,
            vec![question("q1", 1), question("q2", 1)],
            300,
        )
        .await;
        let mut rx = subscribe(&harness, &room_id).await;

        // when (操作): タイマーを起動して走り切らせる
        let handle = spawn_question_timer(harness.coordinator.clone(), room_id.clone());
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        // then (期待する結果): 2 問目の出題中になり、公開と出題のイベントが届いている
        let room = harness.store.get_room(&room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::InQuestion);
        assert_eq!(room.current_question_index, 1);
        let frames = drain_events(&mut rx);
        assert!(frames.iter().any(|f| f.event == events::SHOW_CORRECT_ANSWER));
        assert!(frames.iter().any(|f| f.event == events::NEED_UPDATE_LEADERBOARD));
        let quest = frames
            .iter()
            .find(|f| f.event == events::GET_QUEST)
            .unwrap();
        assert_eq!(quest.data["id"], "q2");
        assert_eq!(quest.data["position"], 2);
    }

    #[tokio::test]
    async fn test_timer_finishes_game_after_last_question() {
        // テスト項目: 最終問題の締切超過でゲームが終了する
        // given (前提条件): 残り 200ms の最終問題（1 問のみ）を出題中
        let harness = create_harness();
        let room_id = seed_in_question(&harness, vec![question("q1", 1)], 200).await;
        let mut rx = subscribe(&harness, &room_id).await;

        // when (操作):
        let handle = spawn_question_timer(harness.coordinator.clone(), room_id.clone());
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        // then (期待する結果): Finished になり endOfGame が配信される
        let room = harness.store.get_room(&room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Finished);
        assert!(harness.store.get_active_room_ids().await.unwrap().is_empty());
        let frames = drain_events(&mut rx);
        assert!(frames.iter().any(|f| f.event == events::END_OF_GAME));
    }

    #[tokio::test]
    async fn test_timer_skips_reveal_when_all_answered_early() {
        // テスト項目: 全員回答で公開済みでも、遷移はタイマーが 1 回だけ行う
        // given (前提条件): 残り 10 秒の 1 問目を出題中（全 2 問・プレイヤーは alice のみ）
        let harness = create_harness();
        let room_id = seed_in_question(
            &harness,
            vec![question("q1", 10), question("q2", 10)],
            10_000,
        )
        .await;
        let mut rx = subscribe(&harness, &room_id).await;
        let handle = spawn_question_timer(harness.coordinator.clone(), room_id.clone());

        // when (操作): 締切より先に全員（alice）が回答する
        harness
            .coordinator
            .submit_answer(&user_id("alice"), &room_id, "A".to_string())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        // then (期待する結果): 公開イベントは 1 回だけで、2 問目へ進んでいる
        let room = harness.store.get_room(&room_id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::InQuestion);
        assert_eq!(room.current_question_index, 1);
        let frames = drain_events(&mut rx);
        let reveals = frames
            .iter()
            .filter(|f| f.event == events::SHOW_CORRECT_ANSWER)
            .count();
        assert_eq!(reveals, 1);
        assert!(frames.iter().any(|f| f.event == events::GET_QUEST));
    }

    #[tokio::test]
    async fn test_timer_exits_quietly_when_room_vanishes() {
        // テスト項目: 監視中にルームが消えたらタイマーは静かに終了する
        // given (前提条件): 残り 10 秒の問題を出題中
        let harness = create_harness();
        let room_id = seed_in_question(&harness, vec![question("q1", 10)], 10_000).await;
        let mut rx = subscribe(&harness, &room_id).await;
        let handle = spawn_question_timer(harness.coordinator.clone(), room_id.clone());

        // when (操作): ルームをストアから削除する
        harness.store.delete_room(&room_id).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        // then (期待する結果): 公開も遷移も行われない
        let frames = drain_events(&mut rx);
        assert!(frames.iter().all(|f| f.event != events::SHOW_CORRECT_ANSWER));
        assert_eq!(
            harness.coordinator.reveal_answer(&room_id).await,
            Err(GameError::RoomNotFound)
        );
    }
}
