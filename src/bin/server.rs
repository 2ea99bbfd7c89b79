//! Real-time quiz room server.
//!
//! Hosts multiplayer quiz rooms: room creation and joining over the HTTP API,
//! game progress (questions, answers, leaderboard) over WebSocket events.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;

use hiroba::{
    common::{logger::setup_logger, time::SystemClock},
    domain::{QuestionSource, UntimedPolicy},
    infrastructure::{
        collaborators::{InMemoryQuestionBank, InMemoryUserDirectory, LoggingGameArchive},
        gateway::WebSocketEventPusher,
        generative::{GenerativeConfig, GenerativeQuestionSource, RoutingQuestionSource},
        presence::InMemoryPresenceRegistry,
        store::{InMemoryRoomStore, RetryPolicy, RetryingStore},
    },
    ui::Server,
    usecase::{GameConfig, LockRegistry, RoomService, SessionCoordinator},
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Real-time quiz room server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Seconds the correct answer stays on screen before the next question
    #[arg(long, default_value = "5")]
    reveal_delay: u64,

    /// Milliseconds between question deadline checks
    #[arg(long, default_value = "1000")]
    timer_tick: u64,

    /// How untimed questions are scored: "zero-score" (correctness counts,
    /// no points) or "unscored" (correctness is not counted either)
    #[arg(long, default_value = "zero-score")]
    untimed_policy: String,

    /// Retry attempts for a transient store failure before giving up
    #[arg(long, default_value = "3")]
    store_retries: u32,

    /// Milliseconds of base backoff between store retries (doubled per attempt)
    #[arg(long, default_value = "50")]
    retry_base_delay: u64,

    /// Base URL of an OpenAI-compatible API for question generation.
    /// Enables the "generated" category; the key is read from GENERATIVE_API_KEY.
    #[arg(long)]
    generative_endpoint: Option<String>,

    /// Model name used for question generation
    #[arg(long, default_value = GenerativeConfig::DEFAULT_MODEL)]
    generative_model: String,
}

/// Store retry policy assembled from the game tuning config
fn store_retry_policy(config: &GameConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: config.store_retries,
        base_delay: config.store_retry_base_delay,
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let untimed_policy = match args.untimed_policy.as_str() {
        "zero-score" => UntimedPolicy::ZeroScore,
        "unscored" => UntimedPolicy::Unscored,
        other => {
            tracing::error!(
                "Unknown --untimed-policy '{}' (expected zero-score | unscored)",
                other
            );
            std::process::exit(1);
        }
    };

    let config = GameConfig {
        reveal_delay: Duration::from_secs(args.reveal_delay),
        timer_tick: Duration::from_millis(args.timer_tick),
        untimed_policy,
        store_retries: args.store_retries,
        store_retry_base_delay: Duration::from_millis(args.retry_base_delay),
    };

    // Initialize dependencies in order:
    // 1. RoomStore
    // 2. EventPusher / PresenceRegistry
    // 3. Collaborator ports (users / questions / archive)
    // 4. UseCases
    // 5. Server

    // 1. Create RoomStore (in-memory, with retry on transient failures)
    let store = Arc::new(RetryingStore::new(
        InMemoryRoomStore::new(),
        store_retry_policy(&config),
    ));

    // 2. Create EventPusher (WebSocket implementation) and PresenceRegistry
    let pusher = Arc::new(WebSocketEventPusher::new());
    let presence = Arc::new(InMemoryPresenceRegistry::new());

    // 3. Create collaborator ports
    let users = Arc::new(InMemoryUserDirectory::permissive());
    let bank: Arc<dyn QuestionSource> = Arc::new(InMemoryQuestionBank::with_sample_questions());
    let questions: Arc<dyn QuestionSource> = match args.generative_endpoint {
        Some(endpoint) => {
            let api_key = std::env::var("GENERATIVE_API_KEY").unwrap_or_default();
            if api_key.is_empty() {
                tracing::warn!("GENERATIVE_API_KEY is not set; generated questions will fail");
            }
            tracing::info!("Question generation enabled via {}", endpoint);
            let generative = Arc::new(GenerativeQuestionSource::new(GenerativeConfig {
                endpoint,
                api_key,
                model: args.generative_model,
            }));
            Arc::new(RoutingQuestionSource::new(bank, generative))
        }
        None => bank,
    };
    let archive = Arc::new(LoggingGameArchive::default());

    // 4. Create UseCases
    let locks = Arc::new(LockRegistry::new());
    let clock = Arc::new(SystemClock);
    let coordinator = Arc::new(SessionCoordinator::new(
        store.clone(),
        pusher.clone(),
        archive,
        locks,
        clock.clone(),
        config,
    ));
    let room_service = Arc::new(RoomService::new(
        store,
        users.clone(),
        questions,
        coordinator.clone(),
        clock,
    ));

    // 5. Create and run the server
    let server = Server::new(coordinator, room_service, users, presence, pusher);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_store_retry_defaults() {
        // テスト項目: リトライ関連フラグの既定値は 3 回・基準 50ms
        let args = Args::try_parse_from(["server"]).unwrap();

        assert_eq!(args.store_retries, 3);
        assert_eq!(args.retry_base_delay, 50);
    }

    #[test]
    fn test_store_retry_flags_reach_policy() {
        // テスト項目: --store-retries / --retry-base-delay が RetryPolicy に反映される
        // given (前提条件): 両フラグを指定して起動
        let args = Args::try_parse_from([
            "server",
            "--store-retries",
            "5",
            "--retry-base-delay",
            "10",
        ])
        .unwrap();

        // when (操作): チューニング設定からリトライ方針を組み立てる
        let config = GameConfig {
            store_retries: args.store_retries,
            store_retry_base_delay: Duration::from_millis(args.retry_base_delay),
            ..GameConfig::default()
        };
        let policy = store_retry_policy(&config);

        // then (期待する結果): 指定した回数と待ち時間が方針に写る
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(10));
    }
}
