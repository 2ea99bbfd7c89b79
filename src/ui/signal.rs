//! Graceful shutdown signal handling.

/// Ctrl+C（Unix では SIGTERM も）を待つ
///
/// `axum::serve(..).with_graceful_shutdown(..)` に渡して使う。
/// この future が完了すると新規接続の受付が止まり、処理中の
/// リクエストが終わり次第サーバーが終了する。
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
