use std::sync::Arc;

use anyhow::Context;

use outfit_service_rs::{
    build_router, fetch::ensure_model_file, logging::init_logging, model::load_classifier,
    AppState, ClassifierAdapter, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env().context("invalid configuration")?;

    ensure_model_file(&config.model).await;
    let classifier = ClassifierAdapter::new(load_classifier(&config.model));
    let shared_state = Arc::new(AppState::new(classifier));

    let app = build_router(shared_state, config.body_limit_bytes);

    let addr = config.socket_addr();
    tracing::info!("Listening on http://{}", addr);
    axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind {}", addr))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
