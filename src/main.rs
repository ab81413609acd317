use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use vocab_quiz::config::Config;
use vocab_quiz::ingest::download::HttpFetcher;
use vocab_quiz::ingest::{IngestionPipeline, LanguageCodes, PipelineContext};
use vocab_quiz::logging::{init_tracing, LogConfig};
use vocab_quiz::quiz::QuizEngine;
use vocab_quiz::routes::build_router;
use vocab_quiz::services::notifier;
use vocab_quiz::services::translator::GoogleTranslator;
use vocab_quiz::session::SessionController;
use vocab_quiz::state::AppState;
use vocab_quiz::store::Store;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig::from(&config));
    tracing::info!("Starting vocab-quiz");

    let store = Arc::new(Store::open(&config.sled_path).expect("Failed to open sled database"));
    store.run_migrations().expect("Failed to run migrations");

    let languages = Arc::new(LanguageCodes::load(&store).expect("Failed to load languages"));
    let default_language_id = languages
        .resolve(&config.default_language)
        .unwrap_or_else(|| {
            panic!(
                "FATAL: DEFAULT_LANGUAGE '{}' is not a known language code",
                config.default_language
            )
        });

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let notifier = notifier::from_config(&config.notifier);
    let oracle = Arc::new(GoogleTranslator::new(&config.translator));
    let fetcher = Arc::new(HttpFetcher::new(config.pipeline.download_timeout_secs));

    let pipeline = IngestionPipeline::start(
        PipelineContext {
            store: store.clone(),
            notifier: notifier.clone(),
            fetcher,
            languages: languages.clone(),
        },
        &config.pipeline,
        &shutdown_tx,
    )
    .expect("Failed to start ingestion pipeline");

    let quiz = QuizEngine::new(store.clone(), oracle, notifier.clone());
    let controller = SessionController::new(
        store.clone(),
        quiz,
        pipeline,
        notifier,
        languages,
        default_language_id,
    );

    let state = AppState::new(store.clone(), controller, &config);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");

    let server_future = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()));

    if let Err(e) = server_future.await {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
