use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use vocab_quiz::config::{Config, NotifierConfig, PipelineConfig, TranslatorConfig};
use vocab_quiz::ingest::download::Fetcher;
use vocab_quiz::ingest::{IngestionPipeline, LanguageCodes, PipelineContext};
use vocab_quiz::quiz::QuizEngine;
use vocab_quiz::routes::build_router;
use vocab_quiz::session::{InboundEvent, SessionController};
use vocab_quiz::state::AppState;
use vocab_quiz::store::Store;

use super::doubles::{LocalFileFetcher, RecordingNotifier, StaticOracle};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub store: Arc<Store>,
    pub controller: SessionController,
    pub pipeline: IngestionPipeline,
    pub notifier: Arc<RecordingNotifier>,
    pub oracle: Arc<StaticOracle>,
    pub languages: Arc<LanguageCodes>,
    pub shutdown_tx: broadcast::Sender<()>,
    temp_dir: TempDir,
}

impl TestApp {
    /// Sends one chat message and waits for it to be fully handled.
    pub async fn say(&self, user_id: i64, text: &str) {
        self.controller
            .handle(InboundEvent {
                user_id,
                text: text.to_string(),
                document_url: None,
            })
            .await
            .expect("handle text event");
    }

    pub async fn send_document(&self, user_id: i64, url: &str) {
        self.controller
            .handle(InboundEvent {
                user_id,
                text: String::new(),
                document_url: Some(url.to_string()),
            })
            .await
            .expect("handle document event");
    }

    /// A path inside the app's temp dir, outside the scratch directory.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.pipeline.scratch_dir)
    }

    pub fn scratch_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.scratch_dir()) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_oracle(StaticOracle::default()).await
}

pub async fn spawn_with_oracle(oracle: StaticOracle) -> TestApp {
    spawn_with(oracle, Arc::new(LocalFileFetcher)).await
}

pub async fn spawn_with_fetcher(fetcher: Arc<dyn Fetcher>) -> TestApp {
    spawn_with(StaticOracle::default(), fetcher).await
}

async fn spawn_with(oracle: StaticOracle, fetcher: Arc<dyn Fetcher>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("vocab-quiz-test.sled");
    let scratch_dir = temp_dir.path().join("scratch");

    // Built directly instead of through env vars so parallel tests don't race.
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        default_language: "en".to_string(),
        pipeline: PipelineConfig {
            scratch_dir: scratch_dir.to_string_lossy().to_string(),
            ..PipelineConfig::default()
        },
        translator: TranslatorConfig {
            api_url: "http://127.0.0.1:9/translate".to_string(),
            timeout_secs: 1,
            max_attempts: 1,
            retry_delay_ms: 1,
        },
        notifier: NotifierConfig::default(),
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let languages = Arc::new(LanguageCodes::load(&store).expect("load languages"));
    let default_language_id = languages.resolve("en").expect("en is seeded");

    let notifier = Arc::new(RecordingNotifier::default());
    let oracle = Arc::new(oracle);
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

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
    .expect("start pipeline");

    let quiz = QuizEngine::new(store.clone(), oracle.clone(), notifier.clone());
    let controller = SessionController::new(
        store.clone(),
        quiz,
        pipeline.clone(),
        notifier.clone(),
        languages.clone(),
        default_language_id,
    );

    let state = AppState::new(store.clone(), controller.clone(), &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        store,
        controller,
        pipeline,
        notifier,
        oracle,
        languages,
        shutdown_tx,
        temp_dir,
    }
}
