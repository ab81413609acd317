pub mod download;
pub mod migration;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::constants;
use crate::error::QuizError;
use crate::services::notifier::{notify, Notifier};
use crate::session::state::SessionState;
use crate::store::operations::languages::Language;
use crate::store::{Store, StoreError};

use download::{Fetcher, ScratchFile};
use migration::import_file;

/// Language code to language id lookup, built once from the store.
#[derive(Debug, Clone, Default)]
pub struct LanguageCodes {
    by_code: HashMap<String, u64>,
}

impl LanguageCodes {
    pub fn from_languages(languages: &[Language]) -> Self {
        let by_code = languages
            .iter()
            .map(|l| (normalize_code(&l.code), l.id))
            .collect();
        Self { by_code }
    }

    pub fn load(store: &Store) -> Result<Self, StoreError> {
        Ok(Self::from_languages(&store.list_languages()?))
    }

    pub fn resolve(&self, code: &str) -> Option<u64> {
        self.by_code.get(&normalize_code(code)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Queued,
    Downloading,
    Migrating,
    Done,
}

#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub id: Uuid,
    pub user_id: i64,
    pub source_url: String,
    pub scratch_path: PathBuf,
    pub stage: JobStage,
}

/// Collaborators shared by every pipeline worker.
#[derive(Clone)]
pub struct PipelineContext {
    pub store: Arc<Store>,
    pub notifier: Arc<dyn Notifier>,
    pub fetcher: Arc<dyn Fetcher>,
    pub languages: Arc<LanguageCodes>,
}

struct DownloadedJob {
    job: IngestionJob,
    scratch: ScratchFile,
}

/// Handle for queueing uploaded files.
///
/// Jobs flow through two bounded queues: downloads, then imports. Each queue
/// is drained by its own fixed pool of workers. A full queue makes `submit`
/// wait; a stopped pipeline makes it fail.
#[derive(Clone)]
pub struct IngestionPipeline {
    queue: mpsc::Sender<IngestionJob>,
    scratch_dir: PathBuf,
}

impl IngestionPipeline {
    pub fn start(
        ctx: PipelineContext,
        config: &PipelineConfig,
        shutdown: &broadcast::Sender<()>,
    ) -> Result<Self, QuizError> {
        let scratch_dir = PathBuf::from(&config.scratch_dir);
        std::fs::create_dir_all(&scratch_dir).map_err(|e| {
            QuizError::TransientIo(format!("create {}: {e}", scratch_dir.display()))
        })?;

        let depth = config.queue_depth.max(1);
        let (download_tx, download_rx) = mpsc::channel::<IngestionJob>(depth);
        let (migration_tx, migration_rx) = mpsc::channel::<DownloadedJob>(depth);
        let download_rx = Arc::new(Mutex::new(download_rx));
        let migration_rx = Arc::new(Mutex::new(migration_rx));

        for worker in 0..config.download_workers.max(1) {
            let ctx = ctx.clone();
            let rx = download_rx.clone();
            let tx = migration_tx.clone();
            let mut shutdown_rx = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        job = next_job(&rx) => match job {
                            Some(job) => run_download(&ctx, &tx, job).await,
                            None => break,
                        },
                    }
                }
                tracing::debug!(worker, "Download worker stopped");
            });
        }
        drop(migration_tx);

        for worker in 0..config.migration_workers.max(1) {
            let ctx = ctx.clone();
            let rx = migration_rx.clone();
            let mut shutdown_rx = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        job = next_job(&rx) => match job {
                            Some(job) => run_migration(&ctx, job).await,
                            None => break,
                        },
                    }
                }
                tracing::debug!(worker, "Migration worker stopped");
            });
        }

        tracing::info!(
            download_workers = config.download_workers,
            migration_workers = config.migration_workers,
            queue_depth = depth,
            scratch_dir = %scratch_dir.display(),
            "Ingestion pipeline started"
        );

        Ok(Self {
            queue: download_tx,
            scratch_dir,
        })
    }

    /// Queues a download of `source_url` for `user_id`.
    pub async fn submit(&self, user_id: i64, source_url: &str) -> Result<IngestionJob, QuizError> {
        let id = Uuid::new_v4();
        let job = IngestionJob {
            id,
            user_id,
            source_url: source_url.to_string(),
            scratch_path: scratch_path(&self.scratch_dir, user_id, id),
            stage: JobStage::Queued,
        };
        self.queue
            .send(job.clone())
            .await
            .map_err(|_| QuizError::TransientIo("ingestion pipeline is not running".to_string()))?;
        tracing::info!(user_id, job_id = %id, "Ingestion job queued");
        Ok(job)
    }
}

fn scratch_path(dir: &Path, user_id: i64, job_id: Uuid) -> PathBuf {
    dir.join(format!("{user_id}_{job_id}_vocab.db"))
}

async fn next_job<T>(rx: &Mutex<mpsc::Receiver<T>>) -> Option<T> {
    rx.lock().await.recv().await
}

async fn run_download(
    ctx: &PipelineContext,
    migrations: &mpsc::Sender<DownloadedJob>,
    mut job: IngestionJob,
) {
    job.stage = JobStage::Downloading;
    let scratch = ScratchFile::new(job.scratch_path.clone());

    match ctx.fetcher.fetch(&job.source_url, scratch.path()).await {
        Ok(bytes) => {
            tracing::debug!(user_id = job.user_id, job_id = %job.id, bytes, "Download finished");
            job.stage = JobStage::Migrating;
            let user_id = job.user_id;
            if migrations.send(DownloadedJob { job, scratch }).await.is_err() {
                tracing::warn!(user_id, "Migration queue closed, dropping job");
                revert_to_upload(ctx, user_id, constants::UPLOAD_QUEUE_UNAVAILABLE).await;
            }
        }
        Err(e) => {
            tracing::warn!(user_id = job.user_id, job_id = %job.id, error = %e, "Download failed");
            drop(scratch);
            revert_to_upload(ctx, job.user_id, constants::DOWNLOAD_FAILED).await;
        }
    }
}

/// Lets the user resend a file after the job was lost before import.
async fn revert_to_upload(ctx: &PipelineContext, user_id: i64, message: &str) {
    match ctx.store.transition_state(
        user_id,
        SessionState::MigrationInProgress,
        SessionState::AwaitingUpload,
    ) {
        Ok(true) => {}
        Ok(false) => tracing::debug!(user_id, "State changed during download, leaving it"),
        Err(e) => tracing::error!(user_id, error = %e, "Failed to revert upload state"),
    }
    notify(ctx.notifier.as_ref(), user_id, message).await;
}

async fn run_migration(ctx: &PipelineContext, downloaded: DownloadedJob) {
    let DownloadedJob { mut job, scratch } = downloaded;
    let result = import_file(&ctx.store, &ctx.languages, job.user_id, scratch.path()).await;
    drop(scratch);
    job.stage = JobStage::Done;

    match ctx.store.transition_state(
        job.user_id,
        SessionState::MigrationInProgress,
        SessionState::ReadyForQuestion,
    ) {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(user_id = job.user_id, "State changed during migration, leaving it")
        }
        Err(e) => tracing::error!(user_id = job.user_id, error = %e, "Failed to finish migration state"),
    }

    let message = match result {
        Ok(report) => {
            tracing::info!(
                user_id = job.user_id,
                job_id = %job.id,
                rows = report.rows,
                imported = report.imported,
                already_linked = report.already_linked,
                skipped_unknown_language = report.skipped_unknown_language,
                failed_rows = report.failed_rows,
                truncated = report.truncated,
                "Migration completed"
            );
            report.summary()
        }
        Err(e) => {
            tracing::warn!(user_id = job.user_id, job_id = %job.id, error = %e, "Migration failed");
            constants::MIGRATION_FAILED.to_string()
        }
    };
    notify(ctx.notifier.as_ref(), job.user_id, &message).await;
}
