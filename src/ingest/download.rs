use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::QuizError;

/// Fetches the file behind a URL to a local path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the number of bytes written to `dest`.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, QuizError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, QuizError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| QuizError::TransientIo(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizError::TransientIo(format!("unexpected status {status}")));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| QuizError::TransientIo(format!("create {}: {e}", dest.display())))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| QuizError::TransientIo(format!("read body: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| QuizError::TransientIo(format!("write {}: {e}", dest.display())))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| QuizError::TransientIo(format!("flush {}: {e}", dest.display())))?;

        Ok(written)
    }
}

/// Owns a scratch path and removes the file when dropped, whatever happened
/// to the job in between.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file")
            }
        }
    }
}
