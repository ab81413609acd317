use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use vocab_quiz::error::QuizError;
use vocab_quiz::ingest::download::Fetcher;
use vocab_quiz::services::notifier::{Notifier, NotifyError};
use vocab_quiz::services::translator::{TranslateError, TranslationOracle};

/// Keeps every delivered message in order.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingNotifier {
    pub fn messages_for(&self, user_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .expect("notifier lock")
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_for(&self, user_id: i64) -> Option<String> {
        self.messages_for(user_id).pop()
    }

    pub fn count_for(&self, user_id: i64) -> usize {
        self.messages_for(user_id).len()
    }

    /// Polls until `user_id` has received at least `count` messages.
    pub async fn wait_for_count(&self, user_id: i64, count: usize) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let messages = self.messages_for(user_id);
            if messages.len() >= count {
                return messages;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} messages to user {user_id}, got {messages:?}"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((user_id, text.to_string()));
        Ok(())
    }
}

/// Translates from a fixed table; can be switched into a failing mode.
#[derive(Default)]
pub struct StaticOracle {
    table: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticOracle {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        let oracle = Self::default();
        for (word, translation) in pairs {
            oracle.insert(word, translation);
        }
        oracle
    }

    pub fn insert(&self, word: &str, translation: &str) {
        self.table
            .lock()
            .expect("oracle lock")
            .insert(word.to_string(), translation.to_string());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationOracle for StaticOracle {
    async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TranslateError::Exhausted {
                attempts: 5,
                last: "translator network error: connection refused".to_string(),
            });
        }
        self.table
            .lock()
            .expect("oracle lock")
            .get(text)
            .cloned()
            .ok_or_else(|| TranslateError::Malformed(format!("no translation for {text}")))
    }
}

/// Treats the URL as a local path and copies it into the scratch location.
#[derive(Default)]
pub struct LocalFileFetcher;

#[async_trait]
impl Fetcher for LocalFileFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, QuizError> {
        tokio::fs::copy(url, dest)
            .await
            .map_err(|e| QuizError::TransientIo(format!("copy {url}: {e}")))
    }
}

/// Copies like [`LocalFileFetcher`] but holds every call at a gate until
/// permits are released, tracking how many calls are inside at once.
pub struct GatedFetcher {
    gate: Arc<Semaphore>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
}

impl Default for GatedFetcher {
    fn default() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        }
    }
}

impl GatedFetcher {
    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Polls until `count` calls are blocked at the gate.
    pub async fn wait_for_in_flight(&self, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while self.in_flight() < count {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} fetches in flight, got {}",
                self.in_flight()
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, QuizError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let permit = self.gate.acquire().await;
        let result = tokio::fs::copy(url, dest)
            .await
            .map_err(|e| QuizError::TransientIo(format!("copy {url}: {e}")));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        drop(permit);
        result
    }
}
