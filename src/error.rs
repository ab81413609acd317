use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by the quiz engine, the session controller and the
/// ingestion pipeline.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no words found for user {user_id}")]
    NoWordsFound { user_id: i64 },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("transient io error: {0}")]
    TransientIo(String),
    #[error("external service error: {0}")]
    ExternalService(String),
    #[error("import row {row} rejected: {reason}")]
    ImportRow { row: usize, reason: String },
    #[error("import file unreadable: {0}")]
    InvalidImport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QuizError {
    /// Errors the user can fix by trying again or changing input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
