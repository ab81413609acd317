pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub users: sled::Tree,
    pub languages: sled::Tree,
    pub language_codes: sled::Tree,
    pub words: sled::Tree,
    pub word_keys: sled::Tree,
    pub user_words: sled::Tree,
    pub questions: sled::Tree,
    pub answers: sled::Tree,
    pub meta: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl StoreError {
    pub(crate) fn not_found(entity: &str, key: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let users = db.open_tree(trees::USERS)?;
        let languages = db.open_tree(trees::LANGUAGES)?;
        let language_codes = db.open_tree(trees::LANGUAGE_CODES)?;
        let words = db.open_tree(trees::WORDS)?;
        let word_keys = db.open_tree(trees::WORD_KEYS)?;
        let user_words = db.open_tree(trees::USER_WORDS)?;
        let questions = db.open_tree(trees::QUESTIONS)?;
        let answers = db.open_tree(trees::ANSWERS)?;
        let meta = db.open_tree(trees::META)?;

        Ok(Self {
            db,
            users,
            languages,
            language_codes,
            words,
            word_keys,
            user_words,
            questions,
            answers,
            meta,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Monotonic id shared by every entity that uses numeric ids.
    pub fn next_id(&self) -> Result<u64, StoreError> {
        Ok(self.db.generate_id()?)
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialization inside a transaction closure, aborting with the store error.
    pub(crate) fn tx_serialize<T: Serialize>(
        value: &T,
    ) -> Result<Vec<u8>, ConflictableTransactionError<StoreError>> {
        Self::serialize(value).map_err(ConflictableTransactionError::Abort)
    }

    pub(crate) fn tx_deserialize<T: DeserializeOwned>(
        bytes: &[u8],
    ) -> Result<T, ConflictableTransactionError<StoreError>> {
        Self::deserialize(bytes).map_err(ConflictableTransactionError::Abort)
    }
}

pub(crate) fn map_tx_error(e: TransactionError<StoreError>) -> StoreError {
    match e {
        TransactionError::Abort(store_err) => store_err,
        TransactionError::Storage(sled_err) => StoreError::Sled(sled_err),
    }
}
