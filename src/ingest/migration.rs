use std::path::Path;

use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Connection, Row, SqliteConnection};

use crate::constants::IMPORT_QUERY;
use crate::error::QuizError;
use crate::ingest::LanguageCodes;
use crate::store::Store;

/// Counters for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub rows: usize,
    pub imported: usize,
    pub already_linked: usize,
    pub skipped_unknown_language: usize,
    pub failed_rows: usize,
    /// Reading stopped on an error after some rows were already imported.
    pub truncated: bool,
}

impl MigrationReport {
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Migration completed. {} new words imported, {} were already in your list.",
            self.imported, self.already_linked
        );
        let skipped = self.skipped_unknown_language + self.failed_rows;
        if skipped > 0 {
            text.push_str(&format!(" {} rows skipped.", skipped));
        }
        text.push_str(" Press /quiz to start a game.");
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Imported,
    AlreadyLinked,
    UnknownLanguage,
}

/// Imports every row of a vocabulary export into the user's word list.
///
/// Rows are independent: an unknown language code or a malformed row is
/// counted and skipped. Only a file that cannot be read at all fails the
/// whole import.
pub async fn import_file(
    store: &Store,
    languages: &LanguageCodes,
    user_id: i64,
    path: &Path,
) -> Result<MigrationReport, QuizError> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| QuizError::InvalidImport(e.to_string()))?;

    let mut report = MigrationReport::default();
    let read_result = {
        let mut rows = sqlx::query(IMPORT_QUERY).fetch(&mut conn);
        loop {
            let row = match rows.try_next().await {
                Ok(Some(row)) => row,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };
            report.rows += 1;
            match import_row(store, languages, user_id, report.rows, &row) {
                Ok(RowOutcome::Imported) => report.imported += 1,
                Ok(RowOutcome::AlreadyLinked) => report.already_linked += 1,
                Ok(RowOutcome::UnknownLanguage) => report.skipped_unknown_language += 1,
                Err(e) => {
                    report.failed_rows += 1;
                    tracing::warn!(user_id, error = %e, "Skipping import row");
                }
            }
        }
    };

    if let Err(e) = conn.close().await {
        tracing::debug!(user_id, error = %e, "Failed to close import file");
    }

    match read_result {
        Ok(()) => Ok(report),
        Err(e) if report.rows == 0 => Err(QuizError::InvalidImport(e.to_string())),
        Err(e) => {
            tracing::warn!(user_id, rows = report.rows, error = %e, "Import stopped early");
            report.truncated = true;
            Ok(report)
        }
    }
}

fn import_row(
    store: &Store,
    languages: &LanguageCodes,
    user_id: i64,
    index: usize,
    row: &SqliteRow,
) -> Result<RowOutcome, QuizError> {
    let row_error = |reason: String| QuizError::ImportRow { row: index, reason };

    let text: Option<String> = row.try_get("word").map_err(|e| row_error(e.to_string()))?;
    let stem: Option<String> = row.try_get("stem").map_err(|e| row_error(e.to_string()))?;
    let code: Option<String> = row.try_get("lang").map_err(|e| row_error(e.to_string()))?;

    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| row_error("empty word".to_string()))?;
    let stem = stem.map(|s| s.trim().to_string()).unwrap_or_default();

    let Some(language_id) = code.as_deref().and_then(|c| languages.resolve(c)) else {
        tracing::debug!(user_id, row = index, code = ?code, "Unknown language code, skipping row");
        return Ok(RowOutcome::UnknownLanguage);
    };

    let imported = store
        .import_word(user_id, &text, &stem, language_id)
        .map_err(|e| row_error(e.to_string()))?;

    if imported.linked {
        Ok(RowOutcome::Imported)
    } else {
        Ok(RowOutcome::AlreadyLinked)
    }
}
