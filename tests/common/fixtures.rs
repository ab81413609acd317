use std::path::{Path, PathBuf};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};

/// One row of a Kindle `WORDS` table: `(word, stem, lang)`.
pub type VocabRow<'a> = (&'a str, &'a str, &'a str);

/// Writes a minimal Kindle vocabulary export at `path`.
pub async fn write_vocab_db(path: &Path, rows: &[VocabRow<'_>]) -> PathBuf {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .expect("create vocab db");

    sqlx::query(
        "CREATE TABLE WORDS (id TEXT PRIMARY KEY NOT NULL, word TEXT, stem TEXT, lang TEXT, \
         category INTEGER DEFAULT 0, timestamp INTEGER DEFAULT 0, profileid TEXT)",
    )
    .execute(&mut conn)
    .await
    .expect("create WORDS table");

    for (index, (word, stem, lang)) in rows.iter().enumerate() {
        sqlx::query("INSERT INTO WORDS (id, word, stem, lang) VALUES (?, ?, ?, ?)")
            .bind(format!("{lang}:{stem}:{index}"))
            .bind(*word)
            .bind(*stem)
            .bind(*lang)
            .execute(&mut conn)
            .await
            .expect("insert vocab row");
    }

    conn.close().await.expect("close vocab db");
    path.to_path_buf()
}

/// A file with a `.db` name that is not SQLite at all.
pub fn write_garbage_file(path: &Path) -> PathBuf {
    std::fs::write(path, b"this is a kindle screenshot, not a database").expect("write garbage");
    path.to_path_buf()
}

pub fn url_for(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
