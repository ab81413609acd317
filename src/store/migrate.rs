use crate::store::operations::languages::Language;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

/// `(id, code, english name, localized name)`
const SEED_LANGUAGES: &[(u64, &str, &str, &str)] = &[
    (1, "ru", "Russian", "Русский"),
    (2, "en", "English", "English"),
    (3, "es", "Spanish", "Español"),
    (4, "de", "German", "Deutsch"),
    (5, "fr", "French", "Français"),
    (6, "it", "Italian", "Italiano"),
    (7, "pt", "Portuguese", "Português"),
    (8, "nl", "Dutch", "Nederlands"),
    (9, "pl", "Polish", "Polski"),
    (10, "uk", "Ukrainian", "Українська"),
    (11, "ja", "Japanese", "日本語"),
    (12, "zh", "Chinese", "中文"),
    (13, "ko", "Korean", "한국어"),
    (14, "tr", "Turkish", "Türkçe"),
    (15, "sv", "Swedish", "Svenska"),
];

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_seed_languages", m002_seed_languages),
    ]
}

/// Applies every migration newer than the stored version.
///
/// Each migration must be idempotent: the process can die after a migration
/// ran but before its version was persisted. Versions only move forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("stored version has {} bytes, expected 4", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

fn m002_seed_languages(store: &Store) -> Result<(), StoreError> {
    for (id, code, english_name, localized_name) in SEED_LANGUAGES {
        store.seed_language(&Language {
            id: *id,
            code: code.to_string(),
            english_name: english_name.to_string(),
            localized_name: localized_name.to_string(),
        })?;
    }
    Ok(())
}
