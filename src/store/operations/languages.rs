use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::store::keys;
use crate::store::{map_tx_error, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub id: u64,
    pub code: String,
    pub english_name: String,
    pub localized_name: String,
}

impl Store {
    /// Inserts a language unless its code is already registered. Returns the
    /// stored language either way.
    pub fn seed_language(&self, language: &Language) -> Result<Language, StoreError> {
        let code_key = keys::language_code_key(&language.code);
        if code_key.is_empty() {
            return Err(StoreError::Validation("language code is empty".to_string()));
        }
        let language_key = keys::language_key(language.id);
        let language_bytes = Self::serialize(language)?;
        let id_bytes = language.id.to_be_bytes();

        let existing_id = (&self.languages, &self.language_codes)
            .transaction(|(tx_languages, tx_codes)| {
                if let Some(raw) = tx_codes.get(code_key.as_bytes())? {
                    return Ok(Some(keys::decode_id(&raw)));
                }
                tx_languages.insert(language_key.as_bytes(), language_bytes.as_slice())?;
                tx_codes.insert(code_key.as_bytes(), &id_bytes[..])?;
                Ok(None)
            })
            .map_err(map_tx_error)?;

        match existing_id {
            Some(id) => self
                .get_language(id)?
                .ok_or_else(|| StoreError::not_found("language", id)),
            None => Ok(language.clone()),
        }
    }

    pub fn get_language(&self, language_id: u64) -> Result<Option<Language>, StoreError> {
        let key = keys::language_key(language_id);
        match self.languages.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_language_by_code(&self, code: &str) -> Result<Option<Language>, StoreError> {
        let key = keys::language_code_key(code);
        if key.is_empty() {
            return Ok(None);
        }
        match self.language_codes.get(key.as_bytes())? {
            Some(raw) => self.get_language(keys::decode_id(&raw)),
            None => Ok(None),
        }
    }

    /// All languages ordered by id.
    pub fn list_languages(&self) -> Result<Vec<Language>, StoreError> {
        let mut languages = Vec::with_capacity(self.languages.len());
        for item in self.languages.iter() {
            let (_, value) = item?;
            languages.push(Self::deserialize::<Language>(&value)?);
        }
        Ok(languages)
    }
}
