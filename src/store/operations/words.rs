use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::store::keys;
use crate::store::{map_tx_error, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: u64,
    pub text: String,
    pub stem: String,
    pub language_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWord {
    pub user_id: i64,
    pub word_id: u64,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportedWord {
    pub word_id: u64,
    /// The word did not exist under its natural key before.
    pub created: bool,
    /// The user was not linked to the word before.
    pub linked: bool,
}

impl Store {
    /// Inserts the word unless its natural key exists; returns the id either way.
    pub fn upsert_word(&self, text: &str, stem: &str, language_id: u64) -> Result<u64, StoreError> {
        let natural_key = keys::word_natural_key(language_id, text, stem);
        let candidate = Word {
            id: self.next_id()?,
            text: text.to_string(),
            stem: stem.to_string(),
            language_id,
        };
        let word_key = keys::word_key(candidate.id);
        let word_bytes = Self::serialize(&candidate)?;
        let id_bytes = candidate.id.to_be_bytes();

        (&self.words, &self.word_keys)
            .transaction(|(tx_words, tx_keys)| {
                if let Some(raw) = tx_keys.get(natural_key.as_bytes())? {
                    return Ok(keys::decode_id(&raw));
                }
                tx_words.insert(word_key.as_bytes(), word_bytes.as_slice())?;
                tx_keys.insert(natural_key.as_bytes(), &id_bytes[..])?;
                Ok(candidate.id)
            })
            .map_err(map_tx_error)
    }

    /// Links a word to the user. Returns `false` if the link already existed.
    pub fn link_word(&self, user_id: i64, word_id: u64) -> Result<bool, StoreError> {
        let key = keys::user_word_key(user_id, word_id);
        let link = UserWord {
            user_id,
            word_id,
            correct_answers: 0,
            incorrect_answers: 0,
            added_at: Utc::now(),
        };
        let cas = self.user_words.compare_and_swap(
            key.as_bytes(),
            None::<&[u8]>,
            Some(Self::serialize(&link)?),
        )?;
        Ok(cas.is_ok())
    }

    /// Upserts the word and links it to the user as one transaction, so a
    /// membership never exists without its word.
    pub fn import_word(
        &self,
        user_id: i64,
        text: &str,
        stem: &str,
        language_id: u64,
    ) -> Result<ImportedWord, StoreError> {
        let natural_key = keys::word_natural_key(language_id, text, stem);
        let candidate = Word {
            id: self.next_id()?,
            text: text.to_string(),
            stem: stem.to_string(),
            language_id,
        };
        let word_key = keys::word_key(candidate.id);
        let word_bytes = Self::serialize(&candidate)?;
        let id_bytes = candidate.id.to_be_bytes();
        let added_at = Utc::now();

        (&self.words, &self.word_keys, &self.user_words)
            .transaction(|(tx_words, tx_keys, tx_user_words)| {
                let (word_id, created) = match tx_keys.get(natural_key.as_bytes())? {
                    Some(raw) => (keys::decode_id(&raw), false),
                    None => {
                        tx_words.insert(word_key.as_bytes(), word_bytes.as_slice())?;
                        tx_keys.insert(natural_key.as_bytes(), &id_bytes[..])?;
                        (candidate.id, true)
                    }
                };

                let link_key = keys::user_word_key(user_id, word_id);
                let linked = if tx_user_words.get(link_key.as_bytes())?.is_some() {
                    false
                } else {
                    let link = UserWord {
                        user_id,
                        word_id,
                        correct_answers: 0,
                        incorrect_answers: 0,
                        added_at,
                    };
                    tx_user_words.insert(link_key.as_bytes(), Self::tx_serialize(&link)?)?;
                    true
                };

                Ok(ImportedWord {
                    word_id,
                    created,
                    linked,
                })
            })
            .map_err(map_tx_error)
    }

    pub fn get_word(&self, word_id: u64) -> Result<Option<Word>, StoreError> {
        let key = keys::word_key(word_id);
        match self.words.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_user_word(&self, user_id: i64, word_id: u64) -> Result<Option<UserWord>, StoreError> {
        let key = keys::user_word_key(user_id, word_id);
        match self.user_words.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn count_user_words(&self, user_id: i64) -> Result<usize, StoreError> {
        let prefix = keys::user_word_prefix(user_id);
        let mut count = 0usize;
        for item in self.user_words.scan_prefix(prefix.as_bytes()) {
            let _ = item?;
            count += 1;
        }
        Ok(count)
    }

    /// Picks a linked word by skipping a random offset into the user's links.
    ///
    /// The offset is drawn over the count of all words, not the user's own
    /// links, so a user holding a small share of the table can draw an offset
    /// past their last link and get `None` even though they have words. The
    /// two passes are not atomic: a word added in between only widens the
    /// range.
    pub fn pick_random_word_id(&self, user_id: i64) -> Result<Option<u64>, StoreError> {
        let total = self.words.len();
        if total == 0 {
            return Ok(None);
        }
        let offset = rand::thread_rng().gen_range(0..total);

        let prefix = keys::user_word_prefix(user_id);
        match self.user_words.scan_prefix(prefix.as_bytes()).nth(offset) {
            Some(item) => {
                let (_, value) = item?;
                let link: UserWord = Self::deserialize(&value)?;
                Ok(Some(link.word_id))
            }
            None => Ok(None),
        }
    }
}
