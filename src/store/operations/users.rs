use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::session::state::SessionState;
use crate::store::keys;
use crate::store::{map_tx_error, Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub state: SessionState,
    pub language_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Returns the stored user, creating it on first contact.
    ///
    /// Creation is a compare-and-swap on the user key, so two concurrent first
    /// messages from the same user still produce a single record.
    pub fn get_or_create_user(
        &self,
        user_id: i64,
        default_language_id: u64,
    ) -> Result<User, StoreError> {
        if let Some(user) = self.get_user(user_id)? {
            return Ok(user);
        }

        let now = Utc::now();
        let user = User {
            id: user_id,
            state: SessionState::ReadyForQuestion,
            language_id: default_language_id,
            created_at: now,
            updated_at: now,
        };
        let key = keys::user_key(user_id);
        let cas_result = self.users.compare_and_swap(
            key.as_bytes(),
            None::<&[u8]>,
            Some(Self::serialize(&user)?),
        )?;

        match cas_result {
            Ok(()) => {
                tracing::info!(user_id, "Created user");
                Ok(user)
            }
            Err(current) => match current.current {
                Some(raw) => Self::deserialize(&raw),
                None => Err(StoreError::Conflict {
                    entity: "user".to_string(),
                    key,
                }),
            },
        }
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let key = keys::user_key(user_id);
        match self.users.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Atomic read-modify-write of a user's session.
    ///
    /// `apply` returns `false` to leave the user untouched. Whenever the
    /// resulting state cannot hold a question, the pending question is removed
    /// in the same transaction. Returns the written user, or `None` when
    /// `apply` declined.
    pub fn update_session<F>(&self, user_id: i64, apply: F) -> Result<Option<User>, StoreError>
    where
        F: Fn(&mut User) -> bool,
    {
        let user_key = keys::user_key(user_id);
        let question_key = keys::question_key(user_id);

        (&self.users, &self.questions)
            .transaction(|(tx_users, tx_questions)| {
                let Some(raw) = tx_users.get(user_key.as_bytes())? else {
                    return sled::transaction::abort(StoreError::not_found("user", user_id));
                };
                let mut user: User = Self::tx_deserialize(&raw)?;
                if !apply(&mut user) {
                    return Ok(None);
                }
                user.updated_at = Utc::now();
                tx_users.insert(user_key.as_bytes(), Self::tx_serialize(&user)?)?;
                if !user.state.holds_question() {
                    tx_questions.remove(question_key.as_bytes())?;
                }
                Ok(Some(user))
            })
            .map_err(map_tx_error)
    }

    /// Unconditionally moves the user to `state`.
    pub fn set_user_state(&self, user_id: i64, state: SessionState) -> Result<User, StoreError> {
        self.update_session(user_id, |user| {
            user.state = state;
            true
        })?
        .ok_or_else(|| StoreError::not_found("user", user_id))
    }

    /// Moves the user from `from` to `to`; returns `false` if the user was no
    /// longer in `from` when the write happened.
    pub fn transition_state(
        &self,
        user_id: i64,
        from: SessionState,
        to: SessionState,
    ) -> Result<bool, StoreError> {
        let written = self.update_session(user_id, |user| {
            if user.state != from {
                return false;
            }
            user.state = to;
            true
        })?;
        Ok(written.is_some())
    }

    /// Sets the target language and returns the user to `ReadyForQuestion`
    /// in one write, provided the user is still choosing a language.
    pub fn choose_language(&self, user_id: i64, language_id: u64) -> Result<bool, StoreError> {
        let written = self.update_session(user_id, |user| {
            if user.state != SessionState::AwaitingLanguage {
                return false;
            }
            user.language_id = language_id;
            user.state = SessionState::ReadyForQuestion;
            true
        })?;
        Ok(written.is_some())
    }
}
