use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::session::state::SessionState;
use crate::store::keys;
use crate::store::operations::users::User;
use crate::store::{map_tx_error, Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuestion {
    pub user_id: i64,
    pub word_id: u64,
    pub asked_at: DateTime<Utc>,
}

impl Store {
    /// Overwrites the user's single pending question and moves the user to
    /// `WaitingAnswer` in the same transaction.
    pub fn ask_question(&self, user_id: i64, word_id: u64) -> Result<PendingQuestion, StoreError> {
        let user_key = keys::user_key(user_id);
        let question_key = keys::question_key(user_id);
        let question = PendingQuestion {
            user_id,
            word_id,
            asked_at: Utc::now(),
        };
        let question_bytes = Self::serialize(&question)?;

        (&self.users, &self.questions)
            .transaction(|(tx_users, tx_questions)| {
                let Some(raw) = tx_users.get(user_key.as_bytes())? else {
                    return sled::transaction::abort(StoreError::not_found("user", user_id));
                };
                let mut user: User = Self::tx_deserialize(&raw)?;
                user.state = SessionState::WaitingAnswer;
                user.updated_at = Utc::now();
                tx_users.insert(user_key.as_bytes(), Self::tx_serialize(&user)?)?;
                tx_questions.insert(question_key.as_bytes(), question_bytes.as_slice())?;
                Ok(())
            })
            .map_err(map_tx_error)?;

        Ok(question)
    }

    pub fn get_pending_question(&self, user_id: i64) -> Result<Option<PendingQuestion>, StoreError> {
        let key = keys::question_key(user_id);
        match self.questions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }
}
