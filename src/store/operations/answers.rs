use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::session::state::SessionState;
use crate::store::keys;
use crate::store::operations::questions::PendingQuestion;
use crate::store::operations::users::User;
use crate::store::operations::words::UserWord;
use crate::store::{map_tx_error, Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    pub user_id: i64,
    pub word_id: u64,
    pub correct: bool,
    pub guess: String,
    pub translation: String,
    /// Target language the guess was graded against.
    pub language_id: u64,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Settles the user's pending question with a graded answer.
    ///
    /// In one transaction: the question must still point at `answer.word_id`,
    /// the answer is appended, the per-user word counter is bumped, the
    /// question is removed and the user returns to `ReadyForQuestion`.
    pub fn record_answer(&self, answer: &Answer) -> Result<(), StoreError> {
        let user_id = answer.user_id;
        let user_key = keys::user_key(user_id);
        let question_key = keys::question_key(user_id);
        let link_key = keys::user_word_key(user_id, answer.word_id);
        let answer_key = keys::answer_key(user_id, answer.created_at.timestamp_millis(), &answer.id);
        let answer_bytes = Self::serialize(answer)?;

        (&self.users, &self.questions, &self.answers, &self.user_words)
            .transaction(|(tx_users, tx_questions, tx_answers, tx_user_words)| {
                let Some(raw_question) = tx_questions.get(question_key.as_bytes())? else {
                    return sled::transaction::abort(StoreError::not_found(
                        "pending_question",
                        user_id,
                    ));
                };
                let question: PendingQuestion = Self::tx_deserialize(&raw_question)?;
                if question.word_id != answer.word_id {
                    return sled::transaction::abort(StoreError::Conflict {
                        entity: "pending_question".to_string(),
                        key: user_id.to_string(),
                    });
                }

                let Some(raw_user) = tx_users.get(user_key.as_bytes())? else {
                    return sled::transaction::abort(StoreError::not_found("user", user_id));
                };
                let mut user: User = Self::tx_deserialize(&raw_user)?;

                tx_answers.insert(answer_key.as_bytes(), answer_bytes.as_slice())?;

                if let Some(raw_link) = tx_user_words.get(link_key.as_bytes())? {
                    let mut link: UserWord = Self::tx_deserialize(&raw_link)?;
                    if answer.correct {
                        link.correct_answers = link.correct_answers.saturating_add(1);
                    } else {
                        link.incorrect_answers = link.incorrect_answers.saturating_add(1);
                    }
                    tx_user_words.insert(link_key.as_bytes(), Self::tx_serialize(&link)?)?;
                }

                tx_questions.remove(question_key.as_bytes())?;
                user.state = SessionState::ReadyForQuestion;
                user.updated_at = Utc::now();
                tx_users.insert(user_key.as_bytes(), Self::tx_serialize(&user)?)?;
                Ok(())
            })
            .map_err(map_tx_error)
    }

    /// Most recent answers first.
    pub fn list_answers(&self, user_id: i64, limit: usize) -> Result<Vec<Answer>, StoreError> {
        let prefix = keys::answer_prefix(user_id);
        let mut answers = Vec::new();
        for item in self.answers.scan_prefix(prefix.as_bytes()).take(limit) {
            let (_, value) = item?;
            answers.push(Self::deserialize::<Answer>(&value)?);
        }
        Ok(answers)
    }
}
