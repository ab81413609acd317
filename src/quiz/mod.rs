pub mod grading;

use std::sync::Arc;

use chrono::Utc;

use crate::constants;
use crate::error::QuizError;
use crate::services::notifier::{notify, Notifier};
use crate::services::translator::TranslationOracle;
use crate::store::operations::answers::Answer;
use crate::store::operations::languages::Language;
use crate::store::operations::users::User;
use crate::store::operations::words::Word;
use crate::store::{Store, StoreError};

/// Outcome of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub word_id: u64,
    pub correct: bool,
    pub translation: String,
}

/// Picks words to ask and grades answers against the translation oracle.
#[derive(Clone)]
pub struct QuizEngine {
    store: Arc<Store>,
    oracle: Arc<dyn TranslationOracle>,
    notifier: Arc<dyn Notifier>,
}

impl QuizEngine {
    pub fn new(
        store: Arc<Store>,
        oracle: Arc<dyn TranslationOracle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            oracle,
            notifier,
        }
    }

    /// Asks the user a random word from their list.
    ///
    /// With no linked words this returns [`QuizError::NoWordsFound`] and
    /// writes nothing. Otherwise the pending question and the
    /// `WaitingAnswer` state are written together before the word is sent.
    pub async fn request_word(&self, user_id: i64) -> Result<Word, QuizError> {
        let Some(word_id) = self.store.pick_random_word_id(user_id)? else {
            return Err(QuizError::NoWordsFound { user_id });
        };
        let word = self.load_word(word_id)?;
        let language = self.load_language(word.language_id)?;

        self.store.ask_question(user_id, word.id)?;
        tracing::debug!(user_id, word_id = word.id, "Question asked");

        notify(self.notifier.as_ref(), user_id, &question_text(&word, &language)).await;
        Ok(word)
    }

    /// Grades `guess` against the pending word's translation into the
    /// user's target language.
    ///
    /// An oracle failure leaves the question and state untouched so the user
    /// can resend the answer.
    pub async fn submit_answer(&self, user: &User, guess: &str) -> Result<GradedAnswer, QuizError> {
        let pending = self
            .store
            .get_pending_question(user.id)?
            .ok_or_else(|| QuizError::NotFound(format!("pending question for user {}", user.id)))?;
        let word = self.load_word(pending.word_id)?;
        let source = self.load_language(word.language_id)?;
        let target = self.load_language(user.language_id)?;

        let translation = self
            .oracle
            .translate(&word.text, &source.code, &target.code)
            .await
            .map_err(|e| QuizError::ExternalService(e.to_string()))?;

        let correct = grading::is_correct(guess, &translation);
        let answer = Answer {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id,
            word_id: word.id,
            correct,
            guess: guess.to_string(),
            translation: translation.clone(),
            language_id: target.id,
            created_at: Utc::now(),
        };

        match self.store.record_answer(&answer) {
            Ok(()) => {}
            Err(StoreError::Conflict { .. }) | Err(StoreError::NotFound { .. }) => {
                return Err(QuizError::Validation(constants::QUESTION_REPLACED.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id = user.id, word_id = word.id, correct, "Answer graded");

        notify(self.notifier.as_ref(), user.id, &verdict_text(correct, &translation)).await;

        Ok(GradedAnswer {
            word_id: word.id,
            correct,
            translation,
        })
    }

    fn load_word(&self, word_id: u64) -> Result<Word, QuizError> {
        self.store
            .get_word(word_id)?
            .ok_or_else(|| QuizError::NotFound(format!("word {word_id}")))
    }

    fn load_language(&self, language_id: u64) -> Result<Language, QuizError> {
        self.store
            .get_language(language_id)?
            .ok_or_else(|| QuizError::NotFound(format!("language {language_id}")))
    }
}

pub fn question_text(word: &Word, language: &Language) -> String {
    format!(
        "Word is: {}; Stem: {}; Lang: {}",
        word.text, word.stem, language.english_name
    )
}

pub fn verdict_text(correct: bool, translation: &str) -> String {
    if correct {
        constants::CORRECT_ANSWER.to_string()
    } else {
        format!("Your answer is incorrect. Correct answer: {}", translation)
    }
}
