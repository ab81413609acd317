pub mod state;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::QuizError;
use crate::ingest::{IngestionPipeline, LanguageCodes};
use crate::quiz::QuizEngine;
use crate::services::notifier::{notify, Notifier};
use crate::store::operations::users::User;
use crate::store::Store;

use state::{Command, SessionState};

/// One message from a chat user, as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub user_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub document_url: Option<String>,
}

/// Routes inbound events by the user's session state.
///
/// Every event reads the user once and commits at most one state change.
/// The `/upload` and `/set_lang` commands and asking a question overwrite
/// whatever state the user is in. Leaving a state the pipeline may also
/// leave (`/cancel`, starting an upload, finishing or failing one) is a
/// compare-and-set against the state that was read. Concurrent events for
/// the same user resolve last-writer-wins.
#[derive(Clone)]
pub struct SessionController {
    store: Arc<Store>,
    quiz: QuizEngine,
    pipeline: IngestionPipeline,
    notifier: Arc<dyn Notifier>,
    languages: Arc<LanguageCodes>,
    default_language_id: u64,
}

impl SessionController {
    pub fn new(
        store: Arc<Store>,
        quiz: QuizEngine,
        pipeline: IngestionPipeline,
        notifier: Arc<dyn Notifier>,
        languages: Arc<LanguageCodes>,
        default_language_id: u64,
    ) -> Self {
        Self {
            store,
            quiz,
            pipeline,
            notifier,
            languages,
            default_language_id,
        }
    }

    /// Handles one event end to end.
    ///
    /// Errors the user can act on are turned into a reply here; only
    /// storage failures are returned, after the user was told something
    /// went wrong.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), QuizError> {
        let user_id = event.user_id;
        match self.route(event).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_recoverable() => {
                tracing::debug!(user_id, error = %e, "Event rejected");
                self.reply(user_id, &user_message(&e)).await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Event handling failed");
                self.reply(user_id, constants::INTERNAL_ERROR).await;
                Err(e)
            }
        }
    }

    async fn route(&self, event: InboundEvent) -> Result<(), QuizError> {
        let user = self
            .store
            .get_or_create_user(event.user_id, self.default_language_id)?;
        let command = Command::parse(&event.text);
        tracing::debug!(user_id = user.id, state = %user.state, ?command, "Routing event");

        match command {
            Some(Command::Start) => self.reply(user.id, constants::GREETING_TEXT).await,
            Some(Command::Help) => self.reply(user.id, constants::HELP_TEXT).await,
            Some(Command::Upload) => {
                self.store.set_user_state(user.id, SessionState::AwaitingUpload)?;
                self.reply(user.id, constants::UPLOAD_PROMPT).await;
            }
            Some(Command::SetLang) => self.list_languages(&user).await?,
            Some(Command::Cancel) => self.cancel(&user).await?,
            Some(Command::Quiz) => self.quiz_command(&user).await?,
            None => self.free_text(&user, &event).await?,
        }
        Ok(())
    }

    async fn quiz_command(&self, user: &User) -> Result<(), QuizError> {
        match user.state {
            SessionState::ReadyForQuestion | SessionState::WaitingAnswer => {
                self.quiz.request_word(user.id).await?;
            }
            SessionState::MigrationInProgress => {
                self.reply(user.id, constants::MIGRATION_IN_PROGRESS).await
            }
            SessionState::AwaitingUpload | SessionState::AwaitingLanguage => {
                tracing::debug!(user_id = user.id, state = %user.state, "Ignoring /quiz");
            }
        }
        Ok(())
    }

    async fn free_text(&self, user: &User, event: &InboundEvent) -> Result<(), QuizError> {
        match user.state {
            SessionState::ReadyForQuestion => self.reply(user.id, constants::HELP_TEXT).await,
            SessionState::WaitingAnswer => {
                self.quiz.submit_answer(user, &event.text).await?;
            }
            SessionState::MigrationInProgress => {
                self.reply(user.id, constants::MIGRATION_IN_PROGRESS).await
            }
            SessionState::AwaitingLanguage => self.set_language(user, &event.text).await?,
            SessionState::AwaitingUpload => match event.document_url.as_deref() {
                Some(url) if !url.trim().is_empty() => self.start_upload(user, url.trim()).await?,
                _ => self.reply(user.id, constants::UPLOAD_PROMPT).await,
            },
        }
        Ok(())
    }

    async fn list_languages(&self, user: &User) -> Result<(), QuizError> {
        let languages = self.store.list_languages()?;
        self.store.set_user_state(user.id, SessionState::AwaitingLanguage)?;

        let mut text = format!("{}\n\n", constants::LANGUAGE_LIST_HEADER);
        for language in &languages {
            text.push_str(&format!("[{}] {}\n", language.code, language.english_name));
        }
        self.reply(user.id, &text).await;
        Ok(())
    }

    async fn set_language(&self, user: &User, code: &str) -> Result<(), QuizError> {
        let Some(language_id) = self.languages.resolve(code) else {
            return Err(QuizError::Validation(constants::INVALID_LANGUAGE_CODE.to_string()));
        };
        let language = self
            .store
            .get_language(language_id)?
            .ok_or_else(|| QuizError::NotFound(format!("language {language_id}")))?;

        if !self.store.choose_language(user.id, language_id)? {
            tracing::debug!(user_id = user.id, "Left language selection before code arrived");
            return Ok(());
        }
        tracing::info!(user_id = user.id, language = %language.code, "Target language changed");
        self.reply(
            user.id,
            &format!("Language changed to: {}", language.localized_name),
        )
        .await;
        Ok(())
    }

    async fn cancel(&self, user: &User) -> Result<(), QuizError> {
        if user.state == SessionState::ReadyForQuestion {
            self.reply(user.id, constants::NOTHING_TO_CANCEL).await;
            return Ok(());
        }
        if self
            .store
            .transition_state(user.id, user.state, SessionState::ReadyForQuestion)?
        {
            self.reply(user.id, constants::CANCELLED).await;
        } else {
            tracing::debug!(user_id = user.id, "State moved before cancel was applied");
        }
        Ok(())
    }

    async fn start_upload(&self, user: &User, url: &str) -> Result<(), QuizError> {
        if !self.store.transition_state(
            user.id,
            SessionState::AwaitingUpload,
            SessionState::MigrationInProgress,
        )? {
            tracing::debug!(user_id = user.id, "Upload raced with another state change");
            return Ok(());
        }

        if let Err(e) = self.pipeline.submit(user.id, url).await {
            tracing::warn!(user_id = user.id, error = %e, "Failed to queue upload");
            self.store.transition_state(
                user.id,
                SessionState::MigrationInProgress,
                SessionState::AwaitingUpload,
            )?;
            self.reply(user.id, constants::UPLOAD_QUEUE_UNAVAILABLE).await;
        }
        Ok(())
    }

    async fn reply(&self, user_id: i64, text: &str) {
        notify(self.notifier.as_ref(), user_id, text).await;
    }
}

/// What the user sees for a recoverable error.
fn user_message(error: &QuizError) -> String {
    match error {
        QuizError::NoWordsFound { .. } => constants::NO_WORDS_FOUND.to_string(),
        QuizError::ExternalService(_) => constants::GRADING_UNAVAILABLE.to_string(),
        QuizError::Validation(message) => message.clone(),
        QuizError::TransientIo(_) => constants::UPLOAD_QUEUE_UNAVAILABLE.to_string(),
        QuizError::InvalidImport(_) | QuizError::ImportRow { .. } => {
            constants::MIGRATION_FAILED.to_string()
        }
        QuizError::NotFound(_) | QuizError::Store(_) => constants::INTERNAL_ERROR.to_string(),
    }
}
