use serde::{Deserialize, Serialize};

/// Where a user currently is in the quiz conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    AwaitingUpload,
    WaitingAnswer,
    #[default]
    ReadyForQuestion,
    MigrationInProgress,
    AwaitingLanguage,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingUpload => "awaiting_upload",
            Self::WaitingAnswer => "waiting_answer",
            Self::ReadyForQuestion => "ready_for_question",
            Self::MigrationInProgress => "migration_in_progress",
            Self::AwaitingLanguage => "awaiting_language",
        }
    }

    /// A pending question may only exist in this state.
    pub fn holds_question(self) -> bool {
        matches!(self, Self::WaitingAnswer)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound chat commands. Anything else is free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Quiz,
    Help,
    SetLang,
    Upload,
    Cancel,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        // "/quiz@SomeBot" is how group chats address a specific bot.
        let head = text.trim().split_whitespace().next()?;
        let name = head.split('@').next().unwrap_or(head);
        match name {
            "/start" => Some(Self::Start),
            "/quiz" => Some(Self::Quiz),
            "/help" => Some(Self::Help),
            "/set_lang" => Some(Self::SetLang),
            "/upload" => Some(Self::Upload),
            "/cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}
