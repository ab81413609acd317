/// Reply to `/help`, and to free text when no question is pending.
pub const HELP_TEXT: &str = "\
/quiz - ask a random word
/help - show this help
/set_lang - change language
/upload - uploading mode
/cancel - cancel current operation";

/// Reply to `/start`.
pub const GREETING_TEXT: &str = "Yo. Firstly you have to run /upload and upload your vocab.db file. \
Next run /quiz and have some fun. You can ask me for /help also.";

pub const UPLOAD_PROMPT: &str = "Now send vocab.db file exported from your kindle";

pub const NO_WORDS_FOUND: &str = "No words found. Please run /upload and follow instructions";

pub const MIGRATION_IN_PROGRESS: &str = "Migration still in progress.";

pub const MIGRATION_FAILED: &str = "Looks like db file in incorrect format. Try again.";

pub const DOWNLOAD_FAILED: &str =
    "Couldn't download your file. Send it again, or /cancel to stop uploading.";

pub const UPLOAD_QUEUE_UNAVAILABLE: &str =
    "Uploads are temporarily unavailable. Please try again later.";

pub const INVALID_LANGUAGE_CODE: &str = "Invalid language code";

pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel";

pub const CANCELLED: &str = "Done";

pub const CORRECT_ANSWER: &str = "Your answer is correct";

pub const GRADING_UNAVAILABLE: &str =
    "Translation service is unavailable right now. Send your answer again to retry.";

pub const QUESTION_REPLACED: &str = "That question was replaced by a newer one. Answer the latest word.";

pub const INTERNAL_ERROR: &str = "Something went wrong. Please try again.";

/// Kindle's export names the table `WORDS`; `lang` holds an ISO 639-1 code.
pub const IMPORT_QUERY: &str = "SELECT word, stem, lang FROM WORDS";

pub const LANGUAGE_LIST_HEADER: &str = "Select language code:";
