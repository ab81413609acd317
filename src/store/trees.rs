pub const USERS: &str = "users";
pub const LANGUAGES: &str = "languages";
pub const LANGUAGE_CODES: &str = "language_codes";
pub const WORDS: &str = "words";
pub const WORD_KEYS: &str = "word_keys";
pub const USER_WORDS: &str = "user_words";
pub const QUESTIONS: &str = "questions";
pub const ANSWERS: &str = "answers";
pub const META: &str = "meta";
