pub fn user_key(user_id: i64) -> String {
    user_id.to_string()
}

pub fn language_key(language_id: u64) -> String {
    format!("{:020}", language_id)
}

pub fn language_code_key(code: &str) -> String {
    code.trim().to_lowercase()
}

pub fn word_key(word_id: u64) -> String {
    format!("{:020}", word_id)
}

/// Natural key of a word. Text is length-prefixed so that a `:` inside the
/// text cannot collide with the stem boundary.
pub fn word_natural_key(language_id: u64, text: &str, stem: &str) -> String {
    format!("{}:{}:{}:{}", language_id, text.len(), text, stem)
}

pub fn user_word_key(user_id: i64, word_id: u64) -> String {
    format!("{}:{:020}", user_id, word_id)
}

pub fn user_word_prefix(user_id: i64) -> String {
    format!("{}:", user_id)
}

pub fn question_key(user_id: i64) -> String {
    user_id.to_string()
}

pub fn answer_key(user_id: i64, timestamp_ms: i64, answer_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{}:{:020}:{}", user_id, reverse_ts, answer_id)
}

pub fn answer_prefix(user_id: i64) -> String {
    format!("{}:", user_id)
}

/// Reads an id stored by an index tree as big-endian bytes.
pub fn decode_id(raw: &[u8]) -> u64 {
    let bytes: [u8; 8] = raw.try_into().unwrap_or([0; 8]);
    u64::from_be_bytes(bytes)
}
