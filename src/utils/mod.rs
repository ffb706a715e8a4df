/// Cuts `text` to at most `max` characters, appending `suffix` only when
/// something was actually cut.
pub fn truncate_chars(text: &str, max: usize, suffix: &str) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{}", &text[..cut], suffix),
        None => text.to_string(),
    }
}

/// Milliseconds since the Unix epoch, the timestamp unit stored in history.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
