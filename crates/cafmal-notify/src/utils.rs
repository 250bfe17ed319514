//! Utility functions for notification channels

/// Maximum length of a response body kept in outcome messages
pub const MAX_BODY_LENGTH: usize = 1000;

/// Truncate a string to at most `max_len` bytes without splitting a character
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
