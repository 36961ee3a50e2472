//! String utilities for the domain layer.

/// Shorten thought content for logs and audit outcomes (UTF-8 safe).
///
/// Uses byte length for `max_len` but always cuts on a character boundary,
/// appending `...` when anything was removed.
pub fn preview(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3).min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_content_untouched() {
        assert_eq!(preview("ponder", 10), "ponder");
    }

    #[test]
    fn test_preview_cuts_long_content() {
        assert_eq!(preview("verify identity before speaking", 11), "verify i...");
    }

    #[test]
    fn test_preview_multibyte_boundary() {
        // 'é' is 2 bytes; a cut at byte 3 backs up to byte 2
        assert_eq!(preview("éééé", 6), "é...");
    }
}
