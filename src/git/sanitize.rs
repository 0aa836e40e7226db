//! Bounding of externally supplied identifiers before they reach the client.

use std::borrow::Cow;

/// Longest identifier embedded verbatim.
pub const MAX_ID_CHARS: usize = 48;

/// Marker appended to identifiers that were cut.
pub const TRUNCATED_SUFFIX: &str = " (truncated)";

/// Cap `id` at [`MAX_ID_CHARS`] characters, marking it when cut.
///
/// Counts `char`s rather than bytes so a multi-byte identifier is never
/// split inside a code point.
pub fn sanitize_correlation_id(id: &str) -> Cow<'_, str> {
    match id.char_indices().nth(MAX_ID_CHARS) {
        None => Cow::Borrowed(id),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &id[..cut], TRUNCATED_SUFFIX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_ids_pass_through() {
        assert_eq!(sanitize_correlation_id(""), "");
        assert_eq!(sanitize_correlation_id("abc123"), "abc123");
        assert!(matches!(sanitize_correlation_id("abc123"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_exactly_max_is_untouched() {
        let id = "a".repeat(MAX_ID_CHARS);
        assert_eq!(sanitize_correlation_id(&id), id);
    }

    #[test]
    fn test_long_ids_are_cut() {
        let id: String = ('a'..='z').cycle().take(60).collect();
        let sanitized = sanitize_correlation_id(&id);

        assert_eq!(sanitized, format!("{} (truncated)", &id[..48]));
        assert_eq!(sanitized.len(), MAX_ID_CHARS + TRUNCATED_SUFFIX.len());
    }

    #[test]
    fn test_multibyte_ids_cut_on_char_boundary() {
        let id = "é".repeat(MAX_ID_CHARS + 1);
        let sanitized = sanitize_correlation_id(&id);
        assert_eq!(sanitized, format!("{}{}", "é".repeat(MAX_ID_CHARS), TRUNCATED_SUFFIX));
    }
}
