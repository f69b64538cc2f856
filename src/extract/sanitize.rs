use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Everything a stored comment may not contain
    static ref DISALLOWED_CHARS: Regex =
        Regex::new(r"[^a-zA-Z0-9\s.,!?]").expect("Invalid comment filter regex");
}

/// Cleans a review comment before it is stored
///
/// Keeps ASCII letters and digits, whitespace and the punctuation `. , ! ?`;
/// everything else (accented letters included) is dropped. The result is
/// trimmed.
pub fn sanitize_comment(comment: &str) -> String {
    DISALLOWED_CHARS.replace_all(comment, "").trim().to_string()
}
