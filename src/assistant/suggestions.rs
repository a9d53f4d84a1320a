use regex::Regex;
use std::sync::OnceLock;

/// Most follow-up suggestions returned with a reply
pub const MAX_SUGGESTIONS: usize = 3;

fn sentence_break() -> &'static Regex {
    static BREAK: OnceLock<Regex> = OnceLock::new();
    BREAK.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence break pattern is valid"))
}

/// Questions in `text`, in order, capped at [`MAX_SUGGESTIONS`]
///
/// Sentences end at `.`, `!` or `?` followed by whitespace; the terminator
/// stays with its sentence.
pub fn extract_suggestions(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in sentence_break().find_iter(text) {
        // Terminators are ASCII, so +1 stays on a char boundary
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|sentence| sentence.ends_with('?'))
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}
