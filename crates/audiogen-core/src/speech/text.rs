//! Text preparation ahead of phonemization.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Maximum characters accepted in a single request
pub const MAX_TEXT_LENGTH: usize = 100_000;

static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// NFKC-normalize, turn line breaks into sentence breaks and collapse runs of
/// whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    let nfkc: String = text.nfkc().collect();
    let mut sentences: Vec<String> = Vec::new();
    for line in nfkc.lines() {
        let line = SPACES_RE.replace_all(line.trim(), " ");
        if line.is_empty() {
            continue;
        }
        sentences.push(line.into_owned());
    }

    let last = sentences.len().saturating_sub(1);
    let mut out = String::new();
    for (i, line) in sentences.iter().enumerate() {
        out.push_str(line);
        if i < last {
            if !ends_with_terminal(line) {
                out.push('.');
            }
            out.push(' ');
        }
    }
    out
}

fn ends_with_terminal(text: &str) -> bool {
    matches!(text.chars().last(), Some('.' | '!' | '?' | '…'))
}

/// Split on `.`, `!` or `?` followed by whitespace or the end of the text.
/// Terminal punctuation stays with its sentence.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
        if matches!(ch, '.' | '!' | '?') && at_boundary {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Append `,` unless the text already ends in punctuation
#[must_use]
pub fn ensure_punctuation(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if matches!(
        trimmed.chars().last(),
        Some('.' | '!' | '?' | ',' | ';' | ':')
    ) {
        trimmed.to_string()
    } else {
        format!("{trimmed},")
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Sentences are kept whole when they fit, otherwise packed word by word.
/// Every chunk ends in punctuation. A single word longer than the budget
/// becomes its own chunk.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(2);
    let mut chunks = Vec::new();

    for sentence in split_sentences(text) {
        let whole = ensure_punctuation(&sentence);
        if whole.chars().count() <= max_chars {
            chunks.push(whole);
            continue;
        }

        // leave room for the comma ensure_punctuation may add
        let budget = max_chars - 1;
        let mut current = String::new();
        let mut current_len = 0;
        for word in sentence.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= budget {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                chunks.push(ensure_punctuation(&current));
                current.clear();
                current.push_str(word);
                current_len = word_len;
            }
        }
        if !current.is_empty() {
            chunks.push(ensure_punctuation(&current));
        }
    }

    chunks
}
