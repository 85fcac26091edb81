//! Utterance tokenization and text normalization.
//!
//! Splits raw input into sentence-like tokens and provides the normalized
//! forms the matcher compares against. Normalized text is never surfaced to
//! the user.

use regex::Regex;

/// Splits utterances into sentence-like tokens.
///
/// The bot's own name is stripped (as a standalone word, case-insensitive)
/// before splitting: a user addressing the bot by name is not talking
/// *about* the name.
pub struct Tokenizer {
    bot_name_re: Regex,
}

impl Tokenizer {
    pub fn new(bot_name: &str) -> Self {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(bot_name));
        Self {
            // Escaped literal, always a valid pattern.
            bot_name_re: Regex::new(&pattern).expect("escaped bot name regex"),
        }
    }

    /// Split `text` into sentence-like tokens on `.`, `?`, `!`.
    ///
    /// Each token keeps its terminal punctuation so the matcher can tell
    /// questions from statements. Tokens that normalize to nothing are
    /// dropped.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned = self.bot_name_re.replace_all(text, "");

        let mut tokens = Vec::new();
        let mut current = String::new();
        for c in cleaned.chars() {
            current.push(c);
            if matches!(c, '.' | '?' | '!') {
                push_token(&mut tokens, &mut current);
            }
        }
        push_token(&mut tokens, &mut current);
        tokens
    }
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    let token = current.trim();
    if !sanitize(token).is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}

/// Lowercase and strip every character that is not a word character or
/// whitespace. Matcher-internal form only.
pub fn sanitize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Whole-word containment of `phrase` in `text`, on sanitized forms.
pub fn contains_exact_phrase(text: &str, phrase: &str) -> bool {
    let text = sanitize(text);
    let phrase = sanitize(phrase);

    let text_words: Vec<&str> = text.split_whitespace().collect();
    let phrase_words: Vec<&str> = phrase.split_whitespace().collect();
    if phrase_words.is_empty() || phrase_words.len() > text_words.len() {
        return false;
    }
    text_words
        .windows(phrase_words.len())
        .any(|window| window == phrase_words.as_slice())
}
