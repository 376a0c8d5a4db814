//! Reaction-word scanning for inbound chat text.

/// Case-insensitive scan of chat text against the configured reaction
/// words.
///
/// Matching is whole-token only: the text is split on non-alphanumeric
/// characters, so a word never matches inside a longer one.
pub struct WordFilter {
    words: Vec<String>,
}

impl WordFilter {
    /// Build a filter from a configured word list. Blank entries are
    /// dropped.
    pub fn new(words: &[String]) -> Self {
        Self {
            words: words
                .iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// Whether `text` contains any of the configured words.
    pub fn matches(&self, text: &str) -> bool {
        if self.words.is_empty() {
            return false;
        }
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .any(|token| self.words.iter().any(|word| word == token))
    }
}
