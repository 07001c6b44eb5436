//! Profanity filtering for outbound chat messages.

/// Pure predicate consumed by the coordinator before a message is relayed.
/// Kept behind a trait so the relay core never depends on a concrete word
/// list and tests can substitute their own.
pub trait ProfanityFilter: Send + Sync {
    fn is_profane(&self, text: &str) -> bool;
}

/// Words rejected out of the box. Deployments extend this via the
/// `[chat] banned_words` config section.
const BUILTIN_WORDS: &[&str] = &["damn", "hell", "crap", "bugger", "bollocks"];

/// Case-insensitive, word-boundary-aware denylist filter.
pub struct WordListFilter {
    words: Vec<String>,
}

impl Default for WordListFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl WordListFilter {
    pub fn new() -> Self {
        Self::with_extra_words(&[])
    }

    /// Built-in list plus `extra` (normalized; empties dropped).
    pub fn with_extra_words(extra: &[String]) -> Self {
        let mut words: Vec<String> = BUILTIN_WORDS.iter().map(|word| word.to_string()).collect();
        words.extend(
            extra
                .iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty()),
        );
        Self { words }
    }
}

impl ProfanityFilter for WordListFilter {
    fn is_profane(&self, text: &str) -> bool {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| !token.is_empty() && self.words.iter().any(|word| word == token))
    }
}
