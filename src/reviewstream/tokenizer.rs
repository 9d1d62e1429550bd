//! Review text tokenization
//!
//! Two named profiles are deliberately kept distinct:
//!
//! - [`TokenizerProfile::Permissive`]: lowercase + whitespace split. Used by
//!   the streaming ingest path, which keeps punctuation attached to words.
//! - [`TokenizerProfile::AlnumOnly`]: lowercase, strip every character
//!   outside `[a-z ]`, then split. Used by the batch wordcount task.
//!
//! Malformed upstream data must never halt ingestion, so tokenizing empty
//! or non-textual input yields an empty token list rather than an error.

/// Named tokenization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerProfile {
    /// Lowercase and split on whitespace.
    Permissive,
    /// Lowercase, drop all characters outside `[a-z ]`, then split.
    AlnumOnly,
}

impl TokenizerProfile {
    /// Tokenize `input` into an ordered sequence of lowercase words.
    pub fn tokenize(&self, input: &str) -> Vec<String> {
        match self {
            TokenizerProfile::Permissive => input
                .to_lowercase()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            TokenizerProfile::AlnumOnly => {
                let cleaned: String = input
                    .to_lowercase()
                    .chars()
                    .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
                    .collect();
                cleaned.split_whitespace().map(str::to_string).collect()
            }
        }
    }
}
