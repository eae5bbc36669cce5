//! Keyword extraction against a fixed vocabulary.

use std::collections::HashSet;

use crate::defaults;

/// Environment variable overriding the built-in vocabulary (comma-separated).
pub const ENV_KEYWORDS: &str = "IDEANEST_KEYWORDS";

/// Ordered, duplicate-free set of keyword terms.
///
/// Terms are stored lower-cased so matching ignores case for scripts that
/// have one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordVocabulary {
    terms: Vec<String>,
}

impl Default for KeywordVocabulary {
    fn default() -> Self {
        Self::new(defaults::KEYWORDS.iter().copied())
    }
}

impl KeywordVocabulary {
    /// Build a vocabulary, keeping first occurrences and dropping blank terms.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { terms }
    }

    /// Load from `IDEANEST_KEYWORDS`, falling back to the built-in list.
    pub fn from_env() -> Self {
        match std::env::var(ENV_KEYWORDS) {
            Ok(raw) => {
                let vocabulary = Self::new(raw.split(','));
                if vocabulary.is_empty() {
                    tracing::warn!(value = %raw, "Empty {}, using built-in keywords", ENV_KEYWORDS);
                    Self::default()
                } else {
                    vocabulary
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Terms in match order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Return every vocabulary term contained in `text`, in vocabulary order.
    ///
    /// Matching is plain substring containment on the lower-cased text.
    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .filter(|term| haystack.contains(term.as_str()))
            .cloned()
            .collect()
    }
}
