// File: src/core/vocabulary.rs
use crate::core::error::{EngineError, VocabularyError};
use crate::core::types::{RawWordEntry, WordEntry};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use tracing::debug;

/// Anything that can hand over the raw entries of a wordbook.
pub trait VocabularySource {
    fn load(&self, book_id: u64) -> Result<Vec<RawWordEntry>, VocabularyError>;
}

impl<T: VocabularySource + ?Sized> VocabularySource for Box<T> {
    fn load(&self, book_id: u64) -> Result<Vec<RawWordEntry>, VocabularyError> {
        (**self).load(book_id)
    }
}

/// The words eligible for in-document matching, keyed case-insensitively,
/// together with the pattern that finds them.
#[derive(Debug)]
pub struct WorkingVocabulary {
    entries: HashMap<String, WordEntry>,
    pattern: Regex,
}

impl WorkingVocabulary {
    /// Admits up to `cap` entries in the given order. Keys are lowercased and
    /// later duplicates of a key are dropped.
    pub fn build(entries: Vec<WordEntry>, cap: usize) -> Result<Self, EngineError> {
        let mut admitted: HashMap<String, WordEntry> = HashMap::with_capacity(entries.len().min(cap));
        for mut entry in entries {
            if admitted.len() == cap {
                break;
            }
            let key = entry.word.to_lowercase();
            if admitted.contains_key(&key) {
                debug!(word = %key, "duplicate vocabulary entry skipped");
                continue;
            }
            entry.word = key.clone();
            admitted.insert(key, entry);
        }
        if admitted.is_empty() {
            return Err(EngineError::EmptyVocabulary);
        }

        let mut words: Vec<&str> = admitted.keys().map(String::as_str).collect();
        // Longest first so "apple-pie" wins over "apple" at the same position.
        words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
            .case_insensitive(true)
            .size_limit(64 * (1 << 20))
            .build()?;

        Ok(Self { entries: admitted, pattern })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Looks up the entry for a matched span, ignoring case.
    pub fn get(&self, matched: &str) -> Option<&WordEntry> {
        self.entries.get(&matched.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }
}
