// File: src/ranking.rs
use crate::core::types::WordEntry;
use chrono::{DateTime, Utc};
use tracing::debug;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Relative weight of each factor in a word's score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub length: f64,
    pub recency: f64,
    pub complexity: f64,
    pub frequency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { length: 0.2, recency: 0.3, complexity: 0.2, frequency: 0.3 }
    }
}

/// A word with its score and its position in the ranker's input.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: WordEntry,
    pub score: f64,
    pub index: usize,
}

/// Trims an oversized wordbook down to the words most worth highlighting:
/// short, recently collected, plain and frequently looked up.
pub struct VocabularyRanker {
    weights: ScoreWeights,
}

impl VocabularyRanker {
    pub fn new() -> Self {
        Self { weights: ScoreWeights::default() }
    }

    /// Returns `entries` untouched when they fit, otherwise the `cap`
    /// best-scoring ones. Equal scores keep their input order.
    pub fn rank(&self, entries: Vec<WordEntry>, cap: usize, now: DateTime<Utc>) -> Vec<WordEntry> {
        if entries.len() <= cap {
            return entries;
        }
        debug!(total = entries.len(), cap, "vocabulary over capacity, ranking");

        let mut scored: Vec<ScoredEntry> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| ScoredEntry { score: self.score(&entry, now), entry, index })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
        scored.truncate(cap);
        scored.into_iter().map(|s| s.entry).collect()
    }

    pub fn score(&self, entry: &WordEntry, now: DateTime<Utc>) -> f64 {
        let w = &self.weights;
        length_score(&entry.word) * w.length
            + time_score(entry.last_used, now) * w.recency
            + complexity_score(&entry.word) * w.complexity
            + frequency_score(entry.frequency) * w.frequency
    }
}

impl Default for VocabularyRanker {
    fn default() -> Self {
        Self::new()
    }
}

pub fn length_score(word: &str) -> f64 {
    (10.0 - word.chars().count() as f64).max(0.0) / 10.0
}

pub fn time_score(last_used: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - last_used).num_milliseconds() as f64 / MILLIS_PER_DAY;
    (30.0 - days).max(0.0) / 30.0
}

/// 1.0 for a short, lowercase, purely alphabetic word; less for anything else.
pub fn complexity_score(word: &str) -> f64 {
    let mut score: f64 = 1.0;
    if word.contains('-') {
        score -= 0.2;
    }
    if word.chars().any(|c| !c.is_ascii_alphabetic() && c != '-') {
        score -= 0.3;
    }
    if word != word.to_lowercase() {
        score -= 0.1;
    }
    if word.chars().count() > 6 {
        score -= 0.2;
    }
    score.max(0.0)
}

/// Not clamped: very frequent words may outweigh every other factor.
pub fn frequency_score(frequency: f64) -> f64 {
    frequency / 100.0
}
