// src/core/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vocabulary word as the engine sees it.
/// `word` is lowercased once the entry is admitted to a `WorkingVocabulary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
    pub accent: String,
    /// How often the user looked this word up. Never negative.
    pub frequency: f64,
    pub last_used: DateTime<Utc>,
}

/// The shape a vocabulary source hands over, before normalization.
///
/// Wordbooks carry either a single `mean` or a list of `means`; both are kept
/// and resolved by [`RawWordEntry::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWordEntry {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub mean: Option<String>,
    #[serde(default)]
    pub means: Option<Vec<String>>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub frequency: Option<f64>,
    /// Milliseconds since the epoch.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RawWordEntry {
    pub fn new(word: &str, mean: &str, accent: &str) -> Self {
        Self {
            word: word.to_string(),
            mean: Some(mean.to_string()),
            accent: Some(accent.to_string()),
            ..Self::default()
        }
    }

    /// Converts into a `WordEntry`, or `None` when there is no word at all.
    /// A list of meanings wins over the single string and is joined with `"; "`.
    pub fn normalize(self, now: DateTime<Utc>) -> Option<WordEntry> {
        let word = self.word.trim().to_string();
        if word.is_empty() {
            return None;
        }
        let meaning = match self.means {
            Some(means) => means.join("; "),
            None => self.mean.unwrap_or_default(),
        };
        Some(WordEntry {
            word,
            meaning,
            accent: self.accent.unwrap_or_default(),
            frequency: self.frequency.unwrap_or(0.0).max(0.0),
            last_used: self.created_at.unwrap_or(now),
        })
    }
}

/// Result of a fuzzy lookup: the sentence token that best matches a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub distance: usize,
    pub token: String,
}

/// An example sentence, optionally with the exact phrase to emphasise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub sentence: String,
    #[serde(default)]
    pub highlight_phrase: Option<String>,
}

impl Sentence {
    pub fn new(sentence: &str) -> Self {
        Self { sentence: sentence.to_string(), highlight_phrase: None }
    }

    pub fn with_phrase(sentence: &str, phrase: &str) -> Self {
        Self {
            sentence: sentence.to_string(),
            highlight_phrase: Some(phrase.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned box. Document layout uses document coordinates,
/// popover placement uses viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self { left: self.left + dx, top: self.top + dy, ..*self }
    }
}

/// The vertical range worth scanning: the visible area plus a buffer on each side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportWindow {
    pub top: f64,
    pub bottom: f64,
}

impl ViewportWindow {
    pub fn from_scroll(scroll_top: f64, viewport_height: f64, buffer: f64) -> Self {
        Self {
            top: scroll_top - buffer,
            bottom: scroll_top + viewport_height + buffer,
        }
    }

    /// False only for boxes lying strictly above or strictly below the window.
    pub fn overlaps(&self, rect: &Rect) -> bool {
        !(rect.top > self.bottom || rect.bottom() < self.top)
    }
}
