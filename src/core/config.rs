// File: src/core/config.rs
use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound on the working vocabulary.
pub const MAX_WORDS: usize = 1000;

/// Popover dimensions and spacing, in viewport units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopoverLayout {
    pub width: f64,
    /// Used when the rendered height is unknown.
    pub height: f64,
    /// Distance between the marker and the popover.
    pub gap: f64,
    /// Minimum distance from the viewport's left and right edges.
    pub margin: f64,
}

impl Default for PopoverLayout {
    fn default() -> Self {
        Self { width: 300.0, height: 100.0, gap: 5.0, margin: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which wordbook the vocabulary source should load.
    pub book_id: u64,
    pub max_words: usize,
    /// Units handed to the annotator at once.
    pub batch_size: usize,
    /// Units processed before a scan yields back to the scheduler.
    pub units_per_slice: usize,
    /// Extra scroll distance scanned above and below the viewport.
    pub viewport_buffer: f64,
    pub debounce_ms: u64,
    pub popover: PopoverLayout,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            book_id: 0,
            max_words: MAX_WORDS,
            batch_size: 10,
            units_per_slice: 100,
            viewport_buffer: 100.0,
            debounce_ms: 500,
            popover: PopoverLayout::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"book_id": 7, "popover": {"width": 240}}"#).unwrap();
        assert_eq!(config.book_id, 7);
        assert_eq!(config.max_words, 1000);
        assert_eq!(config.debounce_window(), Duration::from_millis(500));
        assert_eq!(config.popover.width, 240.0);
        assert_eq!(config.popover.margin, 10.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(EngineConfig::from_json_str("{"), Err(ConfigError::Json(_))));
    }
}
