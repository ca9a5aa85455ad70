// File: src/persistence.rs
use crate::core::error::VocabularyError;
use crate::core::types::RawWordEntry;
use crate::core::vocabulary::VocabularySource;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

static IMPORTABLE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z-]+$").expect("static word pattern"));

/// Raw word entries grouped by book id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wordbook {
    pub books: BTreeMap<u64, Vec<RawWordEntry>>,
}

impl Wordbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(book_id: u64, entries: Vec<RawWordEntry>) -> Self {
        let mut wordbook = Self::new();
        wordbook.books.insert(book_id, entries);
        wordbook
    }
}

impl VocabularySource for Wordbook {
    fn load(&self, book_id: u64) -> Result<Vec<RawWordEntry>, VocabularyError> {
        self.books.get(&book_id).cloned().ok_or(VocabularyError::UnknownBook(book_id))
    }
}

/// A wordbook on disk: JSON when the file ends in `.json`, bincode otherwise.
/// Read afresh on every load.
#[derive(Debug, Clone)]
pub struct WordbookFile {
    path: PathBuf,
}

impl WordbookFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        self.path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
    }

    pub fn read(&self) -> Result<Wordbook, VocabularyError> {
        let reader = BufReader::new(File::open(&self.path)?);
        if self.is_json() {
            Ok(serde_json::from_reader(reader)?)
        } else {
            Ok(bincode::deserialize_from(reader)?)
        }
    }

    /// Writes through a temporary file in the same directory, so readers
    /// never see a half-written wordbook.
    pub fn save(&self, wordbook: &Wordbook) -> Result<(), VocabularyError> {
        let parent_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            if self.is_json() {
                serde_json::to_writer_pretty(&mut writer, wordbook)?;
            } else {
                bincode::serialize_into(&mut writer, wordbook)?;
            }
            writer.flush()?;
        }
        temp_file.persist(&self.path).map_err(|e| VocabularyError::Io(e.error))?;
        Ok(())
    }
}

impl VocabularySource for WordbookFile {
    fn load(&self, book_id: u64) -> Result<Vec<RawWordEntry>, VocabularyError> {
        self.read()?.load(book_id)
    }
}

/// Parses a plain word list, one word per line. Whitespace is squeezed out,
/// anything but letters and hyphens disqualifies a line, and repeats are
/// dropped ignoring case.
pub fn import_word_list(text: &str) -> Vec<RawWordEntry> {
    let mut seen = HashSet::new();
    text.lines()
        .map(|line| line.split_whitespace().collect::<String>())
        .filter(|word| IMPORTABLE_WORD.is_match(word))
        .filter(|word| seen.insert(word.to_lowercase()))
        .map(|word| RawWordEntry { word, ..RawWordEntry::default() })
        .collect()
}
