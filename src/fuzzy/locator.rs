// File: src/fuzzy/locator.rs
use crate::core::types::{Sentence, TokenMatch};
use crate::fuzzy::levenshtein::distance;
use crate::fuzzy::stemmer::Stemmer;
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_-]+").expect("static token pattern"));

const HIGHLIGHT_OPEN: &str = r#"<span style="color: #007bff;">"#;
const HIGHLIGHT_CLOSE: &str = "</span>";

/// Tokens shorter than this accept up to `SHORT_TOKEN_MAX_DISTANCE` edits.
const LONG_TOKEN_LEN: usize = 7;
const SHORT_TOKEN_MAX_DISTANCE: usize = 3;
const LONG_TOKEN_MAX_DISTANCE: usize = 5;

/// Finds the sentence token closest to `word`, comparing both the raw and
/// stemmed forms of each side. Earlier tokens win ties.
pub fn locate(sentence: &str, word: &str, stemmer: &impl Stemmer) -> Option<TokenMatch> {
    let stemmed_word = stemmer.stem(word);
    let mut best: Option<TokenMatch> = None;

    for piece in sentence.split_whitespace() {
        let Some(token) = TOKEN.find(piece).map(|m| m.as_str()) else {
            continue;
        };
        let stemmed_token = stemmer.stem(token);
        let d = [
            distance(token, word),
            distance(token, &stemmed_word),
            distance(&stemmed_token, word),
            distance(&stemmed_token, &stemmed_word),
        ]
        .into_iter()
        .min()
        .unwrap_or(usize::MAX);

        let limit = if token.chars().count() < LONG_TOKEN_LEN {
            SHORT_TOKEN_MAX_DISTANCE
        } else {
            LONG_TOKEN_MAX_DISTANCE
        };
        if d > limit {
            continue;
        }
        if best.as_ref().map_or(true, |b| d < b.distance) {
            best = Some(TokenMatch { distance: d, token: token.to_string() });
        }
    }
    best
}

/// Marks where `word` appears in an example sentence.
///
/// A precomputed `highlight_phrase` is wrapped verbatim and fuzzy lookup is
/// skipped. Otherwise every whole-token occurrence of the located token is
/// wrapped; without a match the sentence comes back unchanged.
pub fn highlight_sentence(sentence: &Sentence, word: &str, stemmer: &impl Stemmer) -> String {
    if let Some(phrase) = sentence.highlight_phrase.as_deref().filter(|p| !p.is_empty()) {
        let wrapped = format!("{}{}{}", HIGHLIGHT_OPEN, phrase, HIGHLIGHT_CLOSE);
        return sentence.sentence.replacen(phrase, &wrapped, 1);
    }

    let Some(found) = locate(&sentence.sentence, word, stemmer) else {
        return sentence.sentence.clone();
    };
    let Ok(occurrences) = Regex::new(&format!(r"\b{}\b", regex::escape(&found.token))) else {
        return sentence.sentence.clone();
    };
    occurrences
        .replace_all(&sentence.sentence, |caps: &regex::Captures| {
            format!("{}{}{}", HIGHLIGHT_OPEN, &caps[0], HIGHLIGHT_CLOSE)
        })
        .into_owned()
}
