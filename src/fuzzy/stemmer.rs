// File: src/fuzzy/stemmer.rs
//! A light English stemmer covering Porter's first step: plurals, `-ed` and
//! `-ing`, and a terminal `y`. It only has to bring inflected forms close
//! enough for the fuzzy locator; it is not linguistically exact.

/// Anything usable as the locator's `stem` function.
pub trait Stemmer {
    fn stem(&self, word: &str) -> String;
}

impl<F: Fn(&str) -> String> Stemmer for F {
    fn stem(&self, word: &str) -> String {
        self(word)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishStemmer;

impl EnglishStemmer {
    pub fn new() -> Self {
        Self
    }
}

impl Stemmer for EnglishStemmer {
    fn stem(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if lower.len() <= 2 || !lower.chars().all(|c| c.is_ascii_alphabetic()) {
            return lower;
        }
        let mut w: Vec<u8> = lower.into_bytes();
        step_1a(&mut w);
        step_1b(&mut w);
        step_1c(&mut w);
        // Only ASCII letters reach this point.
        String::from_utf8(w).unwrap_or_default()
    }
}

fn is_consonant(w: &[u8], i: usize) -> bool {
    match w[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(w, i - 1),
        _ => true,
    }
}

/// Porter's m: the number of vowel-consonant sequences in `w`.
fn measure(w: &[u8]) -> usize {
    let mut m = 0;
    let mut i = 0;
    while i < w.len() && is_consonant(w, i) {
        i += 1;
    }
    while i < w.len() {
        while i < w.len() && !is_consonant(w, i) {
            i += 1;
        }
        if i == w.len() {
            break;
        }
        while i < w.len() && is_consonant(w, i) {
            i += 1;
        }
        m += 1;
    }
    m
}

fn has_vowel(w: &[u8]) -> bool {
    (0..w.len()).any(|i| !is_consonant(w, i))
}

fn ends_double_consonant(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_consonant(w, n - 1)
}

/// consonant-vowel-consonant ending, where the last consonant is not w, x or y.
fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    n >= 3
        && is_consonant(w, n - 3)
        && !is_consonant(w, n - 2)
        && is_consonant(w, n - 1)
        && !matches!(w[n - 1], b'w' | b'x' | b'y')
}

fn replace_suffix(w: &mut Vec<u8>, suffix: &[u8], with: &[u8]) {
    w.truncate(w.len() - suffix.len());
    w.extend_from_slice(with);
}

fn step_1a(w: &mut Vec<u8>) {
    if w.ends_with(b"sses") {
        replace_suffix(w, b"sses", b"ss");
    } else if w.ends_with(b"ies") {
        replace_suffix(w, b"ies", b"i");
    } else if w.ends_with(b"s") && !w.ends_with(b"ss") {
        w.pop();
    }
}

fn step_1b(w: &mut Vec<u8>) {
    if w.ends_with(b"eed") {
        if measure(&w[..w.len() - 3]) > 0 {
            w.pop();
        }
        return;
    }
    let stripped = if w.ends_with(b"ed") && has_vowel(&w[..w.len() - 2]) {
        w.truncate(w.len() - 2);
        true
    } else if w.ends_with(b"ing") && has_vowel(&w[..w.len() - 3]) {
        w.truncate(w.len() - 3);
        true
    } else {
        false
    };
    if !stripped {
        return;
    }
    if w.ends_with(b"at") || w.ends_with(b"bl") || w.ends_with(b"iz") {
        w.push(b'e');
    } else if ends_double_consonant(w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z') {
        w.pop();
    } else if measure(w) == 1 && ends_cvc(w) {
        w.push(b'e');
    }
}

fn step_1c(w: &mut Vec<u8>) {
    let n = w.len();
    if n > 1 && w[n - 1] == b'y' && has_vowel(&w[..n - 1]) {
        w[n - 1] = b'i';
    }
}
