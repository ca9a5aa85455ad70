pub mod levenshtein;
pub mod locator;
pub mod stemmer;

pub use levenshtein::distance;
pub use locator::{highlight_sentence, locate};
pub use stemmer::{EnglishStemmer, Stemmer};
