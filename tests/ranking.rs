use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rstest::rstest;
use wordmark_core::core::types::WordEntry;
use wordmark_core::ranking::{complexity_score, length_score, time_score, VocabularyRanker};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn entry(word: &str, frequency: f64, days_ago: i64) -> WordEntry {
    WordEntry {
        word: word.to_string(),
        meaning: String::new(),
        accent: String::new(),
        frequency,
        last_used: now() - Duration::days(days_ago),
    }
}

fn words(entries: &[WordEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.word.as_str()).collect()
}

#[rstest]
#[case("cat", 0.7)]
#[case("abcdefghij", 0.0)]
#[case("incomprehensibility", 0.0)]
fn length_favours_short_words(#[case] word: &str, #[case] expected: f64) {
    assert!((length_score(word) - expected).abs() < 1e-9);
}

#[rstest]
#[case(0, 1.0)]
#[case(15, 0.5)]
#[case(30, 0.0)]
#[case(400, 0.0)]
fn recency_fades_over_thirty_days(#[case] days_ago: i64, #[case] expected: f64) {
    let score = time_score(now() - Duration::days(days_ago), now());
    assert!((score - expected).abs() < 1e-9);
}

#[rstest]
#[case("cat", 1.0)]
#[case("Cat", 0.9)]
#[case("well-being", 0.6)]
#[case("it's", 0.7)]
fn complexity_penalises_unusual_words(#[case] word: &str, #[case] expected: f64) {
    assert!((complexity_score(word) - expected).abs() < 1e-9);
}

#[test]
fn fitting_wordbooks_are_returned_untouched() {
    let entries = vec![entry("zebra", 0.0, 90), entry("ant", 50.0, 0)];
    let ranked = VocabularyRanker::new().rank(entries.clone(), 2, now());
    assert_eq!(ranked, entries);
}

#[test]
fn equal_scores_keep_input_order() {
    let forward: Vec<WordEntry> = ["aaa", "bbb", "ccc", "ddd", "eee"].iter().map(|w| entry(w, 1.0, 2)).collect();
    let mut backward = forward.clone();
    backward.reverse();

    let ranker = VocabularyRanker::new();
    assert_eq!(words(&ranker.rank(forward, 3, now())), vec!["aaa", "bbb", "ccc"]);
    assert_eq!(words(&ranker.rank(backward, 3, now())), vec!["eee", "ddd", "ccc"]);
}

#[test]
fn frequent_lookups_outweigh_everything_else() {
    let entries = vec![
        entry("cat", 0.0, 0),
        entry("Incomprehensible", 900.0, 365),
        entry("dog", 0.0, 0),
    ];
    let ranked = VocabularyRanker::new().rank(entries, 1, now());
    assert_eq!(words(&ranked), vec!["Incomprehensible"]);
}

fn entry_strategy() -> impl Strategy<Value = WordEntry> {
    ("[a-zA-Z'-]{1,14}", 0.0..300.0f64, 0i64..90).prop_map(|(word, frequency, days)| entry(&word, frequency, days))
}

proptest! {
    #[test]
    fn ranking_keeps_the_best_cap(entries in prop::collection::vec(entry_strategy(), 0..40), cap in 1usize..20) {
        let ranker = VocabularyRanker::new();
        let ranked = ranker.rank(entries.clone(), cap, now());
        prop_assert_eq!(ranked.len(), entries.len().min(cap));

        if entries.len() > cap {
            let mut order: Vec<usize> = (0..entries.len()).collect();
            order.sort_by(|&a, &b| {
                ranker.score(&entries[b], now())
                    .total_cmp(&ranker.score(&entries[a], now()))
                    .then(a.cmp(&b))
            });
            let expected: Vec<WordEntry> = order.into_iter().take(cap).map(|i| entries[i].clone()).collect();
            prop_assert_eq!(ranked, expected);
        }
    }
}
