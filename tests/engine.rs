mod common;

use common::{apple, paragraph, paragraphs, tall_viewport, word, Fixture};
use wordmark_core::core::config::EngineConfig;
use wordmark_core::core::types::{Point, RawWordEntry};
use wordmark_core::persistence::Wordbook;
use wordmark_core::{ControlMessage, InitOutcome};

#[test]
fn single_word_is_decorated_and_restored() {
    let mut p = None;
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        p = Some(paragraph(doc, 0.0, "apple").0);
    });
    let p = p.unwrap();

    assert_eq!(fx.engine.init(), InitOutcome::Active { words: 1 });
    fx.scheduler.run_until_idle();

    let markers = fx.marker_views();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].word, "apple");
    assert_eq!(markers[0].meaning, "a fruit");
    assert_eq!(markers[0].accent, "/ˈæp.əl/");
    assert_eq!(markers[0].text, "apple");

    assert_eq!(fx.engine.remove_highlights(), 1);
    assert!(fx.markers().is_empty());
    assert_eq!(fx.engine.processed_len(), 0);
    let doc = fx.document.borrow();
    assert_eq!(doc.children(p).len(), 1);
    assert_eq!(doc.text(doc.children(p)[0]), Some("apple"));
}

#[test]
fn every_occurrence_keeps_its_case_and_restores_exactly() {
    let original = "An apple a day; APPLE pie, pineapple.";
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, original);
    });
    fx.engine.init();
    fx.scheduler.run_until_idle();

    let texts: Vec<String> = fx.marker_views().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec!["apple", "APPLE"]);
    assert!(fx.marker_views().iter().all(|m| m.word == "apple"));
    assert_eq!(fx.text(), original);

    fx.engine.remove_highlights();
    assert_eq!(fx.text(), original);
}

#[test]
fn longer_words_win_over_their_prefixes() {
    let mut fx = Fixture::new(vec![apple(), word("apple-pie")], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "Warm apple-pie and an apple.");
    });
    fx.engine.init();
    fx.scheduler.run_until_idle();

    let words: Vec<String> = fx.marker_views().into_iter().map(|m| m.word).collect();
    assert_eq!(words, vec!["apple-pie", "apple"]);
}

#[test]
fn second_pass_adds_nothing() {
    let mut fx = Fixture::new(vec![apple(), word("pear")], EngineConfig::default(), |doc| {
        paragraphs(doc, 12, "an apple and a pear");
        paragraph(doc, 300.0, "nothing to see");
    });
    fx.engine.init();
    fx.scheduler.run_until_idle();
    let markers = fx.markers().len();
    let processed = fx.engine.processed_len();
    let tested = fx.engine.stats().units_tested;
    assert_eq!(markers, 24);

    fx.engine.rescan();
    fx.scheduler.run_until_idle();
    assert_eq!(fx.markers().len(), markers);
    assert_eq!(fx.engine.processed_len(), processed);
    assert_eq!(fx.engine.stats().units_tested, tested);
    assert_eq!(fx.engine.stats().passes, 2);
}

#[test]
fn burst_of_mutations_triggers_one_rescan() {
    let mut p = None;
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        p = Some(paragraph(doc, 0.0, "apple").0);
    });
    let p = p.unwrap();
    fx.engine.init();
    fx.scheduler.run_until_idle();
    assert_eq!(fx.engine.stats().passes, 1);

    for _ in 0..50 {
        fx.document.borrow_mut().append_text(p, "apple").unwrap();
        fx.advance_ms(2);
    }
    assert!(fx.engine.rescan_pending());
    assert_eq!(fx.advance_ms(400), 0);
    assert_eq!(fx.engine.stats().rescans, 0);

    assert_eq!(fx.advance_ms(200), 1);
    let stats = fx.engine.stats();
    assert_eq!(stats.rescans, 1);
    assert_eq!(stats.passes, 2);
    assert_eq!(fx.markers().len(), 51);

    // The rescan's own edits stay quiet.
    fx.advance_ms(5_000);
    assert_eq!(fx.engine.stats().rescans, 1);
    assert!(!fx.engine.rescan_pending());
}

#[test]
fn teardown_restores_and_stops_watching() {
    let mut p = None;
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        p = Some(paragraph(doc, 0.0, "one apple, two apples").0);
    });
    let p = p.unwrap();
    fx.engine.init();
    fx.scheduler.run_until_idle();
    assert_eq!(fx.markers().len(), 1);

    fx.document.borrow_mut().append_text(p, " and an apple").unwrap();
    assert!(fx.engine.rescan_pending());

    fx.engine.teardown();
    assert!(!fx.engine.is_active());
    assert!(!fx.engine.is_watching());
    assert_eq!(fx.scheduler.pending_timers(), 0);
    assert_eq!(fx.document.borrow().listener_count(), 0);
    assert!(fx.markers().is_empty());
    assert_eq!(fx.engine.vocabulary_len(), 0);
    assert_eq!(fx.text(), "one apple, two apples and an apple");

    fx.document.borrow_mut().append_text(p, " apple").unwrap();
    fx.advance_ms(1_000);
    fx.scheduler.run_until_idle();
    assert!(fx.markers().is_empty());
    assert_eq!(fx.engine.stats().passes, 1);

    assert_eq!(fx.engine.init(), InitOutcome::Active { words: 1 });
    fx.scheduler.run_until_idle();
    assert_eq!(fx.markers().len(), 3);
}

#[test]
fn queued_slices_stop_after_teardown() {
    let config = EngineConfig { batch_size: 10, units_per_slice: 10, ..EngineConfig::default() };
    let mut fx = Fixture::new(vec![apple()], config, |doc| {
        tall_viewport(doc);
        paragraphs(doc, 50, "apple");
    });
    fx.engine.init();
    assert!(fx.scheduler.run_next());
    assert_eq!(fx.markers().len(), 10);
    assert_eq!(fx.scheduler.pending_work(), 1);

    fx.engine.teardown();
    fx.scheduler.run_until_idle();
    assert!(fx.markers().is_empty());
    assert_eq!(fx.engine.stats().slices, 1);
}

#[test]
fn init_twice_is_a_no_op() {
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "apple");
    });
    fx.engine.init();
    assert_eq!(fx.engine.init(), InitOutcome::AlreadyActive);
    assert_eq!(fx.document.borrow().listener_count(), 2);
}

#[test]
fn failed_load_leaves_the_document_alone() {
    let mut fx = Fixture::with_source(Wordbook::new(), EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "apple");
    });
    assert_eq!(fx.engine.init(), InitOutcome::Failed);
    assert_eq!(fx.scheduler.run_until_idle(), 0);
    assert!(fx.markers().is_empty());
    assert!(!fx.engine.is_watching());
    assert_eq!(fx.document.borrow().listener_count(), 0);
}

#[test]
fn empty_wordbook_means_no_vocabulary() {
    let blank = RawWordEntry { word: "   ".into(), ..RawWordEntry::default() };
    for words in [vec![], vec![blank]] {
        let mut fx = Fixture::new(words, EngineConfig::default(), |doc| {
            paragraph(doc, 0.0, "apple");
        });
        assert_eq!(fx.engine.init(), InitOutcome::NoVocabulary);
        assert_eq!(fx.scheduler.run_until_idle(), 0);
        assert!(!fx.engine.is_active());
    }
}

#[test]
fn oversized_wordbook_is_ranked_down_to_capacity() {
    let config = EngineConfig { max_words: 2, ..EngineConfig::default() };
    let mut frequent = word("extraordinary");
    frequent.frequency = Some(500.0);
    let mut fx = Fixture::new(vec![word("cat"), word("dog"), frequent], config, |doc| {
        paragraph(doc, 0.0, "cat dog extraordinary");
    });
    assert_eq!(fx.engine.init(), InitOutcome::Active { words: 2 });
    fx.scheduler.run_until_idle();

    let words: Vec<String> = fx.marker_views().into_iter().map(|m| m.word).collect();
    assert_eq!(words, vec!["cat", "extraordinary"]);
}

#[test]
fn settings_messages_toggle_highlighting() {
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "apple");
    });
    let on: ControlMessage = serde_json::from_str(r#"{"type":"updateHighlightSettings","enabled":true}"#).unwrap();
    let off: ControlMessage = serde_json::from_str(r#"{"type":"updateHighlightSettings","enabled":false}"#).unwrap();
    assert_eq!(on, ControlMessage::UpdateHighlightSettings { enabled: true });

    fx.engine.handle_message(&on);
    fx.scheduler.run_until_idle();
    assert!(fx.engine.is_active());
    assert_eq!(fx.markers().len(), 1);

    fx.engine.handle_message(&off);
    assert!(!fx.engine.is_active());
    assert!(fx.markers().is_empty());
}

#[test]
fn popover_follows_the_pointer() {
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "apple");
        paragraph(doc, 560.0, "apple");
        paragraph(doc, 40.0, "plain words");
    });
    fx.engine.init();
    fx.scheduler.run_until_idle();
    let markers = fx.markers();
    assert_eq!(markers.len(), 2);

    let view = fx.engine.pointer_enter(markers[0]).unwrap();
    assert_eq!(view.marker.meaning, "a fruit");
    assert_eq!(view.position, Point { x: 10.0, y: 25.0 });
    assert_eq!(fx.engine.popover(), Some(view));

    // Near the bottom edge the popover flips above the marker.
    let view = fx.engine.pointer_enter(markers[1]).unwrap();
    assert_eq!(view.position, Point { x: 10.0, y: 455.0 });

    fx.engine.pointer_leave(markers[0]);
    assert!(fx.engine.popover().is_some());
    fx.engine.pointer_leave(markers[1]);
    assert!(fx.engine.popover().is_none());

    let plain = fx.document.borrow().root();
    assert!(fx.engine.pointer_enter(plain).is_none());
}

#[test]
fn popover_is_skipped_for_a_detached_marker() {
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "apple");
    });
    fx.engine.init();
    fx.scheduler.run_until_idle();
    let marker = fx.markers()[0];

    fx.document.borrow_mut().remove(marker).unwrap();
    assert!(fx.engine.pointer_enter(marker).is_none());
    assert!(fx.engine.popover().is_none());
}

#[test]
fn busy_document_rescan_is_dropped_and_watching_continues() {
    let mut p = None;
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        p = Some(paragraph(doc, 0.0, "a pear").0);
    });
    let p = p.unwrap();
    fx.engine.init();
    fx.scheduler.run_until_idle();
    assert!(fx.markers().is_empty());

    fx.document.borrow_mut().append_text(p, " and an apple").unwrap();
    {
        let _reader = fx.document.borrow();
        assert_eq!(fx.advance_ms(600), 1);
    }
    assert!(fx.markers().is_empty());
    assert_eq!(fx.engine.stats().rescans, 1);
    assert!(fx.engine.is_watching());
    assert_eq!(fx.document.borrow().listener_count(), 2);

    fx.document.borrow_mut().append_text(p, " and one more apple").unwrap();
    assert_eq!(fx.advance_ms(600), 1);
    assert_eq!(fx.markers().len(), 2);
    assert_eq!(fx.engine.stats().rescans, 2);
}

#[test]
fn busy_document_still_clears_processed_units() {
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "apple");
    });
    fx.engine.init();
    fx.scheduler.run_until_idle();
    assert_eq!(fx.engine.processed_len(), 1);

    {
        let _reader = fx.document.borrow();
        assert_eq!(fx.engine.remove_highlights(), 0);
    }
    assert_eq!(fx.engine.processed_len(), 0);
    assert_eq!(fx.markers().len(), 1);
}

#[test]
fn repeated_sessions_keep_the_arena_bounded() {
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraphs(doc, 20, "an apple, then another apple");
    });
    let mut slots = Vec::new();
    for _ in 0..4 {
        fx.engine.init();
        fx.scheduler.run_until_idle();
        assert_eq!(fx.markers().len(), 40);
        fx.engine.teardown();
        slots.push(fx.document.borrow().arena_len());
    }
    assert!(slots.iter().all(|&n| n == slots[0]), "arena grew: {:?}", slots);
}

#[test]
fn scrolling_to_the_same_place_does_not_rescan() {
    let mut fx = Fixture::new(vec![apple()], EngineConfig::default(), |doc| {
        paragraph(doc, 0.0, "apple");
    });
    fx.engine.init();
    fx.scheduler.run_until_idle();

    fx.document.borrow_mut().scroll_to(0.0);
    assert!(!fx.engine.rescan_pending());
    fx.document.borrow_mut().scroll_to(30.0);
    assert!(fx.engine.rescan_pending());
}
