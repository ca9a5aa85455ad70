//! Shared fixtures: a document, a virtual-time scheduler and an engine wired to them.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wordmark_core::core::annotator::{Marker, MARKER_CLASS};
use wordmark_core::core::config::EngineConfig;
use wordmark_core::core::document::{Document, NodeId};
use wordmark_core::core::scheduler::LocalScheduler;
use wordmark_core::core::types::{RawWordEntry, Rect, Size};
use wordmark_core::persistence::Wordbook;
use wordmark_core::HighlightEngine;

pub const VIEWPORT: Size = Size { width: 800.0, height: 600.0 };
pub const LINE: f64 = 20.0;

pub struct Fixture {
    pub document: Rc<RefCell<Document>>,
    pub scheduler: Rc<LocalScheduler>,
    pub engine: HighlightEngine<Wordbook>,
}

impl Fixture {
    pub fn new(words: Vec<RawWordEntry>, config: EngineConfig, build: impl FnOnce(&mut Document)) -> Self {
        Self::with_source(Wordbook::with_book(config.book_id, words), config, build)
    }

    pub fn with_source(source: Wordbook, config: EngineConfig, build: impl FnOnce(&mut Document)) -> Self {
        let mut document = Document::new(VIEWPORT);
        build(&mut document);
        let document = Rc::new(RefCell::new(document));
        let scheduler = Rc::new(LocalScheduler::new());
        let engine = HighlightEngine::new(Rc::clone(&document), scheduler.clone(), source, config);
        Self { document, scheduler, engine }
    }

    pub fn markers(&self) -> Vec<NodeId> {
        self.document.borrow().query_class(MARKER_CLASS)
    }

    pub fn marker_views(&self) -> Vec<Marker> {
        let doc = self.document.borrow();
        doc.query_class(MARKER_CLASS)
            .into_iter()
            .filter_map(|node| Marker::from_node(&doc, node))
            .collect()
    }

    pub fn text(&self) -> String {
        let doc = self.document.borrow();
        doc.text_content(doc.root())
    }

    pub fn advance_ms(&self, ms: u64) -> usize {
        self.scheduler.advance(Duration::from_millis(ms))
    }
}

pub fn apple() -> RawWordEntry {
    RawWordEntry::new("apple", "a fruit", "/ˈæp.əl/")
}

pub fn word(word: &str) -> RawWordEntry {
    RawWordEntry::new(word, &format!("meaning of {}", word), "")
}

/// Appends a one-line paragraph at `top` and returns `(paragraph, text)`.
pub fn paragraph(doc: &mut Document, top: f64, text: &str) -> (NodeId, NodeId) {
    let root = doc.root();
    let p = doc.append_element(root, "p", Rect::new(0.0, top, VIEWPORT.width, LINE)).unwrap();
    let t = doc.append_text(p, text).unwrap();
    (p, t)
}

/// `count` paragraphs stacked from the top of the document.
pub fn paragraphs(doc: &mut Document, count: usize, text: &str) -> Vec<NodeId> {
    (0..count)
        .map(|i| paragraph(doc, i as f64 * LINE, text).0)
        .collect()
}

/// A viewport tall enough to show every paragraph at once.
pub fn tall_viewport(doc: &mut Document) {
    doc.set_viewport(Size::new(VIEWPORT.width, 1_000_000.0));
}
