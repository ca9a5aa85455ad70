use crate::core::annotator::{AnnotationApplier, Marker, ProcessedSet};
use crate::core::config::EngineConfig;
use crate::core::document::{Document, NodeId};
use crate::core::error::EngineError;
use crate::core::popover::place_popover;
use crate::core::scanner::DocumentScanner;
use crate::core::scheduler::{debounce, Scheduler};
use crate::core::types::{Point, Size, WordEntry};
use crate::core::vocabulary::{VocabularySource, WorkingVocabulary};
use crate::core::watcher::ChangeWatcher;
use crate::ranking::VocabularyRanker;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Active { words: usize },
    AlreadyActive,
    /// The wordbook was empty or held no usable words.
    NoVocabulary,
    /// Loading or compiling the vocabulary failed; the cause was logged.
    Failed,
}

/// Messages the host forwards from the settings surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlMessage {
    UpdateHighlightSettings { enabled: bool },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// Scan passes started, initial and rescans alike.
    pub passes: usize,
    pub slices: usize,
    /// Text units run through the vocabulary pattern.
    pub units_tested: usize,
    pub markers_created: usize,
    /// Debounced rescans fired by the change watcher.
    pub rescans: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopoverView {
    pub anchor: NodeId,
    pub marker: Marker,
    /// Top-left corner in viewport coordinates.
    pub position: Point,
}

struct EngineState {
    config: EngineConfig,
    vocabulary: Option<WorkingVocabulary>,
    processed: ProcessedSet,
    popover: Option<PopoverView>,
    /// Bumped on init and teardown so queued continuations from an older
    /// session stop on their own.
    generation: u64,
    stats: ScanStats,
}

/// Everything a deferred scan slice needs.
#[derive(Clone)]
struct ScanContext {
    document: Rc<RefCell<Document>>,
    scheduler: Rc<dyn Scheduler>,
    state: Rc<RefCell<EngineState>>,
}

impl ScanContext {
    fn request_scan(&self) {
        let generation = self.state.borrow().generation;
        let ctx = self.clone();
        self.scheduler.schedule_work(Box::new(move || ctx.run_pass(generation, None)));
    }

    fn run_pass(&self, generation: u64, resume: Option<NodeId>) {
        match self.run_slice(generation, resume) {
            Ok(Some(next)) => {
                let ctx = self.clone();
                self.scheduler
                    .schedule_work(Box::new(move || ctx.run_pass(generation, Some(next))));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "scan slice abandoned"),
        }
    }

    fn run_slice(&self, generation: u64, resume: Option<NodeId>) -> Result<Option<NodeId>, EngineError> {
        let mut state = self.state.try_borrow_mut().map_err(|_| EngineError::EngineBusy)?;
        if state.generation != generation {
            return Ok(None);
        }
        let mut doc = self.document.try_borrow_mut().map_err(|_| EngineError::DocumentBusy)?;

        let EngineState { config, vocabulary, processed, stats, .. } = &mut *state;
        let Some(vocabulary) = vocabulary.as_ref() else {
            return Ok(None);
        };
        if resume.is_none() {
            stats.passes += 1;
        }
        stats.slices += 1;

        let report = DocumentScanner::new(config).scan_slice(&mut doc, vocabulary, processed, resume);
        stats.units_tested += report.batch.tested;
        stats.markers_created += report.batch.markers;
        debug!(
            units = report.units,
            markers = report.batch.markers,
            yielded = report.resume.is_some(),
            "scan slice finished"
        );
        Ok(report.resume)
    }
}

/// The composition root: loads and ranks the vocabulary, scans the document,
/// keeps watching it, and undoes everything on teardown.
pub struct HighlightEngine<V: VocabularySource> {
    ctx: ScanContext,
    source: V,
    ranker: VocabularyRanker,
    applier: AnnotationApplier,
    watcher: Option<ChangeWatcher>,
}

impl<V: VocabularySource> HighlightEngine<V> {
    pub fn new(
        document: Rc<RefCell<Document>>,
        scheduler: Rc<dyn Scheduler>,
        source: V,
        config: EngineConfig,
    ) -> Self {
        let state = EngineState {
            config,
            vocabulary: None,
            processed: ProcessedSet::default(),
            popover: None,
            generation: 0,
            stats: ScanStats::default(),
        };
        Self {
            ctx: ScanContext { document, scheduler, state: Rc::new(RefCell::new(state)) },
            source,
            ranker: VocabularyRanker::new(),
            applier: AnnotationApplier::new(),
            watcher: None,
        }
    }

    /// Loads the configured wordbook and starts highlighting. The first scan is
    /// only queued once the vocabulary is fully ranked and compiled.
    pub fn init(&mut self) -> InitOutcome {
        if self.is_active() {
            return InitOutcome::AlreadyActive;
        }
        let (book_id, max_words, window) = {
            let state = self.ctx.state.borrow();
            (state.config.book_id, state.config.max_words, state.config.debounce_window())
        };

        let raw = match self.source.load(book_id) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(book_id, error = %e, "failed to load vocabulary");
                return InitOutcome::Failed;
            }
        };
        let now = Utc::now();
        let entries: Vec<WordEntry> = raw.into_iter().filter_map(|r| r.normalize(now)).collect();
        if entries.is_empty() {
            info!(book_id, "no words to highlight");
            return InitOutcome::NoVocabulary;
        }
        let ranked = self.ranker.rank(entries, max_words, now);
        let vocabulary = match WorkingVocabulary::build(ranked, max_words) {
            Ok(vocabulary) => vocabulary,
            Err(EngineError::EmptyVocabulary) => return InitOutcome::NoVocabulary,
            Err(e) => {
                warn!(book_id, error = %e, "failed to build vocabulary");
                return InitOutcome::Failed;
            }
        };
        let words = vocabulary.len();
        {
            let mut state = self.ctx.state.borrow_mut();
            state.vocabulary = Some(vocabulary);
            state.generation += 1;
        }
        self.ctx.request_scan();

        let ctx = self.ctx.clone();
        let rescan = debounce(Rc::clone(&self.ctx.scheduler), window, move || {
            if let Ok(mut state) = ctx.state.try_borrow_mut() {
                state.stats.rescans += 1;
            }
            ctx.request_scan();
        });
        match ChangeWatcher::attach(&self.ctx.document, rescan) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => warn!(error = %e, "change watcher not attached"),
        }

        info!(book_id, words, "highlighter initialized");
        InitOutcome::Active { words }
    }

    /// Stops watching, removes every marker and forgets the vocabulary, so a
    /// later `init` starts from scratch.
    pub fn teardown(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.detach();
        }
        let restored = self.remove_highlights();
        let mut state = self.ctx.state.borrow_mut();
        state.vocabulary = None;
        state.generation += 1;
        info!(restored, "highlighter torn down");
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.init();
        } else {
            self.teardown();
        }
    }

    pub fn handle_message(&mut self, message: &ControlMessage) {
        match message {
            ControlMessage::UpdateHighlightSettings { enabled } => self.set_enabled(*enabled),
        }
    }

    /// Queues a scan pass. Units already processed are skipped, so extra
    /// passes cost little.
    pub fn rescan(&self) {
        if self.is_active() {
            self.ctx.request_scan();
        }
    }

    /// Replaces every marker with its text and clears the processed set.
    pub fn remove_highlights(&mut self) -> usize {
        let mut state = self.ctx.state.borrow_mut();
        state.popover = None;
        match self.ctx.document.try_borrow_mut() {
            Ok(mut doc) => self.applier.remove_highlights(&mut doc, &mut state.processed),
            Err(_) => {
                warn!("document busy, highlights left in place");
                state.processed.clear();
                0
            }
        }
    }

    /// Shows the popover for a marker. Returns `None` for anything that is not
    /// a marker, or when its position cannot be computed.
    pub fn pointer_enter(&mut self, node: NodeId) -> Option<PopoverView> {
        let mut state = self.ctx.state.borrow_mut();
        if state.vocabulary.is_none() {
            return None;
        }
        let Ok(doc) = self.ctx.document.try_borrow() else {
            warn!("document busy, popover skipped");
            return None;
        };
        let marker = Marker::from_node(&doc, node)?;
        let layout = state.config.popover;
        match doc.bounding_rect(node) {
            Ok(rect) => {
                let anchor = rect.translated(0.0, -doc.scroll_top());
                let position = place_popover(anchor, Size::new(layout.width, layout.height), doc.viewport(), &layout);
                let view = PopoverView { anchor: node, marker, position };
                state.popover = Some(view.clone());
                Some(view)
            }
            Err(e) => {
                warn!(?node, error = %e, "cannot place popover");
                state.popover = None;
                None
            }
        }
    }

    pub fn pointer_leave(&mut self, node: NodeId) {
        let mut state = self.ctx.state.borrow_mut();
        if state.popover.as_ref().map_or(false, |p| p.anchor == node) {
            state.popover = None;
        }
    }

    pub fn popover(&self) -> Option<PopoverView> {
        self.ctx.state.borrow().popover.clone()
    }

    pub fn is_active(&self) -> bool {
        self.ctx.state.borrow().vocabulary.is_some()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn rescan_pending(&self) -> bool {
        self.watcher.as_ref().map_or(false, ChangeWatcher::is_pending)
    }

    pub fn stats(&self) -> ScanStats {
        self.ctx.state.borrow().stats
    }

    pub fn processed_len(&self) -> usize {
        self.ctx.state.borrow().processed.len()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.ctx.state.borrow().vocabulary.as_ref().map_or(0, WorkingVocabulary::len)
    }

    pub fn config(&self) -> EngineConfig {
        self.ctx.state.borrow().config.clone()
    }

    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.ctx.document
    }
}
