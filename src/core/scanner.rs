// File: src/core/scanner.rs
use crate::core::annotator::{AnnotationApplier, BatchReport, ProcessedSet, MARKER_CLASS_PREFIX};
use crate::core::config::EngineConfig;
use crate::core::document::{Document, NodeId};
use crate::core::types::ViewportWindow;
use crate::core::vocabulary::WorkingVocabulary;
use tracing::{debug, trace};

/// Containers whose text is never decorated.
const EXCLUDED_TAGS: [&str; 5] = ["script", "style", "noscript", "textarea", "input"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SliceReport {
    /// Units handed to the annotator during this slice.
    pub units: usize,
    pub batch: BatchReport,
    /// Where the next slice picks up, if the budget ran out first.
    pub resume: Option<NodeId>,
}

/// Walks text units in document order, a bounded number per slice.
pub struct DocumentScanner<'a> {
    config: &'a EngineConfig,
    applier: AnnotationApplier,
}

impl<'a> DocumentScanner<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config, applier: AnnotationApplier::new() }
    }

    /// Scans from `resume` (or the root) until the document ends or the
    /// per-slice unit budget is spent. A resume point that has since been
    /// detached restarts the walk from the root.
    pub fn scan_slice(
        &self,
        doc: &mut Document,
        vocabulary: &WorkingVocabulary,
        processed: &mut ProcessedSet,
        resume: Option<NodeId>,
    ) -> SliceReport {
        let window = doc.viewport_window(self.config.viewport_buffer);
        let batch_size = self.config.batch_size.max(1);
        let budget = self.config.units_per_slice.max(1);

        let mut cursor = match resume {
            Some(node) if doc.is_attached(node) => Some(node),
            Some(node) => {
                debug!(?node, "resume point detached, restarting from root");
                Some(doc.root())
            }
            None => Some(doc.root()),
        };

        let mut report = SliceReport::default();
        let mut batch = Vec::with_capacity(batch_size);
        while let Some(node) = cursor {
            // Computed before the batch is applied; only batch units get replaced.
            cursor = doc.next_in_order(node);
            if !self.accepts(doc, node, processed, &window) {
                continue;
            }
            batch.push(node);
            if batch.len() < batch_size {
                continue;
            }
            report.batch.absorb(self.applier.apply_batch(doc, &batch, vocabulary, processed));
            report.units += batch.len();
            batch.clear();
            if report.units >= budget {
                report.resume = cursor;
                return report;
            }
        }
        if !batch.is_empty() {
            report.batch.absorb(self.applier.apply_batch(doc, &batch, vocabulary, processed));
            report.units += batch.len();
        }
        report
    }

    /// Whether `node` is an unprocessed, visible, decoratable text unit.
    pub fn accepts(&self, doc: &Document, node: NodeId, processed: &ProcessedSet, window: &ViewportWindow) -> bool {
        if !doc.is_text(node) || processed.contains(node) {
            return false;
        }
        let Some(parent) = doc.parent(node) else {
            return false;
        };
        match doc.bounding_rect(parent) {
            Ok(rect) if window.overlaps(&rect) => {}
            Ok(_) => return false,
            Err(e) => {
                trace!(?node, error = %e, "no layout for text unit");
                return false;
            }
        }
        if is_excluded(doc, parent) {
            return false;
        }
        doc.text(node)
            .map_or(false, |text| text.bytes().any(|b| b.is_ascii_alphabetic()))
    }
}

fn is_excluded(doc: &Document, element: NodeId) -> bool {
    if doc.tag(element).map_or(false, |tag| EXCLUDED_TAGS.iter().any(|t| *t == tag)) {
        return true;
    }
    doc.class(element)
        .map_or(false, |class| class.contains(MARKER_CLASS_PREFIX) || class.contains("highlight"))
}
