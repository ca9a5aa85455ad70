// File: src/core/annotator.rs
use crate::core::document::{Document, NodeId};
use crate::core::error::DocumentError;
use crate::core::types::WordEntry;
use crate::core::vocabulary::WorkingVocabulary;
use std::collections::HashSet;
use tracing::warn;

/// Class carried by every marker; one class query finds them all.
pub const MARKER_CLASS: &str = "wordmark-highlighted-word";
/// Elements whose class contains this prefix belong to the highlighter.
pub const MARKER_CLASS_PREFIX: &str = "wordmark-";
pub const ATTR_WORD: &str = "data-word";
pub const ATTR_MEANING: &str = "data-mean";
pub const ATTR_ACCENT: &str = "data-accent";

/// What a marker exposes to downstream consumers such as a tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub word: String,
    pub meaning: String,
    pub accent: String,
    /// The decorated text, in the document's own casing.
    pub text: String,
}

impl Marker {
    pub fn from_node(doc: &Document, node: NodeId) -> Option<Self> {
        if !doc.has_class(node, MARKER_CLASS) {
            return None;
        }
        Some(Self {
            word: doc.attr(node, ATTR_WORD)?.to_string(),
            meaning: doc.attr(node, ATTR_MEANING).unwrap_or_default().to_string(),
            accent: doc.attr(node, ATTR_ACCENT).unwrap_or_default().to_string(),
            text: doc.text_content(node),
        })
    }
}

/// Text units already handled. Ids are never reused by the document, so a
/// unit that gets replaced is seen as new.
#[derive(Debug, Default)]
pub struct ProcessedSet(HashSet<NodeId>);

impl ProcessedSet {
    /// Returns true if `node` was not marked before.
    pub fn mark(&mut self, node: NodeId) -> bool {
        self.0.insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Units run through the pattern.
    pub tested: usize,
    /// Units that ended up decorated.
    pub decorated: usize,
    pub markers: usize,
}

impl BatchReport {
    pub fn absorb(&mut self, other: BatchReport) {
        self.tested += other.tested;
        self.decorated += other.decorated;
        self.markers += other.markers;
    }
}

enum Fragment<'a> {
    Text(&'a str),
    Marker(&'a WordEntry, &'a str),
}

pub struct AnnotationApplier;

impl AnnotationApplier {
    pub fn new() -> Self {
        Self
    }

    /// Decorates every vocabulary occurrence in `units` and marks them processed.
    /// Edits made here raise no change notifications.
    pub fn apply_batch(
        &self,
        doc: &mut Document,
        units: &[NodeId],
        vocabulary: &WorkingVocabulary,
        processed: &mut ProcessedSet,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for &unit in units {
            if processed.contains(unit) {
                continue;
            }
            let Some(text) = doc.text(unit).map(str::to_string) else {
                processed.mark(unit);
                continue;
            };
            report.tested += 1;
            if !vocabulary.pattern().is_match(&text) {
                processed.mark(unit);
                continue;
            }

            let fragments = split_matches(&text, vocabulary);
            let markers = fragments.iter().filter(|f| matches!(f, Fragment::Marker(..))).count();
            if markers > 0 {
                match doc.quietly(|doc| rebuild(doc, unit, &fragments)) {
                    Ok(plain) => {
                        for node in plain {
                            processed.mark(node);
                        }
                        report.decorated += 1;
                        report.markers += markers;
                    }
                    Err(e) => warn!(?unit, error = %e, "failed to decorate text unit"),
                }
            }
            processed.mark(unit);
        }
        report
    }

    /// Turns every marker back into plain text, merges the text back together
    /// and forgets which units were processed. Returns the number of markers removed.
    pub fn remove_highlights(&self, doc: &mut Document, processed: &mut ProcessedSet) -> usize {
        let markers = doc.query_class(MARKER_CLASS);
        let restored = doc.quietly(|doc| {
            let mut parents: Vec<NodeId> = Vec::new();
            let mut restored = 0;
            for marker in markers {
                let Some(parent) = doc.parent(marker) else { continue };
                let text = doc.text_content(marker);
                let plain = doc.create_text(&text);
                match doc.replace_with(marker, vec![plain]).and_then(|()| doc.discard(marker)) {
                    Ok(()) => {
                        restored += 1;
                        if !parents.contains(&parent) {
                            parents.push(parent);
                        }
                    }
                    Err(e) => warn!(?marker, error = %e, "failed to restore marker"),
                }
            }
            for parent in parents {
                if let Err(e) = doc.normalize(parent) {
                    warn!(?parent, error = %e, "failed to merge restored text");
                }
            }
            restored
        });
        processed.clear();
        restored
    }
}

impl Default for AnnotationApplier {
    fn default() -> Self {
        Self::new()
    }
}

fn split_matches<'a>(text: &'a str, vocabulary: &'a WorkingVocabulary) -> Vec<Fragment<'a>> {
    let mut fragments = Vec::new();
    let mut last = 0;
    for m in vocabulary.pattern().find_iter(text) {
        let Some(entry) = vocabulary.get(m.as_str()) else { continue };
        if m.start() > last {
            fragments.push(Fragment::Text(&text[last..m.start()]));
        }
        fragments.push(Fragment::Marker(entry, m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        fragments.push(Fragment::Text(&text[last..]));
    }
    fragments
}

/// Replaces `unit` with the fragments; returns the new plain text nodes.
fn rebuild(doc: &mut Document, unit: NodeId, fragments: &[Fragment<'_>]) -> Result<Vec<NodeId>, DocumentError> {
    let mut nodes = Vec::with_capacity(fragments.len());
    let mut plain = Vec::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => {
                let node = doc.create_text(text);
                plain.push(node);
                nodes.push(node);
            }
            Fragment::Marker(entry, matched) => {
                let span = doc.create_element("span");
                doc.set_class(span, MARKER_CLASS)?;
                doc.set_attr(span, ATTR_WORD, &entry.word)?;
                doc.set_attr(span, ATTR_MEANING, &entry.meaning)?;
                doc.set_attr(span, ATTR_ACCENT, &entry.accent)?;
                let inner = doc.create_text(matched);
                doc.append_child(span, inner)?;
                nodes.push(span);
            }
        }
    }
    doc.replace_with(unit, nodes)?;
    doc.discard(unit)?;
    Ok(plain)
}
