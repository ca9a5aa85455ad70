// File: src/core/watcher.rs
use crate::core::document::{ChangeKind, Document, DocumentEvent, ListenerId};
use crate::core::error::EngineError;
use crate::core::scheduler::Debounce;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::warn;

/// Feeds structural changes and scrolling into a debounced rescan.
pub struct ChangeWatcher {
    document: Weak<RefCell<Document>>,
    rescan: Rc<Debounce>,
    subscriptions: Vec<ListenerId>,
}

impl ChangeWatcher {
    pub fn attach(document: &Rc<RefCell<Document>>, rescan: Debounce) -> Result<Self, EngineError> {
        let rescan = Rc::new(rescan);
        let mut doc = document.try_borrow_mut().map_err(|_| EngineError::DocumentBusy)?;

        let on_structure = Rc::clone(&rescan);
        let structure = doc.subscribe(
            ChangeKind::Structure,
            Rc::new(move |event: &DocumentEvent| {
                if let DocumentEvent::ChildrenChanged { added, removed, .. } = event {
                    if !added.is_empty() || !removed.is_empty() {
                        on_structure.trigger();
                    }
                }
            }),
        );
        let on_scroll = Rc::clone(&rescan);
        let scroll = doc.subscribe(ChangeKind::Scroll, Rc::new(move |_: &DocumentEvent| on_scroll.trigger()));

        Ok(Self {
            document: Rc::downgrade(document),
            rescan,
            subscriptions: vec![structure, scroll],
        })
    }

    pub fn is_pending(&self) -> bool {
        self.rescan.is_pending()
    }

    /// Cancels the pending rescan and drops both subscriptions.
    pub fn detach(&mut self) {
        self.rescan.cancel();
        if self.subscriptions.is_empty() {
            return;
        }
        let Some(document) = self.document.upgrade() else {
            self.subscriptions.clear();
            return;
        };
        let borrowed = document.try_borrow_mut();
        match borrowed {
            Ok(mut doc) => {
                for id in self.subscriptions.drain(..) {
                    doc.unsubscribe(id);
                }
            }
            Err(_) => warn!("document busy, change listeners left registered"),
        };
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.detach();
    }
}
