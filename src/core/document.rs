// File: src/core/document.rs
//! An arena-backed text tree: the document the engine scans and decorates.
//!
//! Elements carry a tag, a class list, attributes and an optional layout box in
//! document coordinates. Text nodes carry their content. Children are linked
//! through sibling pointers, so every traversal step and every structural edit
//! is constant time however wide an element gets.
//!
//! Slots of discarded nodes are recycled under a bumped generation. A `NodeId`
//! therefore names one node for good: once that node is discarded the id stays
//! unknown, even after its slot is reused.
//!
//! Structural edits and scrolling notify subscribers synchronously. Listeners
//! run while the document is mutably borrowed and must not reach back into it.

use crate::core::error::DocumentError;
use crate::core::types::{Rect, Size, ViewportWindow};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Structure,
    Scroll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    ChildrenChanged {
        parent: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Scrolled {
        top: f64,
    },
}

impl DocumentEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            DocumentEvent::ChildrenChanged { .. } => ChangeKind::Structure,
            DocumentEvent::Scrolled { .. } => ChangeKind::Scroll,
        }
    }
}

pub type Listener = Rc<dyn Fn(&DocumentEvent)>;

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    class: String,
    attrs: BTreeMap<String, String>,
    rect: Option<Rect>,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    scroll_top: f64,
    viewport: Size,
    listeners: Vec<(ListenerId, ChangeKind, Listener)>,
    next_listener: u64,
    muted: bool,
}

impl Document {
    /// Creates a document whose root `body` covers the viewport.
    pub fn new(viewport: Size) -> Self {
        let body = Node::new(NodeData::Element(ElementData {
            tag: "body".to_string(),
            class: String::new(),
            attrs: BTreeMap::new(),
            rect: Some(Rect::new(0.0, 0.0, viewport.width, viewport.height)),
        }));
        Self {
            slots: vec![Slot { generation: 0, node: Some(body) }],
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            scroll_top: 0.0,
            viewport,
            listeners: Vec::new(),
            next_listener: 0,
            muted: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Result<&Node, DocumentError> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(DocumentError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DocumentError> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(DocumentError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData, DocumentError> {
        match &self.node(id)?.data {
            NodeData::Element(el) => Ok(el),
            NodeData::Text(_) => Err(DocumentError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DocumentError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(el) => Ok(el),
            NodeData::Text(_) => Err(DocumentError::NotAnElement(id)),
        }
    }

    // --- Construction ---

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            class: String::new(),
            attrs: BTreeMap::new(),
            rect: None,
        }))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(Node::new(data));
                NodeId { index, generation: slot.generation }
            }
            None => {
                self.slots.push(Slot { generation: 0, node: Some(Node::new(data)) });
                NodeId { index: self.slots.len() - 1, generation: 0 }
            }
        }
    }

    /// Frees a detached node and everything below it. Their ids become unknown
    /// and their slots are reused by later nodes.
    pub fn discard(&mut self, id: NodeId) -> Result<(), DocumentError> {
        if id == self.root || self.node(id)?.parent.is_some() {
            return Err(DocumentError::Attached(id));
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            let slot = &mut self.slots[current.index];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
        }
        Ok(())
    }

    /// Slots in the arena, live or free.
    pub fn arena_len(&self) -> usize {
        self.slots.len()
    }

    pub fn set_class(&mut self, id: NodeId, class: &str) -> Result<(), DocumentError> {
        self.element_mut(id)?.class = class.to_string();
        Ok(())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        self.element_mut(id)?.attrs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Sets the layout box of an element, in document coordinates.
    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<(), DocumentError> {
        self.element_mut(id)?.rect = Some(rect);
        Ok(())
    }

    /// Replaces the content of a text node. Not a structural change.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DocumentError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(content) => {
                *content = text.to_string();
                Ok(())
            }
            NodeData::Element(_) => Err(DocumentError::NotText(id)),
        }
    }

    /// Creates an element with a layout box and appends it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, rect: Rect) -> Result<NodeId, DocumentError> {
        let id = self.create_element(tag);
        self.set_rect(id, rect)?;
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Creates a text node and appends it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DocumentError> {
        let id = self.create_text(text);
        self.append_child(parent, id)?;
        Ok(id)
    }

    // --- Queries ---

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).ok().map(|el| el.tag.as_str())
    }

    pub fn class(&self, id: NodeId) -> Option<&str> {
        self.element(id).ok().map(|el| el.class.as_str())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class(id)
            .map_or(false, |list| list.split_whitespace().any(|c| c == class))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).ok()?.attrs.get(name).map(String::as_str)
    }

    /// Content of a text node; `None` for elements and unknown ids.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.data {
            NodeData::Text(content) => Some(content),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?.first_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?.next_sibling
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.first_child(id);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.next_sibling(child);
        }
        out
    }

    /// Concatenated text of `id` and everything below it.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if let Some(content) = self.text(node) {
                out.push_str(content);
            }
            cursor = self.next_within(node, id);
        }
        out
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is `id` itself or lies on its parent chain.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Layout box of a node in document coordinates. Text nodes and elements
    /// without a box of their own report the nearest ancestor's box.
    pub fn bounding_rect(&self, id: NodeId) -> Result<Rect, DocumentError> {
        self.node(id)?;
        if !self.is_attached(id) {
            return Err(DocumentError::Detached(id));
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if let Ok(el) = self.element(node) {
                if let Some(rect) = el.rect {
                    return Ok(rect);
                }
            }
            current = self.parent(node);
        }
        Err(DocumentError::Detached(id))
    }

    /// The node after `id` in document (pre-)order, staying inside the root.
    pub fn next_in_order(&self, id: NodeId) -> Option<NodeId> {
        self.next_within(id, self.root)
    }

    /// Pre-order successor of `id` that stays below `scope`.
    fn next_within(&self, id: NodeId, scope: NodeId) -> Option<NodeId> {
        if let Some(first) = self.first_child(id) {
            return Some(first);
        }
        let mut current = id;
        while current != scope {
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
        None
    }

    /// Attached elements carrying `class`, in document order.
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut cursor = Some(self.root);
        while let Some(id) = cursor {
            if self.has_class(id, class) {
                found.push(id);
            }
            cursor = self.next_in_order(id);
        }
        found
    }

    // --- Structural edits ---

    fn unlink(&mut self, id: NodeId) -> Result<Option<NodeId>, DocumentError> {
        let (parent, prev, next) = {
            let node = self.node(id)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        let Some(parent) = parent else {
            return Ok(None);
        };
        match prev {
            Some(prev) => self.node_mut(prev)?.next_sibling = next,
            None => self.node_mut(parent)?.first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next)?.prev_sibling = prev,
            None => self.node_mut(parent)?.last_child = prev,
        }
        let node = self.node_mut(id)?;
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        Ok(Some(parent))
    }

    /// Links a detached `child` into `parent`, before `before` or at the end.
    fn link(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> Result<(), DocumentError> {
        let prev = match before {
            Some(next) => self.node(next)?.prev_sibling,
            None => self.node(parent)?.last_child,
        };
        {
            let node = self.node_mut(child)?;
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = before;
        }
        match prev {
            Some(prev) => self.node_mut(prev)?.next_sibling = Some(child),
            None => self.node_mut(parent)?.first_child = Some(child),
        }
        match before {
            Some(next) => self.node_mut(next)?.prev_sibling = Some(child),
            None => self.node_mut(parent)?.last_child = Some(child),
        }
        Ok(())
    }

    /// Rejects placing `child` under `parent` when that would make it its own ancestor.
    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.node(child)?;
        if child == self.root || self.contains(child, parent) {
            return Err(DocumentError::Cycle(child));
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.element(parent)?;
        self.check_insert(parent, child)?;
        self.unlink(child)?;
        self.link(parent, child, None)?;
        self.notify(&DocumentEvent::ChildrenChanged {
            parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    pub fn remove(&mut self, id: NodeId) -> Result<(), DocumentError> {
        if let Some(parent) = self.unlink(id)? {
            self.notify(&DocumentEvent::ChildrenChanged {
                parent,
                added: Vec::new(),
                removed: vec![id],
            });
        }
        Ok(())
    }

    /// Puts `replacements` where `id` was and detaches `id`.
    pub fn replace_with(&mut self, id: NodeId, replacements: Vec<NodeId>) -> Result<(), DocumentError> {
        let parent = self.node(id)?.parent.ok_or(DocumentError::Detached(id))?;
        for &r in &replacements {
            if r == id {
                return Err(DocumentError::Cycle(r));
            }
            self.check_insert(parent, r)?;
        }
        for &r in &replacements {
            self.unlink(r)?;
            self.link(parent, r, Some(id))?;
        }
        self.unlink(id)?;
        self.notify(&DocumentEvent::ChildrenChanged {
            parent,
            added: replacements,
            removed: vec![id],
        });
        Ok(())
    }

    /// Merges adjacent text children of `id` and drops empty ones. Merged-away
    /// nodes are discarded.
    pub fn normalize(&mut self, id: NodeId) -> Result<(), DocumentError> {
        let mut removed = Vec::new();
        let mut last_text: Option<NodeId> = None;
        let mut cursor = self.first_child(id);
        while let Some(child) = cursor {
            cursor = self.next_sibling(child);
            let Some(content) = self.text(child).map(str::to_string) else {
                last_text = None;
                continue;
            };
            match last_text {
                Some(keep) => {
                    let merged = format!("{}{}", self.text(keep).unwrap_or_default(), content);
                    self.set_text(keep, &merged)?;
                    self.unlink(child)?;
                    removed.push(child);
                }
                None if content.is_empty() => {
                    self.unlink(child)?;
                    removed.push(child);
                }
                None => last_text = Some(child),
            }
        }
        if !removed.is_empty() {
            self.notify(&DocumentEvent::ChildrenChanged { parent: id, added: Vec::new(), removed: removed.clone() });
        }
        for child in removed {
            self.discard(child)?;
        }
        Ok(())
    }

    // --- Viewport ---

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Scrolls to `top`, clamped at zero. Only an actual move notifies.
    pub fn scroll_to(&mut self, top: f64) {
        let top = top.max(0.0);
        if top == self.scroll_top {
            return;
        }
        self.scroll_top = top;
        self.notify(&DocumentEvent::Scrolled { top });
    }

    pub fn viewport_window(&self, buffer: f64) -> ViewportWindow {
        ViewportWindow::from_scroll(self.scroll_top, self.viewport.height, buffer)
    }

    // --- Change notification ---

    pub fn subscribe(&mut self, kind: ChangeKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, kind, listener));
        id
    }

    /// Returns whether the listener was still registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Runs `f` with notifications suppressed.
    pub fn quietly<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.muted, true);
        let result = f(self);
        self.muted = previous;
        result
    }

    fn notify(&self, event: &DocumentEvent) {
        if self.muted {
            return;
        }
        let kind = event.kind();
        let targets: Vec<Listener> = self
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, l)| Rc::clone(l))
            .collect();
        for listener in targets {
            listener(event);
        }
    }
}
