//! Arena-backed document tree
//!
//! The tree stands in for the rendered page content: elements carry a tag
//! name and attributes, text nodes carry their text. A detached node stays
//! in the arena until it is removed; removed slots are reused by later
//! allocations.
//!
//! All text offsets are counted in chars.

pub mod markup;

use crate::error::DomError;

/// Handle to a node in a [`Dom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A mutable document tree rooted at a single `Document` node
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    /// Removed slots, reused before the arena grows
    free: Vec<NodeId>,
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
            root: NodeId(0),
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = Node::new(kind);
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    /// Slots in the arena, live or free
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    // Node inspection

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element(data) => Some(data.tag.as_str()),
            _ => None,
        }
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id).kind {
            NodeKind::Text(text) => {
                *text = value.to_string();
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    /// Length in chars of a text node, or of the rendered text of any other node
    pub fn char_len(&self, id: NodeId) -> usize {
        match self.text(id) {
            Some(text) => text.chars().count(),
            None => self.text_content(id).chars().count(),
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            _ => {
                for &child in &self.node(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // Attributes

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element(data) => data
                .attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).kind {
            NodeKind::Element(data) => &data.attributes,
            _ => &[],
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => {
                if let Some(slot) = data.attributes.iter_mut().find(|(key, _)| key == name) {
                    slot.1 = value.to_string();
                } else {
                    data.attributes.push((name.to_string(), value.to_string()));
                }
                Ok(())
            }
            _ => Err(DomError::NotElement(id)),
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element(data) = &mut self.node_mut(id).kind {
            data.attributes.retain(|(key, _)| key != name);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    // Navigation

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    /// Siblings that come before `id`, nearest first
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.index_in_parent(id) {
            Some((parent, index)) => self.children(parent)[..index].iter().rev().copied().collect(),
            None => Vec::new(),
        }
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: self.parent(id),
        }
    }

    /// `id` followed by its ancestors
    pub fn ancestors_inclusive(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: Some(id),
        }
    }

    /// True when `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_inclusive(node).any(|n| n == ancestor)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Pre-order descendants of `id`, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Descendant text nodes of `id` in document order
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        if self.is_text(id) {
            return vec![id];
        }
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// First node at or below `id` in pre-order matching `pred`
    pub fn find_first(&self, id: NodeId, pred: impl Fn(&Dom, NodeId) -> bool) -> Option<NodeId> {
        if pred(self, id) {
            return Some(id);
        }
        self.descendants(id).into_iter().find(|&n| pred(self, n))
    }

    /// All nodes at or below `id` in pre-order matching `pred`
    pub fn find_all(&self, id: NodeId, pred: impl Fn(&Dom, NodeId) -> bool) -> Vec<NodeId> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter(|&n| pred(self, n))
            .collect()
    }

    /// Nearest inclusive ancestor matching `pred`
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Dom, NodeId) -> bool) -> Option<NodeId> {
        self.ancestors_inclusive(id).find(|&n| pred(self, n))
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = self.ancestors_inclusive(a).collect();
        self.ancestors_inclusive(b).find(|n| chain.contains(n))
    }

    /// Map a char offset in the rendered text of `id` to a text node and an
    /// offset inside it. An offset equal to the total length lands at the
    /// end of the last text node.
    pub fn locate_text(&self, id: NodeId, offset: usize) -> Option<(NodeId, usize)> {
        let mut consumed = 0;
        let mut last = None;
        for node in self.text_nodes(id) {
            let len = self.char_len(node);
            if offset < consumed + len {
                return Some((node, offset - consumed));
            }
            consumed += len;
            last = Some((node, len));
        }
        if offset == consumed {
            last
        } else {
            None
        }
    }

    // Mutation

    /// Remove `id` from its parent, leaving it in the arena
    pub fn detach(&mut self, id: NodeId) {
        if let Some((parent, index)) = self.index_in_parent(id) {
            self.node_mut(parent).children.remove(index);
        }
        self.node_mut(id).parent = None;
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.is_text(parent) || child == self.root || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        let index = match reference {
            Some(r) => self
                .children(parent)
                .iter()
                .position(|&c| c == r)
                .ok_or(DomError::HierarchyRequest { parent, child: r })?,
            None => self.children(parent).len(),
        };
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    pub fn insert_after(&mut self, node: NodeId, new: NodeId) -> Result<(), DomError> {
        let parent = self.parent(node).ok_or(DomError::Detached(node))?;
        let reference = self.next_sibling(node);
        self.insert_before(parent, new, reference)
    }

    /// Put `new` where `old` is and detach `old`
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        let parent = self.parent(old).ok_or(DomError::Detached(old))?;
        self.insert_before(parent, new, Some(old))?;
        self.detach(old);
        Ok(())
    }

    /// Detach `id` and free it together with its subtree. Handles into the
    /// subtree must not be used afterwards; their slots get reused.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut pending = vec![id];
        while let Some(node) = pending.pop() {
            let freed = std::mem::replace(self.node_mut(node), Node::new(NodeKind::Text(String::new())));
            pending.extend(freed.children);
            self.free.push(node);
        }
    }

    /// Remove and free every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
    }

    /// Merge adjacent text nodes and drop empty ones, recursively
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            let Some(text) = self.text(child).map(str::to_string) else {
                previous_text = None;
                self.normalize(child);
                continue;
            };
            if text.is_empty() {
                self.detach(child);
                continue;
            }
            match previous_text {
                Some(previous) => {
                    if let NodeKind::Text(existing) = &mut self.node_mut(previous).kind {
                        existing.push_str(&text);
                    }
                    self.detach(child);
                }
                None => previous_text = Some(child),
            }
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's ancestor chain
pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.parent(current);
        Some(current)
    }
}

/// Byte index of the `chars`-th char of `text`, clamped to its length
pub fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Char offset of the first occurrence of `needle` in `haystack`
pub fn find_chars(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(dom: &mut Dom, parts: &[&str]) -> NodeId {
        let p = dom.create_element("p");
        let root = dom.root();
        dom.append_child(root, p).unwrap();
        for part in parts {
            let text = dom.create_text(part);
            dom.append_child(p, text).unwrap();
        }
        p
    }

    #[test]
    fn test_text_content_and_navigation() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["alpha ", "beta"]);
        let first = dom.children(p)[0];
        let second = dom.children(p)[1];

        assert_eq!(dom.text_content(p), "alpha beta");
        assert_eq!(dom.next_sibling(first), Some(second));
        assert_eq!(dom.previous_sibling(second), Some(first));
        assert_eq!(dom.previous_sibling(first), None);
        assert_eq!(dom.ancestors(first).collect::<Vec<_>>(), vec![p, dom.root()]);
    }

    #[test]
    fn test_normalize_merges_and_drops_empty() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["a", "", "b", "c"]);
        let span = dom.create_element("span");
        dom.append_child(p, span).unwrap();
        let tail = dom.create_text("d");
        dom.append_child(p, tail).unwrap();

        dom.normalize(p);

        assert_eq!(dom.children(p).len(), 3);
        assert_eq!(dom.text(dom.children(p)[0]), Some("abc"));
        assert_eq!(dom.text(dom.children(p)[2]), Some("d"));
    }

    #[test]
    fn test_locate_text_spans_nodes() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["héllo", " world"]);
        let second = dom.children(p)[1];

        assert_eq!(dom.locate_text(p, 1), Some((dom.children(p)[0], 1)));
        assert_eq!(dom.locate_text(p, 6), Some((second, 1)));
        assert_eq!(dom.locate_text(p, 11), Some((second, 6)));
        assert_eq!(dom.locate_text(p, 12), None);
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["x"]);
        let root = dom.root();

        assert!(dom.append_child(p, root).is_err());
        assert!(dom.append_child(p, p).is_err());
    }

    #[test]
    fn test_common_ancestor() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["one", "two"]);
        let a = dom.children(p)[0];
        let b = dom.children(p)[1];

        assert_eq!(dom.common_ancestor(a, b), Some(p));
        assert_eq!(dom.common_ancestor(a, a), Some(a));
    }

    #[test]
    fn test_removed_subtrees_are_reused() {
        let mut dom = Dom::new();
        let p = paragraph(&mut dom, &["one", "two"]);
        let len = dom.arena_len();

        dom.remove(p);
        assert!(dom.children(dom.root()).is_empty());
        for _ in 0..5 {
            let p = paragraph(&mut dom, &["three", "four"]);
            assert_eq!(dom.text_content(p), "threefour");
            dom.clear_children(dom.root());
        }

        assert_eq!(dom.arena_len(), len);
        dom.remove(dom.root());
        assert_eq!(dom.kind(dom.root()), &NodeKind::Document);
    }

    #[test]
    fn test_char_helpers() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("abc", 10), 3);
        assert_eq!(find_chars("héllo world", "world"), Some(6));
        assert_eq!(find_chars("abc", "z"), None);
    }
}
