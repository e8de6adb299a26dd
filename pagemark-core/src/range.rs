//! Decomposition of a selection into per-text-node segments

use crate::dom::{Dom, NodeId};

/// One end of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    /// Char offset when `node` is a text node
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection over the rendered tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: Boundary,
    pub end: Boundary,
    pub common_ancestor: NodeId,
}

impl SelectionRange {
    /// Build a range, deriving the common ancestor. Returns `None` when the
    /// two boundaries live in different trees.
    pub fn new(dom: &Dom, start: Boundary, end: Boundary) -> Option<Self> {
        let common_ancestor = dom.common_ancestor(start.node, end.node)?;
        Some(Self {
            start,
            end,
            common_ancestor,
        })
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A run of text inside a single text node, `start..end` in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSegment {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// List the text segments covered by `range` in document order
///
/// Walks pre-order from the start container, never leaving the common
/// ancestor, and stops once the end container has been visited. Empty
/// segments are dropped.
pub fn resolve_segments(dom: &Dom, range: &SelectionRange) -> Vec<TextSegment> {
    if range.is_collapsed() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = Some(range.start.node);
    while let Some(node) = current {
        if let Some(text) = dom.text(node) {
            let len = text.chars().count();
            let start = if node == range.start.node {
                range.start.offset.min(len)
            } else {
                0
            };
            let end = if node == range.end.node {
                range.end.offset.min(len)
            } else {
                len
            };
            if start < end {
                segments.push(TextSegment { node, start, end });
            }
        }
        if node == range.end.node {
            break;
        }
        current = next_in_scope(dom, node, range.common_ancestor);
    }
    segments
}

fn next_in_scope(dom: &Dom, node: NodeId, scope: NodeId) -> Option<NodeId> {
    if let Some(child) = dom.first_child(node) {
        return Some(child);
    }
    let mut current = Some(node);
    while let Some(n) = current {
        if n == scope {
            return None;
        }
        if let Some(sibling) = dom.next_sibling(n) {
            return Some(sibling);
        }
        current = dom.parent(n);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup;

    fn text_of(dom: &Dom, segment: &TextSegment) -> String {
        dom.text(segment.node)
            .unwrap()
            .chars()
            .skip(segment.start)
            .take(segment.end - segment.start)
            .collect()
    }

    #[test]
    fn test_single_node_selection() {
        let dom = markup::parse("<p>alpha beta gamma</p>").unwrap();
        let p = dom.children(dom.root())[0];
        let text = dom.children(p)[0];
        let range = SelectionRange::new(&dom, Boundary::new(text, 6), Boundary::new(text, 10)).unwrap();

        let segments = resolve_segments(&dom, &range);
        assert_eq!(segments.len(), 1);
        assert_eq!(text_of(&dom, &segments[0]), "beta");
    }

    #[test]
    fn test_selection_across_elements_in_order() {
        let dom = markup::parse("<div><p>one</p><p>two <b>three</b></p><p>four</p></div>").unwrap();
        let div = dom.children(dom.root())[0];
        let texts = dom.text_nodes(div);
        let first = texts[0];
        let last = texts[texts.len() - 1];
        let range = SelectionRange::new(&dom, Boundary::new(first, 1), Boundary::new(last, 2)).unwrap();

        let segments = resolve_segments(&dom, &range);
        let runs: Vec<String> = segments.iter().map(|s| text_of(&dom, s)).collect();
        assert_eq!(runs, vec!["ne", "two ", "three", "fo"]);
    }

    #[test]
    fn test_collapsed_selection_is_empty() {
        let dom = markup::parse("<p>alpha</p>").unwrap();
        let text = dom.text_nodes(dom.root())[0];
        let range = SelectionRange::new(&dom, Boundary::new(text, 2), Boundary::new(text, 2)).unwrap();

        assert!(range.is_collapsed());
        assert!(resolve_segments(&dom, &range).is_empty());
    }

    #[test]
    fn test_boundary_at_node_edge_drops_empty_segment() {
        let dom = markup::parse("<div><p>one</p><p>two</p></div>").unwrap();
        let texts = dom.text_nodes(dom.root());
        let range = SelectionRange::new(&dom, Boundary::new(texts[0], 3), Boundary::new(texts[1], 2)).unwrap();

        let segments = resolve_segments(&dom, &range);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].node, texts[1]);
    }
}
