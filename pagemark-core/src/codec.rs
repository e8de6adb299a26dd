//! Encoding decorations as anchors and resolving anchors back to elements

use tracing::debug;

use crate::dom::{Dom, NodeId};
use crate::model::{Anchor, PathStep, StructuralPath};

/// Describe `decoration` relative to `scope`
///
/// The path addresses the element containing the decoration, one step per
/// level from `scope` (exclusive) down. Each step counts only preceding
/// siblings with the same tag.
pub fn encode(dom: &Dom, decoration: NodeId, scope: NodeId) -> Anchor {
    let mut steps = Vec::new();
    let mut current = dom.parent(decoration);
    while let Some(node) = current {
        if node == scope {
            break;
        }
        let Some(tag) = dom.tag(node) else { break };
        let index = 1 + dom
            .preceding_siblings(node)
            .into_iter()
            .filter(|&s| dom.tag(s) == Some(tag))
            .count();
        steps.push(PathStep::new(tag, index));
        current = dom.parent(node);
    }
    steps.reverse();

    let offset = dom
        .preceding_siblings(decoration)
        .into_iter()
        .filter(|&s| dom.is_text(s))
        .map(|s| dom.char_len(s))
        .sum();

    Anchor {
        structural_path: StructuralPath::new(steps),
        text_snippet: dom.text_content(decoration),
        offset_within_snippet: offset,
    }
}

/// Follow a structural path down from `scope`
pub fn resolve_path(dom: &Dom, path: &StructuralPath, scope: NodeId) -> Option<NodeId> {
    if !path.is_well_formed() {
        return None;
    }
    let mut current = scope;
    for step in &path.steps {
        current = dom
            .children(current)
            .iter()
            .copied()
            .filter(|&c| dom.tag(c) == Some(step.tag.as_str()))
            .nth(step.index.checked_sub(1)?)?;
    }
    Some(current)
}

/// Locate the element an anchor was captured from
///
/// Returns `None` when the path no longer resolves or when the element it
/// lands on does not contain the snippet.
pub fn decode(dom: &Dom, anchor: &Anchor, scope: NodeId) -> Option<NodeId> {
    let Some(element) = resolve_path(dom, &anchor.structural_path, scope) else {
        debug!(path = %anchor.structural_path, "anchor path did not resolve");
        return None;
    };
    if !dom.text_content(element).contains(&anchor.text_snippet) {
        debug!(path = %anchor.structural_path, "anchor resolved to element without its snippet");
        return None;
    }
    Some(element)
}

/// [`decode`] against `scope`, keeping only results inside `container`
pub fn decode_within(dom: &Dom, anchor: &Anchor, scope: NodeId, container: NodeId) -> Option<NodeId> {
    decode(dom, anchor, scope).filter(|&element| dom.contains(container, element))
}
