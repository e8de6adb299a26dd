//! Reconciling a new segment with decorations that already cover its text
//!
//! Existing decorations are found by walking up from the segment's text node,
//! then ordered by where the node's text first appears inside each of them.
//! That ordering is a substring search, so a node whose text repeats inside
//! several decorations can be ordered wrongly; this is a known limitation.

use tracing::warn;

use crate::decoration::DecorationApplier;
use crate::dom::{find_chars, Dom, NodeId};
use crate::model::GroupId;
use crate::range::TextSegment;

/// A decoration taken over from another group, as it was before the retag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superseded {
    pub group: GroupId,
    /// Element holding the decoration
    pub parent: NodeId,
    pub text: String,
}

/// Decorations produced for one segment
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverlapOutcome {
    /// New and retagged decorations, in order
    pub decorations: Vec<NodeId>,
    /// Decorations other groups lost to the new group
    pub superseded: Vec<Superseded>,
}

/// Decorate `segment` for `group`, reusing any decoration it overlaps
pub fn apply_segment(
    applier: &DecorationApplier<'_>,
    dom: &mut Dom,
    segment: TextSegment,
    group: &GroupId,
    color: &str,
) -> OverlapOutcome {
    let mut outcome = OverlapOutcome::default();
    let mut existing = applier.enclosing(dom, segment.node);

    if existing.is_empty() {
        match applier.wrap(dom, segment.node, segment.start, segment.end, group, color) {
            Ok(decoration) => outcome.decorations.push(decoration),
            Err(e) => warn!(error = %e, "skipping segment that could not be wrapped"),
        }
        return outcome;
    }

    let node_text = dom.text(segment.node).unwrap_or_default().to_string();
    let node_len = node_text.chars().count() as isize;
    let position = |dom: &Dom, decoration: NodeId| {
        find_chars(&dom.text_content(decoration), &node_text)
            .map(|p| p as isize)
            .unwrap_or(-1)
    };
    existing.sort_by_key(|&d| position(&*dom, d));

    let start = segment.start as isize;
    let end = segment.end as isize;
    let mut cursor: isize = 0;

    for decoration in existing {
        let existing_start = position(&*dom, decoration);
        let existing_end = existing_start + node_len;

        if start < existing_start && cursor < existing_start {
            wrap_gap(applier, dom, segment.node, cursor, existing_start, group, color, &mut outcome);
        }

        if start <= existing_end && end >= existing_start {
            let previous = applier.group_of(dom, decoration).filter(|previous| previous != group);
            if let (Some(previous), Some(parent)) = (previous, dom.parent(decoration)) {
                outcome.superseded.push(Superseded {
                    group: previous,
                    parent,
                    text: dom.text_content(decoration),
                });
            }
            match applier.retag(dom, decoration, group, color) {
                Ok(()) => outcome.decorations.push(decoration),
                Err(e) => warn!(error = %e, "could not retag decoration"),
            }
        }

        cursor = existing_end;
    }

    if end > cursor {
        wrap_gap(applier, dom, segment.node, cursor, end, group, color, &mut outcome);
    }

    outcome
}

#[allow(clippy::too_many_arguments)]
fn wrap_gap(
    applier: &DecorationApplier<'_>,
    dom: &mut Dom,
    node: NodeId,
    from: isize,
    to: isize,
    group: &GroupId,
    color: &str,
    outcome: &mut OverlapOutcome,
) {
    let from = from.max(0) as usize;
    let to = to.max(0) as usize;
    match applier.wrap(dom, node, from, to, group, color) {
        Ok(decoration) => outcome.decorations.push(decoration),
        Err(e) => warn!(error = %e, from, to, "skipping gap that could not be wrapped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnnotatorConfig;
    use crate::dom::markup;

    #[test]
    fn test_plain_text_is_wrapped() {
        let config = AnnotatorConfig::default();
        let applier = DecorationApplier::new(&config);
        let mut dom = markup::parse("<p>alpha beta</p>").unwrap();
        let text = dom.text_nodes(dom.root())[0];

        let outcome = apply_segment(
            &applier,
            &mut dom,
            TextSegment { node: text, start: 0, end: 5 },
            &GroupId::from("new"),
            "red",
        );

        assert_eq!(outcome.decorations.len(), 1);
        assert!(outcome.superseded.is_empty());
        assert_eq!(dom.text_content(outcome.decorations[0]), "alpha");
    }

    #[test]
    fn test_overlapping_decoration_is_retagged_in_place() {
        let config = AnnotatorConfig::default();
        let applier = DecorationApplier::new(&config);
        let mut dom = markup::parse("<p>alpha beta gamma</p>").unwrap();
        let text = dom.text_nodes(dom.root())[0];
        let old = applier
            .wrap(&mut dom, text, 6, 10, &GroupId::from("old"), "yellow")
            .unwrap();
        let inner = dom.children(old)[0];

        let outcome = apply_segment(
            &applier,
            &mut dom,
            TextSegment { node: inner, start: 1, end: 3 },
            &GroupId::from("new"),
            "red",
        );

        assert_eq!(outcome.decorations, vec![old]);
        let p = dom.children(dom.root())[0];
        assert_eq!(
            outcome.superseded,
            vec![Superseded {
                group: GroupId::from("old"),
                parent: p,
                text: "beta".to_string(),
            }]
        );
        assert_eq!(applier.group_of(&dom, old), Some(GroupId::from("new")));
        assert_eq!(applier.color_of(&dom, old).as_deref(), Some("red"));
        assert_eq!(dom.text_content(dom.root()), "alpha beta gamma");
    }
}
