//! Creating, retagging and removing inline highlight decorations

use tracing::warn;

use crate::config::AnnotatorConfig;
use crate::dom::{byte_index, Dom, NodeId};
use crate::error::DomError;
use crate::model::GroupId;

/// Applies decorations using the names from an [`AnnotatorConfig`]
#[derive(Debug, Clone, Copy)]
pub struct DecorationApplier<'a> {
    config: &'a AnnotatorConfig,
}

impl<'a> DecorationApplier<'a> {
    pub fn new(config: &'a AnnotatorConfig) -> Self {
        Self { config }
    }

    pub fn is_decoration(&self, dom: &Dom, id: NodeId) -> bool {
        dom.tag(id) == Some(self.config.decoration_tag.as_str())
            && dom.has_class(id, &self.config.decoration_class)
    }

    pub fn group_of(&self, dom: &Dom, decoration: NodeId) -> Option<GroupId> {
        dom.attr(decoration, &self.config.group_attribute)
            .map(GroupId::from)
    }

    /// Background colour from the decoration's inline style
    pub fn color_of(&self, dom: &Dom, decoration: NodeId) -> Option<String> {
        let style = dom.attr(decoration, "style")?;
        style.split(';').find_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            (property.trim() == "background-color").then(|| value.trim().to_string())
        })
    }

    fn tag(&self, dom: &mut Dom, decoration: NodeId, group: &GroupId, color: &str) -> Result<(), DomError> {
        dom.set_attr(decoration, "class", &self.config.decoration_class)?;
        dom.set_attr(decoration, &self.config.group_attribute, group.as_str())?;
        dom.set_attr(decoration, "style", &format!("background-color: {};", color))
    }

    /// Wrap chars `start..end` of text node `node` in a new decoration
    ///
    /// `node` keeps the text before the range, the decoration holds the
    /// range and a new text node after it holds the rest.
    pub fn wrap(
        &self,
        dom: &mut Dom,
        node: NodeId,
        start: usize,
        end: usize,
        group: &GroupId,
        color: &str,
    ) -> Result<NodeId, DomError> {
        let text = dom.text(node).ok_or(DomError::NotText(node))?.to_string();
        let len = text.chars().count();
        if start >= end || end > len {
            return Err(DomError::OffsetOutOfRange { start, end, len });
        }
        if dom.parent(node).is_none() {
            return Err(DomError::Detached(node));
        }

        let (before, rest) = text.split_at(byte_index(&text, start));
        let (middle, after) = rest.split_at(byte_index(rest, end - start));

        let decoration = dom.create_element(&self.config.decoration_tag);
        self.tag(dom, decoration, group, color)?;
        let inner = dom.create_text(middle);
        dom.append_child(decoration, inner)?;

        dom.set_text(node, before)?;
        dom.insert_after(node, decoration)?;
        if !after.is_empty() {
            let tail = dom.create_text(after);
            dom.insert_after(decoration, tail)?;
        }
        Ok(decoration)
    }

    /// Move an existing decoration into another group
    pub fn retag(&self, dom: &mut Dom, decoration: NodeId, group: &GroupId, color: &str) -> Result<(), DomError> {
        self.tag(dom, decoration, group, color)
    }

    /// Replace a decoration with its plain text and merge it into the
    /// neighbouring text
    pub fn unwrap(&self, dom: &mut Dom, decoration: NodeId) -> Result<(), DomError> {
        let parent = dom.parent(decoration).ok_or(DomError::Detached(decoration))?;
        let text = dom.text_content(decoration);
        let plain = dom.create_text(&text);
        dom.replace(decoration, plain)?;
        dom.normalize(parent);
        Ok(())
    }

    /// Merge decorations of the same group that sit next to each other,
    /// ignoring empty text between them. Returns the survivors in order.
    pub fn coalesce(&self, dom: &mut Dom, decorations: &[NodeId]) -> Vec<NodeId> {
        for &decoration in decorations {
            if !dom.is_attached(decoration) {
                continue;
            }
            let Some(group) = self.group_of(dom, decoration) else {
                continue;
            };
            loop {
                let mut gap = Vec::new();
                let mut next = dom.next_sibling(decoration);
                while let Some(n) = next.filter(|&n| dom.text(n) == Some("")) {
                    gap.push(n);
                    next = dom.next_sibling(n);
                }
                let Some(neighbour) = next else { break };
                if !self.is_decoration(dom, neighbour) || self.group_of(dom, neighbour).as_ref() != Some(&group) {
                    break;
                }
                let moved = dom
                    .children(neighbour)
                    .to_vec()
                    .into_iter()
                    .try_for_each(|child| dom.append_child(decoration, child));
                if let Err(e) = moved {
                    warn!(error = %e, "could not merge neighbouring decoration");
                    break;
                }
                dom.detach(neighbour);
                for empty in gap {
                    dom.detach(empty);
                }
            }
            dom.normalize(decoration);
        }
        decorations
            .iter()
            .copied()
            .filter(|&d| dom.is_attached(d))
            .collect()
    }

    /// All decorations of `group` at or below `scope`, in document order
    pub fn find_group(&self, dom: &Dom, scope: NodeId, group: &GroupId) -> Vec<NodeId> {
        dom.find_all(scope, |dom, n| {
            self.is_decoration(dom, n) && dom.attr(n, &self.config.group_attribute) == Some(group.as_str())
        })
    }

    /// Decorations enclosing `node`, innermost first
    pub fn enclosing(&self, dom: &Dom, node: NodeId) -> Vec<NodeId> {
        dom.ancestors_inclusive(node)
            .filter(|&n| self.is_decoration(dom, n))
            .collect()
    }
}
