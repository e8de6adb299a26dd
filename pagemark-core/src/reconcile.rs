//! Restoring stored highlights when page content mounts
//!
//! Hosts report batches of nodes added to the tree. Qualifying text
//! containers among them become [`MountEvent`]s, which are reconciled one at
//! a time against the stored groups of the active document.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::codec;
use crate::config::AnnotatorConfig;
use crate::decoration::DecorationApplier;
use crate::dom::{find_chars, Dom, NodeId};
use crate::model::Group;

/// A freshly mounted text container ready for reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountEvent {
    pub container: NodeId,
}

/// Queue of mount events fed by the host's mutation notifications
#[derive(Debug, Default)]
pub struct MountFeed {
    pending: VecDeque<MountEvent>,
}

impl MountFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of added nodes; only qualifying containers are queued
    pub fn notify(&mut self, dom: &Dom, config: &AnnotatorConfig, added: &[NodeId]) -> usize {
        let events = qualifying_containers(dom, config, added);
        let count = events.len();
        for event in events {
            if !self.pending.contains(&event) {
                self.pending.push_back(event);
            }
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for MountFeed {
    type Item = MountEvent;

    fn next(&mut self) -> Option<MountEvent> {
        self.pending.pop_front()
    }
}

/// Text containers carried by a batch of added nodes
///
/// A container is taken from the page that encloses it: the first element
/// with the container class inside the closest page element, or the
/// container itself when it has no page.
pub fn qualifying_containers(dom: &Dom, config: &AnnotatorConfig, added: &[NodeId]) -> Vec<MountEvent> {
    let is_container = |dom: &Dom, n: NodeId| dom.is_element(n) && dom.has_class(n, &config.container_class);
    let mut events = Vec::new();
    for &node in added {
        if !dom.is_attached(node) {
            continue;
        }
        for found in dom.find_all(node, is_container) {
            let container = dom
                .closest(found, |dom, n| dom.has_class(n, &config.page_class))
                .and_then(|page| dom.find_first(page, is_container))
                .unwrap_or(found);
            let event = MountEvent { container };
            if !events.contains(&event) {
                events.push(event);
            }
        }
    }
    events
}

/// Counts from one reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Reapplies stored groups to mounted containers
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    config: &'a AnnotatorConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a AnnotatorConfig) -> Self {
        Self { config }
    }

    /// Decorate every anchor of `groups` that resolves inside `container`
    ///
    /// The container is expected to hold freshly rendered, undecorated text;
    /// running this twice over the same container wraps the text twice.
    pub fn reconcile(&self, dom: &mut Dom, container: NodeId, groups: &[Group]) -> ReconcileReport {
        let applier = DecorationApplier::new(self.config);
        let root = dom.root();
        let mut report = ReconcileReport::default();

        for group in groups {
            let color = group.color_or(&self.config.fallback_color);
            for anchor in &group.anchors {
                let Some(element) = codec::decode_within(dom, anchor, root, container) else {
                    report.skipped += 1;
                    continue;
                };
                let target = dom.children(element).iter().find_map(|&child| {
                    let text = dom.text(child)?;
                    find_chars(text, &anchor.text_snippet).map(|start| (child, start))
                });
                let Some((text_node, start)) = target else {
                    warn!(group = %group.id, path = %anchor.structural_path, "no text child holds the snippet");
                    report.skipped += 1;
                    continue;
                };
                let end = start + anchor.text_snippet.chars().count();
                match applier.wrap(dom, text_node, start, end, &group.id, color) {
                    Ok(_) => report.applied += 1,
                    Err(e) => {
                        warn!(group = %group.id, error = %e, "error highlighting node");
                        report.skipped += 1;
                    }
                }
            }
        }

        debug!(applied = report.applied, skipped = report.skipped, "container reconciled");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup;
    use crate::model::{Anchor, GroupId, StructuralPath};

    const VIEWER: &str = r#"<div class="viewer"><div class="gsr-page"><div class="gsr-text-ctn"><span>alpha beta</span><span>gamma</span></div></div><div class="gsr-page"><div class="gsr-text-ctn"><span>delta</span></div></div></div>"#;

    fn group(id: &str, path: &str, text: &str) -> Group {
        Group::new(
            GroupId::from(id),
            "cyan",
            vec![Anchor {
                structural_path: path.parse().unwrap(),
                text_snippet: text.to_string(),
                offset_within_snippet: 0,
            }],
        )
    }

    #[test]
    fn test_qualifying_containers_from_whole_pages() {
        let config = AnnotatorConfig::default();
        let dom = markup::parse(VIEWER).unwrap();
        let viewer = dom.children(dom.root())[0];
        let pages = dom.children(viewer).to_vec();

        let events = qualifying_containers(&dom, &config, &pages);

        assert_eq!(events.len(), 2);
        assert!(dom.has_class(events[0].container, "gsr-text-ctn"));
        assert!(dom.contains(pages[1], events[1].container));
    }

    #[test]
    fn test_feed_ignores_plain_nodes() {
        let config = AnnotatorConfig::default();
        let dom = markup::parse(VIEWER).unwrap();
        let spans: Vec<NodeId> = dom
            .find_all(dom.root(), |dom, n| dom.tag(n) == Some("span"));
        let mut feed = MountFeed::new();

        assert_eq!(feed.notify(&dom, &config, &spans), 0);
        assert!(feed.is_empty());
    }

    #[test]
    fn test_reconcile_applies_only_inside_container() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse(VIEWER).unwrap();
        let viewer = dom.children(dom.root())[0];
        let events = qualifying_containers(&dom, &config, &[viewer]);
        let first_page = events[0].container;
        let groups = vec![
            group("group-1", "/div[1]/div[1]/div[1]/span[1]", "beta"),
            group("group-2", "/div[1]/div[2]/div[1]/span[1]", "delta"),
        ];

        let report = Reconciler::new(&config).reconcile(&mut dom, first_page, &groups);

        assert_eq!(report, ReconcileReport { applied: 1, skipped: 1 });
        let applier = DecorationApplier::new(&config);
        let decorations = applier.find_group(&dom, first_page, &GroupId::from("group-1"));
        assert_eq!(decorations.len(), 1);
        assert_eq!(dom.text_content(decorations[0]), "beta");
        assert_eq!(applier.color_of(&dom, decorations[0]).as_deref(), Some("cyan"));
    }

    #[test]
    fn test_reconcile_skips_changed_text() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse(VIEWER).unwrap();
        let viewer = dom.children(dom.root())[0];
        let container = qualifying_containers(&dom, &config, &[viewer])[0].container;
        let groups = vec![group("group-1", "/div[1]/div[1]/div[1]/span[1]", "omega")];

        let report = Reconciler::new(&config).reconcile(&mut dom, container, &groups);

        assert_eq!(report, ReconcileReport { applied: 0, skipped: 1 });
        assert_eq!(markup::to_markup(&dom, dom.root()), VIEWER);
    }

    #[test]
    fn test_snippet_split_across_elements_is_skipped() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse(
            r#"<div class="gsr-page"><div class="gsr-text-ctn"><p>alpha <b>beta</b> gamma</p><p>delta</p></div></div>"#,
        )
        .unwrap();
        let page = dom.children(dom.root())[0];
        let container = qualifying_containers(&dom, &config, &[page])[0].container;
        let groups = vec![
            group("group-1", "/div[1]/div[1]/p[1]", "alpha beta"),
            group("group-2", "/div[1]/div[1]/p[2]", "delta"),
        ];

        let report = Reconciler::new(&config).reconcile(&mut dom, container, &groups);

        assert_eq!(report, ReconcileReport { applied: 1, skipped: 1 });
        let applier = DecorationApplier::new(&config);
        assert!(applier.find_group(&dom, container, &GroupId::from("group-1")).is_empty());
        let decorations = applier.find_group(&dom, container, &GroupId::from("group-2"));
        assert_eq!(decorations.len(), 1);
        assert_eq!(dom.text_content(decorations[0]), "delta");
    }

    #[test]
    fn test_malformed_path_skips_only_its_anchor() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse(VIEWER).unwrap();
        let viewer = dom.children(dom.root())[0];
        let container = qualifying_containers(&dom, &config, &[viewer])[0].container;
        let mut broken = group("group-1", "/", "alpha");
        broken.anchors[0].structural_path = StructuralPath::from("/div[1]/text()".to_string());
        let groups = vec![broken, group("group-2", "/div[1]/div[1]/div[1]/span[2]", "gamma")];

        let report = Reconciler::new(&config).reconcile(&mut dom, container, &groups);

        assert_eq!(report, ReconcileReport { applied: 1, skipped: 1 });
        let applier = DecorationApplier::new(&config);
        assert_eq!(applier.find_group(&dom, container, &GroupId::from("group-2")).len(), 1);
    }
}
