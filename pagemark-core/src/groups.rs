//! Group lifecycle against the annotation store
//!
//! Every mutation is a read-modify-write of the whole group list for one
//! document. Writes are not serialized against each other: when two
//! operations on the same document interleave, the last write wins.

use tracing::{debug, error, warn};

use crate::codec;
use crate::config::AnnotatorConfig;
use crate::decoration::DecorationApplier;
use crate::dom::{Dom, NodeId};
use crate::error::StoreError;
use crate::model::{Group, GroupId};
use crate::overlap::Superseded;
use crate::store::AnnotationStore;

pub struct GroupManager<S> {
    store: S,
    config: AnnotatorConfig,
}

impl<S: AnnotationStore> GroupManager<S> {
    pub fn new(store: S, config: AnnotatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    fn applier(&self) -> DecorationApplier<'_> {
        DecorationApplier::new(&self.config)
    }

    /// Groups stored for a document, empty when none were ever saved
    pub fn load(&self, document_id: &str) -> Result<Vec<Group>, StoreError> {
        match self.store.get(document_id) {
            Ok(groups) => Ok(groups.unwrap_or_default()),
            Err(e) => {
                error!(document_id, error = %e, "error loading annotations");
                Err(e)
            }
        }
    }

    fn save(&mut self, document_id: &str, groups: &[Group]) -> Result<(), StoreError> {
        self.store.set(document_id, groups).map_err(|e| {
            error!(document_id, error = %e, "error saving annotations");
            e
        })
    }

    /// Record the decorations of one highlighting action
    ///
    /// The stored entry with the same id is replaced, otherwise the group is
    /// appended. For each decoration in `superseded`, its former group loses
    /// the one stored anchor that resolves to the decoration's element with
    /// the same text. Anchors that do not resolve are kept; a group left
    /// without anchors is dropped.
    pub fn create_or_merge_group(
        &mut self,
        dom: &Dom,
        document_id: &str,
        group_id: &GroupId,
        decorations: &[NodeId],
        color: &str,
        superseded: &[Superseded],
    ) -> Result<Group, StoreError> {
        let root = dom.root();
        let applier = self.applier();
        let color = decorations
            .first()
            .and_then(|&d| applier.color_of(dom, d))
            .unwrap_or_else(|| color.to_string());
        let anchors = decorations
            .iter()
            .map(|&d| codec::encode(dom, d, root))
            .collect();
        let group = Group::new(group_id.clone(), color, anchors);

        let mut groups = self.load(document_id)?;
        match groups.iter().position(|g| &g.id == group_id) {
            Some(index) => groups[index] = group.clone(),
            None => groups.push(group.clone()),
        }

        let mut emptied = Vec::new();
        for taken in superseded.iter().filter(|taken| &taken.group != group_id) {
            let Some(stale) = groups.iter_mut().find(|g| g.id == taken.group) else {
                continue;
            };
            let matched = stale.anchors.iter().position(|anchor| {
                anchor.text_snippet == taken.text && codec::decode(dom, anchor, root) == Some(taken.parent)
            });
            match matched {
                Some(index) => {
                    stale.anchors.remove(index);
                    if stale.anchors.is_empty() {
                        emptied.push(taken.group.clone());
                    }
                }
                None => debug!(group = %taken.group, "no stored anchor for superseded decoration"),
            }
        }
        if !emptied.is_empty() {
            debug!(groups = emptied.len(), "groups fully superseded");
            groups.retain(|g| !emptied.contains(&g.id));
        }

        self.save(document_id, &groups)?;
        debug!(document_id, group = %group.id, anchors = group.anchors.len(), "annotation saved");
        Ok(group)
    }

    /// Remove a group's decorations from the tree and its record from the
    /// store. Returns whether the group was stored.
    pub fn erase_group(&mut self, dom: &mut Dom, document_id: &str, group_id: &GroupId) -> Result<bool, StoreError> {
        let mut groups = self.load(document_id)?;
        let Some(index) = groups.iter().position(|g| &g.id == group_id) else {
            debug!(document_id, group = %group_id, "no stored group to erase");
            return Ok(false);
        };
        let group = groups.remove(index);
        self.remove_decorations(dom, &group);

        self.save(document_id, &groups)?;
        debug!(document_id, group = %group_id, "annotation removed");
        Ok(true)
    }

    /// Remove every decoration of the document and drop its entry.
    /// Returns the number of groups that were stored.
    pub fn erase_all_groups(&mut self, dom: &mut Dom, document_id: &str) -> Result<usize, StoreError> {
        let groups = self.load(document_id)?;
        for group in &groups {
            self.remove_decorations(dom, group);
        }

        self.store.remove(document_id).map_err(|e| {
            error!(document_id, error = %e, "error removing annotations");
            e
        })?;
        debug!(document_id, groups = groups.len(), "all annotations removed");
        Ok(groups.len())
    }

    /// Unwrap the live decoration behind each resolvable anchor of `group`
    pub fn remove_decorations(&self, dom: &mut Dom, group: &Group) {
        let applier = self.applier();
        let root = dom.root();
        for anchor in &group.anchors {
            let Some(element) = codec::decode(dom, anchor, root) else {
                continue;
            };
            let decoration = applier
                .find_group(dom, element, &group.id)
                .first()
                .copied()
                .or_else(|| {
                    let parent = dom.parent(element)?;
                    applier.find_group(dom, parent, &group.id).first().copied()
                });
            match decoration {
                Some(decoration) => {
                    if let Err(e) = applier.unwrap(dom, decoration) {
                        warn!(group = %group.id, error = %e, "could not unwrap decoration");
                    }
                }
                None => warn!(group = %group.id, path = %anchor.structural_path, "highlight span not found"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup;
    use crate::store::MemoryStore;

    fn highlight(dom: &mut Dom, config: &AnnotatorConfig, start: usize, end: usize, id: &str) -> NodeId {
        let text = *dom
            .text_nodes(dom.root())
            .iter()
            .find(|&&t| dom.char_len(t) >= end)
            .unwrap();
        DecorationApplier::new(config)
            .wrap(dom, text, start, end, &GroupId::from(id), "red")
            .unwrap()
    }

    #[test]
    fn test_create_appends_then_replaces() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse("<div><p>alpha beta gamma</p></div>").unwrap();
        let span = highlight(&mut dom, &config, 6, 10, "group-1");
        let mut manager = GroupManager::new(MemoryStore::new(), config);
        let id = GroupId::from("group-1");

        manager.create_or_merge_group(&dom, "doc", &id, &[span], "yellow", &[]).unwrap();
        manager.create_or_merge_group(&dom, "doc", &id, &[span], "yellow", &[]).unwrap();

        let stored = manager.load("doc").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].color, "red");
        assert_eq!(stored[0].anchors[0].text_snippet, "beta");
        assert_eq!(stored[0].anchors[0].structural_path.to_string(), "/div[1]/p[1]");
    }

    #[test]
    fn test_erase_group_unwraps_and_forgets() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse("<div><p>alpha beta gamma</p></div>").unwrap();
        let span = highlight(&mut dom, &config, 6, 10, "group-1");
        let mut manager = GroupManager::new(MemoryStore::new(), config);
        let id = GroupId::from("group-1");
        manager.create_or_merge_group(&dom, "doc", &id, &[span], "red", &[]).unwrap();

        assert!(manager.erase_group(&mut dom, "doc", &id).unwrap());

        let p = dom.children(dom.children(dom.root())[0])[0];
        assert_eq!(dom.children(p).len(), 1);
        assert_eq!(dom.text_content(p), "alpha beta gamma");
        assert!(manager.load("doc").unwrap().is_empty());
        assert!(!manager.erase_group(&mut dom, "doc", &id).unwrap());
    }

    #[test]
    fn test_superseded_group_is_dropped_when_empty() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse("<div><p>alpha beta gamma</p></div>").unwrap();
        let span = highlight(&mut dom, &config, 6, 10, "group-1");
        let mut manager = GroupManager::new(MemoryStore::new(), config.clone());
        manager
            .create_or_merge_group(&dom, "doc", &GroupId::from("group-1"), &[span], "red", &[])
            .unwrap();

        let taken = taken_by(&mut dom, &config, span, "group-1");
        manager
            .create_or_merge_group(&dom, "doc", &GroupId::from("group-2"), &[span], "cyan", &[taken])
            .unwrap();

        let stored = manager.load("doc").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, GroupId::from("group-2"));
        assert_eq!(stored[0].color, "cyan");
    }

    /// Retag `span` into group-2 and describe what `old` lost
    fn taken_by(dom: &mut Dom, config: &AnnotatorConfig, span: NodeId, old: &str) -> Superseded {
        let taken = Superseded {
            group: GroupId::from(old),
            parent: dom.parent(span).unwrap(),
            text: dom.text_content(span),
        };
        DecorationApplier::new(config)
            .retag(dom, span, &GroupId::from("group-2"), "cyan")
            .unwrap();
        taken
    }

    #[test]
    fn test_superseded_group_keeps_its_other_anchors() {
        let config = AnnotatorConfig::default();
        let mut dom = markup::parse("<div><p>alpha beta</p><p>gamma delta</p></div>").unwrap();
        let beta = highlight(&mut dom, &config, 6, 10, "group-1");
        let delta = highlight(&mut dom, &config, 6, 11, "group-1");
        let mut manager = GroupManager::new(MemoryStore::new(), config.clone());
        manager
            .create_or_merge_group(&dom, "doc", &GroupId::from("group-1"), &[beta, delta], "red", &[])
            .unwrap();

        let taken = taken_by(&mut dom, &config, beta, "group-1");
        manager
            .create_or_merge_group(&dom, "doc", &GroupId::from("group-2"), &[beta], "cyan", &[taken])
            .unwrap();

        let stored = manager.load("doc").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, GroupId::from("group-1"));
        let kept: Vec<String> = stored[0].anchors.iter().map(|a| a.text_snippet.clone()).collect();
        assert_eq!(kept, vec!["delta".to_string()]);
        assert_eq!(stored[1].anchors[0].text_snippet, "beta");
    }

    #[test]
    fn test_unmounted_anchors_survive_supersession() {
        let config = AnnotatorConfig::default();
        let mut dom =
            markup::parse("<div><section><p>alpha beta</p></section><section><p>gamma delta epsilon</p></section></div>")
                .unwrap();
        let beta = highlight(&mut dom, &config, 6, 10, "group-1");
        let epsilon = highlight(&mut dom, &config, 12, 19, "group-1");
        let mut manager = GroupManager::new(MemoryStore::new(), config.clone());
        manager
            .create_or_merge_group(&dom, "doc", &GroupId::from("group-1"), &[beta, epsilon], "red", &[])
            .unwrap();

        let div = dom.children(dom.root())[0];
        let second_page = dom.children(div)[1];
        dom.detach(second_page);
        let taken = taken_by(&mut dom, &config, beta, "group-1");
        manager
            .create_or_merge_group(&dom, "doc", &GroupId::from("group-2"), &[beta], "cyan", &[taken])
            .unwrap();

        let stored = manager.load("doc").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, GroupId::from("group-1"));
        assert_eq!(stored[0].anchors.len(), 1);
        assert_eq!(stored[0].anchors[0].text_snippet, "epsilon");
        assert_eq!(stored[0].anchors[0].structural_path.to_string(), "/div[1]/section[2]/p[1]");
    }
}
