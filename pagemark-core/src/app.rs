//! Interaction controller
//!
//! [`App`] owns the rendered tree and the group manager. Host events reach
//! it through [`App::handle`].

use tracing::{debug, warn};

use crate::config::AnnotatorConfig;
use crate::decoration::DecorationApplier;
use crate::dom::{Dom, NodeId};
use crate::error::SessionError;
use crate::groups::GroupManager;
use crate::model::{Group, GroupId, GroupIdClock};
use crate::overlap::{self, Superseded};
use crate::range::{resolve_segments, SelectionRange};
use crate::reconcile::{MountFeed, ReconcileReport, Reconciler};
use crate::session::{self, Mode, Session, Tool};
use crate::store::AnnotationStore;

/// Pointer position for erase clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl HitPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Events delivered by the host view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    /// Pointer released over a selection
    SelectionCommit(SelectionRange),
    /// Click at a point
    EraseAt(HitPoint),
    /// The host identified the open document
    DocumentId(String),
    /// Nodes were added to the tree
    Mounted(Vec<NodeId>),
    ToolToggled(Tool),
    ColorPicked(Tool, String),
    EraseAll,
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Highlighted(GroupId),
    Erased(GroupId),
    ErasedAll(usize),
    Reconciled(Vec<ReconcileReport>),
    ModeChanged(Mode),
    ColorChanged(Tool),
    Rejected(SessionError),
    Ignored,
}

/// Platform-agnostic annotation controller
///
/// Owns the rendered tree, the interaction session and the group manager.
/// Store failures are logged by the manager and end the operation here.
pub struct App<S> {
    pub dom: Dom,
    pub session: Session,
    groups: GroupManager<S>,
    clock: GroupIdClock,
    mounts: MountFeed,
}

impl<S: AnnotationStore> App<S> {
    pub fn new(dom: Dom, store: S, config: AnnotatorConfig) -> Self {
        Self {
            dom,
            session: Session::new(&config),
            groups: GroupManager::new(store, config),
            clock: GroupIdClock::new(),
            mounts: MountFeed::new(),
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        self.groups.config()
    }

    pub fn store(&self) -> &S {
        self.groups.store()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.groups.store_mut()
    }

    pub fn applier(&self) -> DecorationApplier<'_> {
        DecorationApplier::new(self.groups.config())
    }

    pub fn document_id(&self) -> Option<&str> {
        self.session.document_id.as_deref()
    }

    /// Stored groups of the active document, empty when unknown or unreadable
    pub fn stored_groups(&self) -> Vec<Group> {
        self.document_id()
            .and_then(|id| self.groups.load(id).ok())
            .unwrap_or_default()
    }

    fn require_document(&self, operation: &str) -> Option<String> {
        let id = self.session.document_id.clone();
        if id.is_none() {
            warn!(operation, "no document id, ignoring");
        }
        id
    }

    /// Decorate a selection as one new group and store it
    ///
    /// Returns `None` for a collapsed selection, when no document is known or
    /// when the group could not be stored.
    pub fn highlight_selection(&mut self, range: &SelectionRange, color: &str) -> Option<GroupId> {
        if range.is_collapsed() {
            return None;
        }
        let document_id = self.require_document("highlight")?;
        let segments = resolve_segments(&self.dom, range);
        if segments.is_empty() {
            return None;
        }

        let group_id = self.clock.next_id();
        let applier = DecorationApplier::new(self.groups.config());
        let mut decorations: Vec<NodeId> = Vec::new();
        let mut superseded: Vec<Superseded> = Vec::new();
        for segment in segments {
            let outcome = overlap::apply_segment(&applier, &mut self.dom, segment, &group_id, color);
            for decoration in outcome.decorations {
                if !decorations.contains(&decoration) {
                    decorations.push(decoration);
                }
            }
            superseded.extend(outcome.superseded);
        }
        let decorations = applier.coalesce(&mut self.dom, &decorations);
        if decorations.is_empty() {
            return None;
        }

        self.groups
            .create_or_merge_group(&self.dom, &document_id, &group_id, &decorations, color, &superseded)
            .ok()?;
        debug!(group = %group_id, decorations = decorations.len(), "selection highlighted");
        Some(group_id)
    }

    /// Erase the group owning the decoration under `point`
    pub fn erase_decoration_at(&mut self, point: HitPoint) -> Option<GroupId> {
        let applier = self.applier();
        let decoration = session::hit_test(&applier, &self.dom, point.node, point.offset)?;
        let group_id = applier.group_of(&self.dom, decoration)?;
        self.session.pointer = Some((point.node, point.offset));
        self.erase_group(&group_id).then_some(group_id)
    }

    /// Remove a stored group and its decorations. Live decorations of a group
    /// that was never stored are unwrapped as well.
    pub fn erase_group(&mut self, group_id: &GroupId) -> bool {
        let Some(document_id) = self.require_document("erase") else {
            return false;
        };
        match self.groups.erase_group(&mut self.dom, &document_id, group_id) {
            Ok(true) => true,
            Ok(false) => {
                let applier = DecorationApplier::new(self.groups.config());
                let orphans = applier.find_group(&self.dom, self.dom.root(), group_id);
                for decoration in &orphans {
                    if let Err(e) = applier.unwrap(&mut self.dom, *decoration) {
                        warn!(group = %group_id, error = %e, "could not unwrap decoration");
                    }
                }
                !orphans.is_empty()
            }
            Err(_) => false,
        }
    }

    /// Remove every group stored for `document_id` along with its decorations
    pub fn erase_all_for_document(&mut self, document_id: &str) -> usize {
        self.groups
            .erase_all_groups(&mut self.dom, document_id)
            .unwrap_or_default()
    }

    /// Reapply stored groups of `document_id` inside a freshly mounted container
    pub fn reconcile(&mut self, container: NodeId, document_id: &str) -> ReconcileReport {
        let Ok(groups) = self.groups.load(document_id) else {
            return ReconcileReport::default();
        };
        Reconciler::new(self.groups.config()).reconcile(&mut self.dom, container, &groups)
    }

    /// Queue qualifying containers among `added` and reconcile them one at a
    /// time. Containers stay queued until a document id is known.
    pub fn mount(&mut self, added: &[NodeId]) -> Vec<ReconcileReport> {
        self.mounts.notify(&self.dom, self.groups.config(), added);
        self.drain_mounts()
    }

    fn drain_mounts(&mut self) -> Vec<ReconcileReport> {
        let Some(document_id) = self.session.document_id.clone() else {
            if !self.mounts.is_empty() {
                debug!(pending = self.mounts.len(), "containers waiting for a document id");
            }
            return Vec::new();
        };
        let mut reports = Vec::new();
        while let Some(event) = self.mounts.next() {
            let container_class = &self.groups.config().container_class;
            if self.dom.is_attached(event.container) && self.dom.has_class(event.container, container_class) {
                reports.push(self.reconcile(event.container, &document_id));
            }
        }
        reports
    }

    /// Switch the active document and reconcile containers that were waiting
    pub fn set_document_id(&mut self, document_id: impl Into<String>) -> Vec<ReconcileReport> {
        let document_id = document_id.into();
        debug!(document_id = %document_id, "document id updated");
        self.session.document_id = Some(document_id);
        self.drain_mounts()
    }

    pub fn handle(&mut self, event: InteractionEvent) -> Outcome {
        match event {
            InteractionEvent::SelectionCommit(range) => {
                if self.session.mode != Mode::Highlighting {
                    return Outcome::Ignored;
                }
                let color = self
                    .session
                    .color(Tool::Highlight)
                    .unwrap_or(self.groups.config().fallback_color.as_str())
                    .to_string();
                self.highlight_selection(&range, &color)
                    .map_or(Outcome::Ignored, Outcome::Highlighted)
            }
            InteractionEvent::EraseAt(point) => {
                if self.session.mode != Mode::Erasing {
                    return Outcome::Ignored;
                }
                self.erase_decoration_at(point)
                    .map_or(Outcome::Ignored, Outcome::Erased)
            }
            InteractionEvent::DocumentId(id) => Outcome::Reconciled(self.set_document_id(id)),
            InteractionEvent::Mounted(added) => Outcome::Reconciled(self.mount(&added)),
            InteractionEvent::ToolToggled(tool) => match self.session.toggle(tool) {
                Ok(mode) => Outcome::ModeChanged(mode),
                Err(e) => {
                    warn!(error = %e, "tool unavailable");
                    Outcome::Rejected(e)
                }
            },
            InteractionEvent::ColorPicked(tool, color) => {
                let config = self.groups.config();
                match self.session.pick_color(config, tool, &color) {
                    Ok(()) => Outcome::ColorChanged(tool),
                    Err(e) => Outcome::Rejected(e),
                }
            }
            InteractionEvent::EraseAll => match self.require_document("erase all") {
                Some(id) => Outcome::ErasedAll(self.erase_all_for_document(&id)),
                None => Outcome::Ignored,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup;
    use crate::range::Boundary;
    use crate::store::MemoryStore;

    fn app(markup_text: &str) -> App<MemoryStore> {
        let dom = markup::parse(markup_text).unwrap();
        App::new(dom, MemoryStore::new(), AnnotatorConfig::default())
    }

    fn select(app: &App<MemoryStore>, start: usize, end: usize) -> SelectionRange {
        let text = app.dom.text_nodes(app.dom.root())[0];
        SelectionRange::new(&app.dom, Boundary::new(text, start), Boundary::new(text, end)).unwrap()
    }

    #[test]
    fn test_highlight_requires_document_id() {
        let mut app = app("<p>alpha beta gamma</p>");
        let range = select(&app, 0, 5);

        assert_eq!(app.highlight_selection(&range, "red"), None);
        assert_eq!(app.dom.text_nodes(app.dom.root()).len(), 1);
    }

    #[test]
    fn test_events_follow_mode() {
        let mut app = app("<p>alpha beta gamma</p>");
        app.handle(InteractionEvent::DocumentId("doc".to_string()));
        let range = select(&app, 6, 10);

        assert_eq!(app.handle(InteractionEvent::SelectionCommit(range.clone())), Outcome::Ignored);
        assert_eq!(
            app.handle(InteractionEvent::ToolToggled(Tool::Highlight)),
            Outcome::ModeChanged(Mode::Highlighting)
        );
        let Outcome::Highlighted(id) = app.handle(InteractionEvent::SelectionCommit(range)) else {
            panic!("selection was not highlighted");
        };
        assert_eq!(app.stored_groups()[0].id, id);
        assert_eq!(app.stored_groups()[0].color, "yellow");
    }

    #[test]
    fn test_color_pick_is_validated() {
        let mut app = app("<p>text</p>");
        assert_eq!(
            app.handle(InteractionEvent::ColorPicked(Tool::Highlight, "red".to_string())),
            Outcome::ColorChanged(Tool::Highlight)
        );
        assert!(matches!(
            app.handle(InteractionEvent::ColorPicked(Tool::Highlight, "teal".to_string())),
            Outcome::Rejected(_)
        ));
        assert!(matches!(
            app.handle(InteractionEvent::ToolToggled(Tool::Text)),
            Outcome::Rejected(SessionError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_mounts_wait_for_document_id() {
        let mut app = app(r#"<div class="gsr-page"><div class="gsr-text-ctn"><p>alpha beta</p></div></div>"#);
        let page = app.dom.children(app.dom.root())[0];

        assert!(app.mount(&[page]).is_empty());
        let reports = app.set_document_id("doc");
        assert_eq!(reports, vec![ReconcileReport::default()]);
    }
}
