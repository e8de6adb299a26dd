//! Viewer state: mounted pages, the lines they render to and the selection

use anyhow::{Context, Result};
use tracing::info;

use pagemark_core::dom::markup;
use pagemark_core::{
    AnnotationStore, AnnotatorConfig, App, Boundary, CursorHint, Dom, HitPoint, NodeId, SelectionRange,
};

use crate::cursor::CursorState;

/// Focus area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Pages,
    Sidebar,
}

/// Terminal viewer over one paged document
pub struct Viewer<S> {
    pub app: App<S>,
    pub cursor: CursorState,
    pub focus: Focus,
    pub running: bool,
    pub show_help: bool,

    // Selection anchor (row, col) while selecting
    pub selection_start: Option<(usize, usize)>,

    pub sidebar_selected: usize,
    pub status_message: Option<String>,
    pub title: String,

    /// Markup of every page, mounted fresh on each render
    pages: Vec<String>,
    viewer_root: NodeId,
    /// Line elements in display order
    lines: Vec<NodeId>,
}

impl<S: AnnotationStore> Viewer<S> {
    /// Split `source` into pages and mount them for `document_id`
    pub fn open(source: &str, title: &str, document_id: &str, store: S, config: AnnotatorConfig) -> Result<Self> {
        let pages = split_pages(source, &config)?;

        let mut dom = Dom::new();
        let viewer_root = dom.create_element("div");
        let root = dom.root();
        dom.append_child(root, viewer_root)
            .context("Failed to build viewer")?;
        dom.set_attr(viewer_root, "class", "viewer")
            .context("Failed to build viewer")?;

        let mut app = App::new(dom, store, config);
        app.set_document_id(document_id);

        let mut viewer = Self {
            app,
            cursor: CursorState::new(),
            focus: Focus::Pages,
            running: true,
            show_help: false,
            selection_start: None,
            sidebar_selected: 0,
            status_message: None,
            title: title.to_string(),
            pages,
            viewer_root,
            lines: Vec::new(),
        };
        viewer.render_pages()?;
        Ok(viewer)
    }

    /// Mount every page into an empty viewer, one mount batch per page.
    /// Returns the number of highlights restored.
    pub fn render_pages(&mut self) -> Result<usize> {
        self.app.dom.clear_children(self.viewer_root);
        self.selection_start = None;

        let mut restored = 0;
        for (number, page) in self.pages.iter().enumerate() {
            let node = markup::parse_into(&mut self.app.dom, self.viewer_root, page)
                .with_context(|| format!("Failed to mount page {}", number + 1))?;
            restored += self.app.mount(&[node]).iter().map(|r| r.applied).sum::<usize>();
        }
        info!(pages = self.pages.len(), restored, "pages rendered");

        self.refresh_lines();
        Ok(restored)
    }

    /// Recompute the line elements after the tree changed shape
    pub fn refresh_lines(&mut self) {
        let dom = &self.app.dom;
        let container_class = &self.app.config().container_class;
        let containers = dom.find_all(self.viewer_root, |dom, n| dom.has_class(n, container_class));
        self.lines = containers
            .into_iter()
            .flat_map(|c| dom.children(c).to_vec())
            .filter(|&n| dom.is_element(n) && !dom.text_content(n).trim().is_empty())
            .collect();
        let texts: Vec<String> = self.lines.iter().map(|&l| self.line_text(l)).collect();
        self.cursor.set_lines(&texts);
    }

    pub fn lines(&self) -> &[NodeId] {
        &self.lines
    }

    /// Text of a line with line breaks shown as spaces
    pub fn line_text(&self, line: NodeId) -> String {
        self.app
            .dom
            .text_content(line)
            .chars()
            .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
            .collect()
    }

    /// Tree position of a (row, col) cursor position
    pub fn point_at(&self, row: usize, col: usize) -> Option<(NodeId, usize)> {
        let line = *self.lines.get(row)?;
        self.app.dom.locate_text(line, col)
    }

    pub fn cursor_hint(&self) -> CursorHint {
        let (row, col) = self.cursor.cursor();
        let target = self
            .point_at(row, col)
            .map(|(node, _)| node)
            .or_else(|| self.lines.get(row).copied())
            .unwrap_or(self.viewer_root);
        self.app.session.cursor_hint(&self.app.dom, target)
    }

    pub fn start_selection(&mut self) {
        self.selection_start = Some(self.cursor.cursor());
    }

    pub fn cancel_selection(&mut self) {
        self.selection_start = None;
    }

    /// Ordered selection bounds, end exclusive, including the char under
    /// the cursor
    pub fn selection_bounds(&self) -> Option<((usize, usize), (usize, usize))> {
        let anchor = self.selection_start?;
        let cursor = self.cursor.cursor();
        let (start, end) = if anchor <= cursor { (anchor, cursor) } else { (cursor, anchor) };
        let end_col = (end.1 + 1).min(self.cursor.line_len(end.0));
        Some((start, (end.0, end_col)))
    }

    /// Selection over the tree; ends the selection
    pub fn take_selection(&mut self) -> Option<SelectionRange> {
        let (start, end) = self.selection_bounds()?;
        self.selection_start = None;
        let (start_node, start_offset) = self.point_at(start.0, start.1)?;
        let (end_node, end_offset) = self.point_at(end.0, end.1)?;
        SelectionRange::new(
            &self.app.dom,
            Boundary::new(start_node, start_offset),
            Boundary::new(end_node, end_offset),
        )
    }

    /// Click position under the cursor, addressed through its line element
    pub fn hit_point(&self) -> Option<HitPoint> {
        let (row, col) = self.cursor.cursor();
        let line = *self.lines.get(row)?;
        Some(HitPoint::new(line, col))
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Pages => Focus::Sidebar,
            Focus::Sidebar => Focus::Pages,
        };
    }

    pub fn next_group(&mut self) {
        let count = self.app.stored_groups().len();
        if count > 0 {
            self.sidebar_selected = (self.sidebar_selected + 1) % count;
        }
    }

    pub fn prev_group(&mut self) {
        let count = self.app.stored_groups().len();
        if count > 0 {
            self.sidebar_selected = if self.sidebar_selected == 0 {
                count - 1
            } else {
                self.sidebar_selected - 1
            };
        }
    }

    /// Erase the group selected in the sidebar
    pub fn erase_selected_group(&mut self) -> bool {
        let groups = self.app.stored_groups();
        let Some(group) = groups.get(self.sidebar_selected) else {
            return false;
        };
        let erased = self.app.erase_group(&group.id);
        let count = groups.len() - usize::from(erased);
        if self.sidebar_selected >= count && count > 0 {
            self.sidebar_selected = count - 1;
        }
        erased
    }
}

/// Markup of each page in `source`. A document without page elements is
/// wrapped into a single page with one text container.
fn split_pages(source: &str, config: &AnnotatorConfig) -> Result<Vec<String>> {
    let dom = markup::parse(source).context("Failed to parse document")?;
    let root = dom.root();
    let pages: Vec<String> = dom
        .find_all(root, |dom, n| dom.has_class(n, &config.page_class))
        .into_iter()
        .map(|page| markup::to_markup(&dom, page))
        .collect();
    if !pages.is_empty() {
        return Ok(pages);
    }

    let body = dom
        .first_child(root)
        .map(|element| markup::to_markup(&dom, element))
        .unwrap_or_default();
    Ok(vec![format!(
        r#"<div class="{}"><div class="{}">{}</div></div>"#,
        config.page_class, config.container_class, body
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::{InteractionEvent, MemoryStore, Outcome, Tool};

    const BOOK: &str = r#"<div><div class="gsr-page"><div class="gsr-text-ctn"><p>alpha beta gamma</p><p>delta</p></div></div><div class="gsr-page"><div class="gsr-text-ctn"><p>epsilon</p></div></div></div>"#;

    fn open(source: &str, store: MemoryStore) -> Viewer<MemoryStore> {
        Viewer::open(source, "book", "doc", store, AnnotatorConfig::default()).unwrap()
    }

    #[test]
    fn test_pages_render_to_lines() {
        let viewer = open(BOOK, MemoryStore::new());
        let texts: Vec<String> = viewer.lines().iter().map(|&l| viewer.line_text(l)).collect();

        assert_eq!(texts, vec!["alpha beta gamma", "delta", "epsilon"]);
    }

    #[test]
    fn test_plain_document_becomes_one_page() {
        let viewer = open("<article><p>one</p><p>two</p></article>", MemoryStore::new());

        assert_eq!(viewer.pages.len(), 1);
        assert_eq!(viewer.lines().len(), 1);
        assert_eq!(viewer.line_text(viewer.lines()[0]), "onetwo");
    }

    #[test]
    fn test_highlight_survives_rerender() {
        let mut viewer = open(BOOK, MemoryStore::new());
        viewer.app.handle(InteractionEvent::ToolToggled(Tool::Highlight));
        viewer.cursor.col = 6;
        viewer.start_selection();
        viewer.cursor.col = 9;
        let range = viewer.take_selection().unwrap();
        assert!(matches!(
            viewer.app.handle(InteractionEvent::SelectionCommit(range)),
            Outcome::Highlighted(_)
        ));

        assert_eq!(viewer.render_pages().unwrap(), 1);
        let arena = viewer.app.dom.arena_len();
        assert_eq!(viewer.render_pages().unwrap(), 1);
        assert_eq!(viewer.app.dom.arena_len(), arena);
        let applier = viewer.app.applier();
        let decorations = viewer
            .app
            .dom
            .find_all(viewer.app.dom.root(), |dom, n| applier.is_decoration(dom, n));
        assert_eq!(decorations.len(), 1);
        assert_eq!(viewer.app.dom.text_content(decorations[0]), "beta");
    }

    #[test]
    fn test_erase_at_cursor() {
        let mut viewer = open(BOOK, MemoryStore::new());
        viewer.app.handle(InteractionEvent::ToolToggled(Tool::Highlight));
        viewer.cursor.col = 6;
        viewer.start_selection();
        viewer.cursor.col = 9;
        let range = viewer.take_selection().unwrap();
        viewer.app.handle(InteractionEvent::SelectionCommit(range));

        viewer.app.handle(InteractionEvent::ToolToggled(Tool::Erase));
        viewer.cursor.col = 7;
        let point = viewer.hit_point().unwrap();
        assert!(matches!(viewer.app.handle(InteractionEvent::EraseAt(point)), Outcome::Erased(_)));
        assert!(viewer.app.stored_groups().is_empty());
    }
}
