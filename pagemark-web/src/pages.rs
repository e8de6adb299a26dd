//! Mirror of the pages the browser has rendered
//!
//! The host sends each page's markup as it renders. Pages sit under one
//! viewer element in page order, so structural paths match the live
//! document. Unrendered pages are held by empty placeholders.

use serde::Serialize;

use pagemark_core::dom::markup;
use pagemark_core::{
    AnnotationStore, AnnotatorConfig, App, Boundary, CursorHint, Dom, DomError, GroupId, HitPoint, MarkupError,
    NodeId, SelectionRange,
};

/// Markup of one rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMarkup {
    pub number: usize,
    pub markup: String,
}

/// Result of an operation that may have changed pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUpdate {
    pub group_id: Option<String>,
    pub pages: Vec<PageMarkup>,
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page numbers start at 1")]
    InvalidPage,

    #[error("no node at path {0:?}")]
    NoNode(Vec<u32>),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

pub struct Annotator<S> {
    pub app: App<S>,
    viewer: NodeId,
    /// Node holding each page, and whether that page is rendered
    slots: Vec<(NodeId, bool)>,
}

impl<S: AnnotationStore> Annotator<S> {
    pub fn new(store: S, config: AnnotatorConfig) -> Result<Self, PageError> {
        let mut dom = Dom::new();
        let root = dom.root();
        let viewer = dom.create_element("div");
        dom.append_child(root, viewer)?;
        Ok(Self {
            app: App::new(dom, store, config),
            viewer,
            slots: Vec::new(),
        })
    }

    /// Render `markup` as page `number` (1-based) and restore its highlights.
    /// Returns the decorated page markup.
    pub fn mount_page(&mut self, number: usize, page_markup: &str) -> Result<String, PageError> {
        let index = number.checked_sub(1).ok_or(PageError::InvalidPage)?;
        while self.slots.len() <= index {
            let placeholder = self.app.dom.create_element("div");
            self.app.dom.append_child(self.viewer, placeholder)?;
            self.slots.push((placeholder, false));
        }

        let page = markup::parse_into(&mut self.app.dom, self.viewer, page_markup)?;
        // parse_into appends; move the page into its slot
        let previous = self.slots[index].0;
        self.app.dom.replace(previous, page)?;
        self.app.dom.remove(previous);
        self.slots[index] = (page, true);

        self.app.mount(&[page]);
        Ok(markup::to_markup(&self.app.dom, page))
    }

    /// Drop a page the host no longer renders
    pub fn unmount_page(&mut self, number: usize) -> Result<(), PageError> {
        let index = number.checked_sub(1).ok_or(PageError::InvalidPage)?;
        let Some(&(page, _)) = self.slots.get(index) else {
            return Ok(());
        };
        let placeholder = self.app.dom.create_element("div");
        self.app.dom.replace(page, placeholder)?;
        self.app.dom.remove(page);
        self.slots[index] = (placeholder, false);
        Ok(())
    }

    /// Node addressed by child indices below the viewer; the first index is
    /// the page
    pub fn node_at(&self, path: &[u32]) -> Result<NodeId, PageError> {
        let mut current = self.viewer;
        for &index in path {
            current = *self
                .app
                .dom
                .children(current)
                .get(index as usize)
                .ok_or_else(|| PageError::NoNode(path.to_vec()))?;
        }
        Ok(current)
    }

    pub fn selection(
        &self,
        start_path: &[u32],
        start_offset: usize,
        end_path: &[u32],
        end_offset: usize,
    ) -> Result<Option<SelectionRange>, PageError> {
        let start = Boundary::new(self.node_at(start_path)?, start_offset);
        let end = Boundary::new(self.node_at(end_path)?, end_offset);
        Ok(SelectionRange::new(&self.app.dom, start, end))
    }

    pub fn hit_point(&self, path: &[u32], offset: usize) -> Result<HitPoint, PageError> {
        Ok(HitPoint::new(self.node_at(path)?, offset))
    }

    pub fn cursor_hint(&self, path: &[u32]) -> Result<CursorHint, PageError> {
        let target = self.node_at(path)?;
        Ok(self.app.session.cursor_hint(&self.app.dom, target))
    }

    /// Markup of every rendered page
    pub fn rendered_pages(&self) -> Vec<PageMarkup> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, (_, rendered))| *rendered)
            .map(|(index, &(page, _))| PageMarkup {
                number: index + 1,
                markup: markup::to_markup(&self.app.dom, page),
            })
            .collect()
    }

    pub fn update(&self, group_id: Option<GroupId>) -> PageUpdate {
        PageUpdate {
            group_id: group_id.map(|id| id.0),
            pages: self.rendered_pages(),
        }
    }
}
