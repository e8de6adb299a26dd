//! Pagemark Web - highlight bridge for pages rendered in the browser
//!
//! The host renders pages itself and hands each page's markup to a
//! [`WebAnnotator`]. The annotator restores stored highlights into that
//! markup, turns selections and clicks into highlights and erasures, and
//! keeps groups in `localStorage`.

use wasm_bindgen::prelude::*;

use pagemark_core::{AnnotatorConfig, CursorHint, GroupId, InteractionEvent, Outcome, Tool};

pub mod io;
pub mod pages;

use crate::io::LocalStorageStore;
use crate::pages::{Annotator, PageUpdate};

const STORAGE_PREFIX: &str = "pagemark:";

#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"Pagemark WASM initialized".into());
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn tool(name: &str) -> Result<Tool, JsValue> {
    Tool::from_name(name).ok_or_else(|| JsValue::from_str(&format!("Unknown tool: {}", name)))
}

/// Highlight annotator for one viewer
#[wasm_bindgen]
pub struct WebAnnotator {
    inner: Annotator<LocalStorageStore>,
}

#[wasm_bindgen]
impl WebAnnotator {
    /// Create an annotator; `config_json` overrides default class names and
    /// palettes
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WebAnnotator, JsValue> {
        let config = match config_json {
            Some(json) => AnnotatorConfig::from_json(&json).map_err(to_js)?,
            None => AnnotatorConfig::default(),
        };
        let inner = Annotator::new(LocalStorageStore::new(STORAGE_PREFIX), config).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// Identify the open document; pages mounted before this are restored now
    #[wasm_bindgen(js_name = "setDocumentId")]
    pub fn set_document_id(&mut self, document_id: String) -> Result<JsValue, JsValue> {
        let outcome = self.inner.app.handle(InteractionEvent::DocumentId(document_id));
        if let Outcome::Reconciled(reports) = outcome {
            let restored: usize = reports.iter().map(|r| r.applied).sum();
            web_sys::console::log_1(&format!("Pagemark restored {} highlights", restored).into());
        }
        self.update(None)
    }

    /// Render a page; returns its markup with stored highlights applied
    #[wasm_bindgen(js_name = "mountPage")]
    pub fn mount_page(&mut self, number: usize, markup: &str) -> Result<String, JsValue> {
        self.inner.mount_page(number, markup).map_err(to_js)
    }

    #[wasm_bindgen(js_name = "unmountPage")]
    pub fn unmount_page(&mut self, number: usize) -> Result<(), JsValue> {
        self.inner.unmount_page(number).map_err(to_js)
    }

    /// Commit a selection while highlighting. Paths are child indices from
    /// the viewer element down to each boundary node.
    #[wasm_bindgen(js_name = "highlight")]
    pub fn highlight(
        &mut self,
        start_path: Vec<u32>,
        start_offset: usize,
        end_path: Vec<u32>,
        end_offset: usize,
    ) -> Result<JsValue, JsValue> {
        let Some(range) = self
            .inner
            .selection(&start_path, start_offset, &end_path, end_offset)
            .map_err(to_js)?
        else {
            return self.update(None);
        };
        match self.inner.app.handle(InteractionEvent::SelectionCommit(range)) {
            Outcome::Highlighted(id) => self.update(Some(id)),
            _ => self.update(None),
        }
    }

    /// Click while erasing
    #[wasm_bindgen(js_name = "eraseAt")]
    pub fn erase_at(&mut self, path: Vec<u32>, offset: usize) -> Result<JsValue, JsValue> {
        let point = self.inner.hit_point(&path, offset).map_err(to_js)?;
        match self.inner.app.handle(InteractionEvent::EraseAt(point)) {
            Outcome::Erased(id) => self.update(Some(id)),
            _ => self.update(None),
        }
    }

    #[wasm_bindgen(js_name = "eraseGroup")]
    pub fn erase_group(&mut self, group_id: String) -> Result<JsValue, JsValue> {
        let id = GroupId(group_id);
        if self.inner.app.erase_group(&id) {
            self.update(Some(id))
        } else {
            self.update(None)
        }
    }

    /// Erase every highlight of the open document
    #[wasm_bindgen(js_name = "eraseAll")]
    pub fn erase_all(&mut self) -> Result<JsValue, JsValue> {
        if let Outcome::ErasedAll(count) = self.inner.app.handle(InteractionEvent::EraseAll) {
            web_sys::console::log_1(&format!("Pagemark erased {} highlights", count).into());
        }
        self.update(None)
    }

    /// Toggle a tool by name; returns the resulting mode
    #[wasm_bindgen(js_name = "toggleTool")]
    pub fn toggle_tool(&mut self, name: &str) -> Result<String, JsValue> {
        let tool = tool(name)?;
        match self.inner.app.handle(InteractionEvent::ToolToggled(tool)) {
            Outcome::ModeChanged(mode) => Ok(format!("{:?}", mode).to_lowercase()),
            Outcome::Rejected(e) => {
                web_sys::console::warn_1(&e.to_string().into());
                Err(to_js(e))
            }
            _ => Err(JsValue::from_str("Tool not toggled")),
        }
    }

    #[wasm_bindgen(js_name = "pickColor")]
    pub fn pick_color(&mut self, tool_name: &str, color: String) -> Result<(), JsValue> {
        let tool = tool(tool_name)?;
        match self.inner.app.handle(InteractionEvent::ColorPicked(tool, color)) {
            Outcome::Rejected(e) => Err(to_js(e)),
            _ => Ok(()),
        }
    }

    /// CSS cursor for the node at `path`
    #[wasm_bindgen(js_name = "cursorHint")]
    pub fn cursor_hint(&self, path: Vec<u32>) -> Result<String, JsValue> {
        let hint = self.inner.cursor_hint(&path).map_err(to_js)?;
        Ok(match hint {
            CursorHint::Crosshair => "crosshair",
            CursorHint::Pointer => "pointer",
            CursorHint::Text => "text",
            CursorHint::Default => "default",
        }
        .to_string())
    }

    #[wasm_bindgen(js_name = "storedGroups")]
    pub fn stored_groups(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.app.stored_groups()).map_err(to_js)
    }

    /// Colours offered for a tool and the one currently picked
    #[wasm_bindgen(js_name = "palette")]
    pub fn palette(&self, tool_name: &str) -> Result<JsValue, JsValue> {
        let tool = tool(tool_name)?;
        let app = &self.inner.app;
        let palette = serde_json::json!({
            "colors": app.config().palettes.for_tool(tool),
            "current": app.session.color(tool),
        });
        serde_wasm_bindgen::to_value(&palette).map_err(to_js)
    }
}

impl WebAnnotator {
    fn update(&self, group_id: Option<GroupId>) -> Result<JsValue, JsValue> {
        let update: PageUpdate = self.inner.update(group_id);
        serde_wasm_bindgen::to_value(&update).map_err(to_js)
    }
}
