//! Browser persistence using Web APIs

use wasm_bindgen::prelude::*;
use web_sys::Storage;

use pagemark_core::{AnnotationStore, Group, StoreError};

/// Groups kept in `localStorage`, one key per document id
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore {
    prefix: String,
}

impl LocalStorageStore {
    /// Keys are `prefix` followed by the document id
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn key(&self, document_id: &str) -> String {
        format!("{}{}", self.prefix, document_id)
    }
}

fn js_error(value: JsValue) -> StoreError {
    StoreError::Backend(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

fn storage() -> Result<Storage, StoreError> {
    let window = web_sys::window().ok_or_else(|| StoreError::Backend("No window".to_string()))?;
    window
        .local_storage()
        .map_err(js_error)?
        .ok_or_else(|| StoreError::Backend("No localStorage".to_string()))
}

impl AnnotationStore for LocalStorageStore {
    fn get(&self, document_id: &str) -> Result<Option<Vec<Group>>, StoreError> {
        let Some(json) = storage()?.get_item(&self.key(document_id)).map_err(js_error)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn set(&mut self, document_id: &str, groups: &[Group]) -> Result<(), StoreError> {
        let json = serde_json::to_string(groups)?;
        storage()?
            .set_item(&self.key(document_id), &json)
            .map_err(js_error)
    }

    fn remove(&mut self, document_id: &str) -> Result<(), StoreError> {
        storage()?
            .remove_item(&self.key(document_id))
            .map_err(js_error)
    }
}
