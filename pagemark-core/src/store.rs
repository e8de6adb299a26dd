//! Persistence contract for annotation groups
//!
//! A store maps a document identifier to the ordered list of groups
//! highlighted in that document. Backends live with the host: a JSON file
//! for the terminal viewer, `localStorage` in the browser.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::model::Group;

pub trait AnnotationStore {
    /// Groups stored for `document_id`; `Ok(None)` when the key is absent
    fn get(&self, document_id: &str) -> Result<Option<Vec<Group>>, StoreError>;

    /// Replace the groups stored for `document_id`
    fn set(&mut self, document_id: &str, groups: &[Group]) -> Result<(), StoreError>;

    /// Drop the entry for `document_id`
    fn remove(&mut self, document_id: &str) -> Result<(), StoreError>;
}

/// In-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<Group>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AnnotationStore for MemoryStore {
    fn get(&self, document_id: &str) -> Result<Option<Vec<Group>>, StoreError> {
        Ok(self.entries.get(document_id).cloned())
    }

    fn set(&mut self, document_id: &str, groups: &[Group]) -> Result<(), StoreError> {
        self.entries.insert(document_id.to_string(), groups.to_vec());
        Ok(())
    }

    fn remove(&mut self, document_id: &str) -> Result<(), StoreError> {
        self.entries.remove(document_id);
        Ok(())
    }
}

impl<S: AnnotationStore + ?Sized> AnnotationStore for Box<S> {
    fn get(&self, document_id: &str) -> Result<Option<Vec<Group>>, StoreError> {
        (**self).get(document_id)
    }

    fn set(&mut self, document_id: &str, groups: &[Group]) -> Result<(), StoreError> {
        (**self).set(document_id, groups)
    }

    fn remove(&mut self, document_id: &str) -> Result<(), StoreError> {
        (**self).remove(document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupId;

    #[test]
    fn test_absent_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("doc").unwrap().is_none());
    }

    #[test]
    fn test_set_get_remove() {
        let mut store = MemoryStore::new();
        let groups = vec![Group::new(GroupId::from("group-1"), "red", Vec::new())];

        store.set("doc", &groups).unwrap();
        assert_eq!(store.get("doc").unwrap(), Some(groups));

        store.remove("doc").unwrap();
        assert!(store.get("doc").unwrap().is_none());
        assert!(store.is_empty());
    }
}
