//! Annotation store backed by a single JSON file

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pagemark_core::{AnnotationStore, Group, StoreError};

type Entries = BTreeMap<String, Vec<Group>>;

/// Maps document ids to their groups in one JSON object on disk.
/// The file is read on every `get` and rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Entries, StoreError> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let json = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Backend(format!("failed to read {}: {}", self.path.display(), e)))?;
        if json.trim().is_empty() {
            return Ok(Entries::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, entries: &Entries) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .map_err(|e| StoreError::Backend(format!("failed to write {}: {}", self.path.display(), e)))
    }
}

impl AnnotationStore for JsonFileStore {
    fn get(&self, document_id: &str) -> Result<Option<Vec<Group>>, StoreError> {
        Ok(self.read()?.remove(document_id))
    }

    fn set(&mut self, document_id: &str, groups: &[Group]) -> Result<(), StoreError> {
        let mut entries = self.read()?;
        entries.insert(document_id.to_string(), groups.to_vec());
        self.write(&entries)
    }

    fn remove(&mut self, document_id: &str) -> Result<(), StoreError> {
        let mut entries = self.read()?;
        if entries.remove(document_id).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::{Anchor, GroupId};
    use tempfile::TempDir;

    fn group(id: &str) -> Group {
        Group::new(
            GroupId::from(id),
            "red",
            vec![Anchor {
                structural_path: "/div[1]/p[2]".parse().unwrap(),
                text_snippet: "beta".to_string(),
                offset_within_snippet: 6,
            }],
        )
    }

    #[test]
    fn test_missing_file_reads_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("annotations.json"));

        assert!(store.get("doc").unwrap().is_none());
    }

    #[test]
    fn test_documents_are_kept_apart() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join("annotations.json"));

        store.set("a", &[group("group-1")]).unwrap();
        store.set("b", &[group("group-2")]).unwrap();
        store.remove("a").unwrap();

        assert!(store.get("a").unwrap().is_none());
        assert_eq!(store.get("b").unwrap(), Some(vec![group("group-2")]));
    }

    #[test]
    fn test_file_uses_record_shape() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join("annotations.json"));
        store.set("doc", &[group("group-1")]).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();

        assert_eq!(json["doc"][0]["id"], "group-1");
        assert_eq!(json["doc"][0]["nodes"][0]["xpath"], "/div[1]/p[2]");
        assert_eq!(json["doc"][0]["nodes"][0]["text"], "beta");
        assert_eq!(json["doc"][0]["nodes"][0]["offset"], 6);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotations.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.get("doc"), Err(StoreError::Serialization(_))));
    }
}
