//! Embedded, file-backed document store
//!
//! The store is a single JSON file holding named collections of documents.
//! Each document is a field-keyed JSON object. Every mutation is written
//! through to disk immediately (write to a temp file, then rename), so the
//! file on disk always reflects the last completed operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::cache::CacheError;

/// A single stored document
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    collections: BTreeMap<String, Collection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    /// When this collection was last mutated
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    documents: Vec<Document>,
}

/// File-backed document store
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    file: StoreFile,
}

impl DocumentStore {
    /// Open the store at `path`, creating an empty one if the file doesn't exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let file = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            StoreFile::default()
        };
        debug!(path = %path.display(), collections = file.collections.len(), "Opened document store");
        Ok(Self { path, file })
    }

    /// Number of documents in a collection (0 if it doesn't exist)
    pub fn count(&self, collection: &str) -> usize {
        self.file
            .collections
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    /// All documents of a collection, in store order
    pub fn find_all(&self, collection: &str) -> &[Document] {
        self.file
            .collections
            .get(collection)
            .map(|c| c.documents.as_slice())
            .unwrap_or(&[])
    }

    pub fn updated_at(&self, collection: &str) -> Option<DateTime<Utc>> {
        self.file.collections.get(collection).and_then(|c| c.updated_at)
    }

    /// Remove every document of a collection. The collection itself is kept
    /// with a fresh `updated_at`.
    pub fn clear_collection(&mut self, collection: &str) -> Result<(), CacheError> {
        let entry = self.file.collections.entry(collection.to_string()).or_default();
        entry.documents.clear();
        entry.updated_at = Some(Utc::now());
        self.save()
    }

    /// Insert one document, creating the collection on first use
    pub fn insert(&mut self, collection: &str, document: Document) -> Result<(), CacheError> {
        let entry = self.file.collections.entry(collection.to_string()).or_default();
        entry.documents.push(document);
        entry.updated_at = Some(Utc::now());
        self.save()
    }

    fn save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.file)?;
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        let mut store = DocumentStore::open(&path).unwrap();
        store.insert("things", doc(json!({"name": "a"}))).unwrap();
        store.insert("things", doc(json!({"name": "b"}))).unwrap();
        assert!(store.updated_at("things").is_some());

        let reopened = DocumentStore::open(&path).unwrap();
        assert_eq!(reopened.count("things"), 2);
        assert_eq!(reopened.find_all("things")[1]["name"], "b");
    }

    #[test]
    fn test_clear_collection() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = DocumentStore::open(&path).unwrap();
        store.insert("things", doc(json!({"name": "a"}))).unwrap();
        store.insert("other", doc(json!({"name": "x"}))).unwrap();
        let before = store.updated_at("things").unwrap();
        store.clear_collection("things").unwrap();

        let reopened = DocumentStore::open(&path).unwrap();
        assert_eq!(reopened.count("things"), 0);
        assert_eq!(reopened.count("other"), 1);
        assert!(reopened.updated_at("things").unwrap() >= before);
    }

    #[test]
    fn test_clearing_missing_collection_records_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(temp_dir.path().join("store.json")).unwrap();
        assert!(store.updated_at("things").is_none());
        store.clear_collection("things").unwrap();
        assert!(store.updated_at("things").is_some());
        assert_eq!(store.count("things"), 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(DocumentStore::open(&path), Err(CacheError::Json(_))));
    }
}
