//! Persistent cache of discovered address pairs
//!
//! Pairs live in a single named collection of the document store. Each
//! document holds two text fields, `networkAddress` (dotted-quad) and
//! `macAddress` (canonical dash-hex).
//!
//! The cache performs no deduplication and no transactions: `replace_all`
//! clears the collection and then writes each pair independently.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::address::{parse_network_address, AddressError, HardwareAddress};
use crate::device::DevicePair;
use crate::store::{Document, DocumentStore};

/// Name of the collection holding address pairs
pub const PAIRS_COLLECTION: &str = "ipMacPairs";

const NETWORK_ADDRESS_FIELD: &str = "networkAddress";
const MAC_ADDRESS_FIELD: &str = "macAddress";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Stored document is missing text field {0:?}")]
    MissingField(&'static str),
    #[error("Stored value is malformed: {0}")]
    Parse(#[from] AddressError),
}

/// Device cache backed by a document store
#[derive(Debug)]
pub struct DeviceCache {
    store: DocumentStore,
}

impl DeviceCache {
    /// Open the cache stored at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Ok(Self::from_store(DocumentStore::open(path)?))
    }

    pub fn from_store(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn is_empty(&self) -> bool {
        self.store.count(PAIRS_COLLECTION) == 0
    }

    /// When the pairs were last written, if ever
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.store.updated_at(PAIRS_COLLECTION)
    }

    /// Clear every stored pair, then insert each of `pairs`
    pub fn replace_all(&mut self, pairs: &[DevicePair]) -> Result<(), CacheError> {
        self.store.clear_collection(PAIRS_COLLECTION)?;
        for pair in pairs {
            self.store.insert(PAIRS_COLLECTION, to_document(pair))?;
        }
        debug!(count = pairs.len(), "Replaced cached pairs");
        Ok(())
    }

    /// Insert one pair without checking for an existing entry
    pub fn append(&mut self, pair: &DevicePair) -> Result<(), CacheError> {
        self.store.insert(PAIRS_COLLECTION, to_document(pair))?;
        debug!(ip = %pair.address, mac = %pair.hardware, "Appended cached pair");
        Ok(())
    }

    /// All stored pairs in store order. A malformed document fails the whole read.
    pub fn list_all(&self) -> Result<Vec<DevicePair>, CacheError> {
        self.store
            .find_all(PAIRS_COLLECTION)
            .iter()
            .map(from_document)
            .collect()
    }
}

fn to_document(pair: &DevicePair) -> Document {
    let mut document = Document::new();
    document.insert(
        NETWORK_ADDRESS_FIELD.to_string(),
        Value::String(pair.address.to_string()),
    );
    document.insert(
        MAC_ADDRESS_FIELD.to_string(),
        Value::String(pair.hardware.to_string()),
    );
    document
}

fn from_document(document: &Document) -> Result<DevicePair, CacheError> {
    let text_field = |name: &'static str| {
        document
            .get(name)
            .and_then(Value::as_str)
            .ok_or(CacheError::MissingField(name))
    };

    let address = parse_network_address(text_field(NETWORK_ADDRESS_FIELD)?)?;
    let hardware: HardwareAddress = text_field(MAC_ADDRESS_FIELD)?.parse()?;
    Ok(DevicePair::new(address, hardware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    fn pair(last: u8) -> DevicePair {
        DevicePair::new(
            Ipv4Addr::new(192, 168, 1, last),
            HardwareAddress::new([0x00, 0x1A, 0x2B, 0x3C, 0x4D, last]),
        )
    }

    #[test]
    fn test_new_cache_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DeviceCache::open(temp_dir.path().join("pairs.json")).unwrap();
        assert!(cache.is_empty());
        assert!(cache.list_all().unwrap().is_empty());
        assert!(cache.updated_at().is_none());
    }

    #[test]
    fn test_replace_all_discards_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = DeviceCache::open(temp_dir.path().join("pairs.json")).unwrap();

        cache.replace_all(&[pair(1), pair(2), pair(3)]).unwrap();
        cache.replace_all(&[pair(4), pair(5)]).unwrap();

        let stored: HashSet<DevicePair> = cache.list_all().unwrap().into_iter().collect();
        assert_eq!(stored, HashSet::from([pair(4), pair(5)]));
    }

    #[test]
    fn test_replace_all_with_nothing_empties_cache() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = DeviceCache::open(temp_dir.path().join("pairs.json")).unwrap();
        cache.append(&pair(1)).unwrap();
        cache.replace_all(&[]).unwrap();
        assert!(cache.is_empty());
        assert!(cache.updated_at().is_some());
    }

    #[test]
    fn test_empty_replace_survives_reopen_with_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pairs.json");
        DeviceCache::open(&path).unwrap().replace_all(&[]).unwrap();

        let cache = DeviceCache::open(&path).unwrap();
        assert!(cache.is_empty());
        assert!(cache.updated_at().is_some());
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = DeviceCache::open(temp_dir.path().join("pairs.json")).unwrap();
        cache.replace_all(&[pair(7)]).unwrap();
        cache.append(&pair(7)).unwrap();
        assert_eq!(cache.list_all().unwrap(), vec![pair(7), pair(7)]);
    }

    #[test]
    fn test_pairs_survive_reopen_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pairs.json");
        let written = DevicePair::new(
            Ipv4Addr::new(10, 20, 30, 40),
            HardwareAddress::new([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]),
        );

        DeviceCache::open(&path).unwrap().append(&written).unwrap();

        let cache = DeviceCache::open(&path).unwrap();
        let read = cache.list_all().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].address.octets(), written.address.octets());
        assert_eq!(read[0].hardware.octets(), written.hardware.octets());
    }

    #[test]
    fn test_documents_use_canonical_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pairs.json");
        DeviceCache::open(&path).unwrap().append(&pair(9)).unwrap();

        let store = DocumentStore::open(&path).unwrap();
        let document = &store.find_all(PAIRS_COLLECTION)[0];
        assert_eq!(document["networkAddress"], "192.168.1.9");
        assert_eq!(document["macAddress"], "00-1A-2B-3C-4D-09");
    }

    #[test]
    fn test_foreign_stored_value_fails_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pairs.json");

        let mut store = DocumentStore::open(&path).unwrap();
        store
            .insert(
                PAIRS_COLLECTION,
                json!({"networkAddress": "192.168.1.1", "macAddress": "not-a-mac"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();

        let cache = DeviceCache::from_store(store);
        assert!(matches!(cache.list_all(), Err(CacheError::Parse(_))));
    }

    #[test]
    fn test_missing_field_fails_read() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(temp_dir.path().join("pairs.json")).unwrap();
        store
            .insert(
                PAIRS_COLLECTION,
                json!({"networkAddress": "192.168.1.1"}).as_object().cloned().unwrap(),
            )
            .unwrap();

        let cache = DeviceCache::from_store(store);
        assert!(matches!(
            cache.list_all(),
            Err(CacheError::MissingField("macAddress"))
        ));
    }
}
