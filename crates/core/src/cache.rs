//! Café cache keyed by quantized coordinates.
//!
//! Collections are stored as JSON blobs under `cafes_<lat>_<lon>` keys in a
//! [`BlobStore`], mirroring a browser's local storage. Entries never expire.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::Result;
use crate::geo::{CellKey, Coordinate};
use crate::poi::PointOfInterest;

/// Decimal places used for cache cells (~111 m).
pub const DEFAULT_PRECISION: usize = 3;

/// Key → JSON blob storage.
pub trait BlobStore {
    fn load(&self, key: &str) -> Option<String>;

    fn save(&mut self, key: &str, blob: String) -> Result<()>;
}

/// Process-local store; lives as long as the page/session does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    fn save(&mut self, key: &str, blob: String) -> Result<()> {
        self.inner.insert(key.to_string(), blob);
        Ok(())
    }
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, blob: String) -> Result<()> {
        (**self).save(key, blob)
    }
}

/// Unfiltered café collections per quantized cell.
pub struct PoiCache<S> {
    store: S,
    precision: usize,
}

impl<S: BlobStore> PoiCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_precision(store, DEFAULT_PRECISION)
    }

    pub fn with_precision(store: S, precision: usize) -> Self {
        Self { store, precision }
    }

    pub fn key(&self, at: &Coordinate) -> CellKey {
        at.cell(self.precision)
    }

    /// Cached collection for the cell containing `at`.
    ///
    /// A blob that no longer parses is treated as a miss.
    pub fn get(&self, at: &Coordinate) -> Option<Vec<PointOfInterest>> {
        let key = self.key(at).to_string();
        let blob = self.store.load(&key)?;
        match serde_json::from_str(&blob) {
            Ok(pois) => {
                debug!("cache hit for {}", key);
                Some(pois)
            }
            Err(e) => {
                warn!("ignoring unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub fn put(&mut self, at: &Coordinate, pois: &[PointOfInterest]) -> Result<()> {
        let key = self.key(at).to_string();
        let blob = serde_json::to_string(pois)
            .map_err(|e| crate::error::Error::Store(format!("serializing {key}: {e}")))?;
        debug!("caching {} cafes under {}", pois.len(), key);
        self.store.save(&key, blob)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn cafe(name: &str) -> PointOfInterest {
        let mut tags = BTreeMap::new();
        tags.insert("name".to_string(), name.to_string());
        PointOfInterest::new(Coordinate::new(14.6, 120.98), tags)
    }

    #[test]
    fn test_cache_put_get_same_cell() {
        let mut cache = PoiCache::new(MemoryStore::new());
        let at = Coordinate::new(14.59951, 120.98421);
        cache.put(&at, &[cafe("Brew Co")]).unwrap();

        let near = Coordinate::new(14.59989, 120.98438);
        let hit = cache.get(&near).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].display_name(), "Brew Co");
        assert!(cache.get(&Coordinate::new(14.61, 120.98)).is_none());
    }

    #[test]
    fn test_cache_key_format() {
        let cache = PoiCache::new(MemoryStore::new());
        let key = cache.key(&Coordinate::new(14.5995, 120.9842));
        assert_eq!(key.to_string(), "cafes_14.600_120.984");
    }

    #[test]
    fn test_corrupt_blob_is_a_miss() {
        let mut store = MemoryStore::new();
        store
            .save("cafes_14.600_120.984", "not json".to_string())
            .unwrap();
        let cache = PoiCache::new(store);
        assert!(cache.get(&Coordinate::new(14.5995, 120.9842)).is_none());
    }

    #[test]
    fn test_empty_collection_is_cached() {
        let mut cache = PoiCache::new(MemoryStore::new());
        let at = Coordinate::new(1.0, 2.0);
        cache.put(&at, &[]).unwrap();
        assert_eq!(cache.get(&at), Some(vec![]));
        assert_eq!(cache.store().len(), 1);
    }
}
