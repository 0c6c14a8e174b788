//! Cache-backed café discovery.
//!
//! A lookup probes the [`PoiCache`] cell for the position first; only a miss
//! reaches the [`PoiSource`]. Fresh results are stored unfiltered, failures
//! are never cached.

use std::sync::Arc;

use cafemap_core::{BlobStore, Coordinate, PoiCache, PointOfInterest, Result};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::providers::PoiSource;

pub struct PoiDiscovery<S> {
    source: Arc<dyn PoiSource>,
    cache: PoiCache<S>,
}

impl<S: BlobStore> PoiDiscovery<S> {
    pub fn new(source: Arc<dyn PoiSource>, cache: PoiCache<S>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &PoiCache<S> {
        &self.cache
    }

    /// Cached collection for the cell containing `at`.
    pub fn cached(&self, at: &Coordinate) -> Option<Vec<PointOfInterest>> {
        let hit = self.cache.get(at);
        if hit.is_none() {
            debug!("cache miss for {}", self.cache.key(at));
        }
        hit
    }

    /// Source lookup detached from `self`, for running alongside other work.
    pub fn fetch(&self, at: Coordinate, radius_m: u32) -> BoxFuture<'static, Result<Vec<PointOfInterest>>> {
        let source = Arc::clone(&self.source);
        Box::pin(async move { source.cafes_near(at, radius_m).await })
    }

    /// Remember a fetched collection. A failing store only costs a refetch.
    pub fn store(&mut self, at: &Coordinate, pois: &[PointOfInterest]) {
        if let Err(e) = self.cache.put(at, pois) {
            warn!("could not cache cafes for {}: {}", at, e);
        }
    }

    /// Cached cafés for `at`, or fetch and cache them.
    pub async fn discover(&mut self, at: Coordinate, radius_m: u32) -> Result<Vec<PointOfInterest>> {
        if let Some(pois) = self.cached(&at) {
            return Ok(pois);
        }
        let pois = self.fetch(at, radius_m).await?;
        self.store(&at, &pois);
        Ok(pois)
    }
}
