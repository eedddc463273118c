//! Raster overlay visibility, reconciled against the rendering surface.
//!
//! Overlays are independent of the vector edit flow: the manager owns the
//! desired-visibility state, fetches TileJSON descriptors through the
//! per-organization cache, and adds or removes sources and layers on the
//! surface. Visibility changes that arrive before the surface has loaded
//! its style are held and replayed once on [`RasterVisibilityManager::notify_style_loaded`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use catalog::RasterId;
use formats::TileJson;
use viewsync::tilejson_cache::{DescriptorSource, TileJsonCache};

use crate::notices::{NoticeBus, NoticeLevel};

const RASTER_OPACITY: f64 = 0.75;

/// Mutation surface of the rendering map.
///
/// Implemented by the embedding over its map engine bindings; tests use an
/// in-memory recorder.
pub trait MapSurface {
    fn add_raster_source(&mut self, key: &str, descriptor: &TileJson);
    fn add_raster_layer(&mut self, key: &str, opacity: f64);
    fn remove_raster(&mut self, key: &str);
    fn has_source(&self, key: &str) -> bool;
}

pub struct RasterVisibilityManager {
    source: Arc<dyn DescriptorSource>,
    cache: Arc<TileJsonCache>,
    available: BTreeSet<RasterId>,
    visible: BTreeSet<RasterId>,
    active_org: Option<String>,
    style_loaded: bool,
    pending: Option<BTreeMap<RasterId, bool>>,
}

impl RasterVisibilityManager {
    pub fn new(source: Arc<dyn DescriptorSource>, cache: Arc<TileJsonCache>) -> Self {
        Self {
            source,
            cache,
            available: RasterId::ALL.iter().copied().collect(),
            visible: BTreeSet::new(),
            active_org: None,
            style_loaded: false,
            pending: None,
        }
    }

    pub fn is_visible(&self, raster: RasterId) -> bool {
        self.visible.contains(&raster)
    }

    /// Switches the active organization. Every mounted overlay comes down
    /// and the departing tenant's descriptors are purged from the cache.
    pub fn set_active_org(&mut self, surface: &mut dyn MapSurface, org: Option<&str>) {
        if self.active_org.as_deref() == org {
            return;
        }
        if let Some(prev) = self.active_org.take() {
            self.cache.purge_org(&prev);
        }
        for raster in std::mem::take(&mut self.visible) {
            surface.remove_raster(&raster.layer_key());
        }
        self.pending = None;
        self.active_org = org.map(str::to_string);
    }

    /// Updates which rasters the current organization may see. Overlays
    /// that became unavailable are unmounted and their cache entries dropped.
    pub fn set_available(&mut self, surface: &mut dyn MapSurface, available: BTreeSet<RasterId>) {
        for raster in RasterId::ALL {
            if self.available.contains(&raster) && !available.contains(&raster) {
                if self.visible.remove(&raster) {
                    surface.remove_raster(&raster.layer_key());
                }
                if let Some(org) = &self.active_org {
                    self.cache.remove(raster, org);
                }
            }
        }
        self.available = available;
    }

    /// Reconciles the surface toward the desired visibility map.
    ///
    /// Toggling a raster off removes its layer and source but keeps the
    /// cached descriptor, so the next toggle-on mounts without a refetch.
    /// Descriptor fetch failures surface as an error notice and evict any
    /// stale cache entry.
    pub async fn apply(
        &mut self,
        surface: &mut dyn MapSurface,
        desired: &BTreeMap<RasterId, bool>,
        notices: &mut NoticeBus,
    ) {
        if !self.style_loaded {
            self.pending = Some(desired.clone());
            return;
        }
        let Some(org) = self.active_org.clone() else {
            return;
        };

        for (&raster, &want) in desired {
            if !self.available.contains(&raster) {
                continue;
            }
            let key = raster.layer_key();
            if want && !self.visible.contains(&raster) {
                match self.cache.get_or_fetch(self.source.as_ref(), raster, &org).await {
                    Ok(descriptor) => {
                        if !surface.has_source(&key) {
                            surface.add_raster_source(&key, &descriptor);
                        }
                        surface.add_raster_layer(&key, RASTER_OPACITY);
                        self.visible.insert(raster);
                    }
                    Err(err) => {
                        self.cache.remove(raster, &org);
                        tracing::warn!(%raster, error = %err, "raster descriptor fetch failed");
                        notices.emit(
                            NoticeLevel::Error,
                            format!("Could not load {raster} tiles: {err}"),
                        );
                    }
                }
            } else if !want && self.visible.remove(&raster) {
                surface.remove_raster(&key);
            }
        }
    }

    /// Marks the surface style as ready and replays the last visibility
    /// request that arrived too early, if any.
    pub async fn notify_style_loaded(
        &mut self,
        surface: &mut dyn MapSurface,
        notices: &mut NoticeBus,
    ) {
        self.style_loaded = true;
        if let Some(desired) = self.pending.take() {
            self.apply(surface, &desired, notices).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use viewsync::error::FetchError;
    use viewsync::source::BoxFuture;

    struct CountingSource {
        fetches: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl DescriptorSource for CountingSource {
        fn fetch_tilejson(
            &self,
            raster: RasterId,
            org_id: &str,
        ) -> BoxFuture<'_, Result<TileJson, FetchError>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            let tiles = format!("http://tiles.test/{raster}/{org_id}/{{z}}/{{x}}/{{y}}.png");
            Box::pin(async move {
                if fail {
                    Err(FetchError::Unavailable {
                        message: "no imagery".to_string(),
                    })
                } else {
                    Ok(TileJson {
                        tiles: vec![tiles],
                        tile_size: 256,
                        minzoom: Some(0),
                        maxzoom: Some(22),
                    })
                }
            })
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        sources: BTreeSet<String>,
        layers: BTreeSet<String>,
        ops: Vec<String>,
    }

    impl MapSurface for RecordingSurface {
        fn add_raster_source(&mut self, key: &str, _descriptor: &TileJson) {
            self.sources.insert(key.to_string());
            self.ops.push(format!("add_source {key}"));
        }
        fn add_raster_layer(&mut self, key: &str, _opacity: f64) {
            self.layers.insert(key.to_string());
            self.ops.push(format!("add_layer {key}"));
        }
        fn remove_raster(&mut self, key: &str) {
            self.sources.remove(key);
            self.layers.remove(key);
            self.ops.push(format!("remove {key}"));
        }
        fn has_source(&self, key: &str) -> bool {
            self.sources.contains(key)
        }
    }

    fn manager(fail: bool) -> (RasterVisibilityManager, Arc<CountingSource>, Arc<TileJsonCache>) {
        let source = Arc::new(CountingSource::new(fail));
        let cache = Arc::new(TileJsonCache::new());
        let mgr = RasterVisibilityManager::new(source.clone(), cache.clone());
        (mgr, source, cache)
    }

    fn want(pairs: &[(RasterId, bool)]) -> BTreeMap<RasterId, bool> {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn visibility_before_style_load_is_deferred() {
        let (mut mgr, source, _cache) = manager(false);
        let mut surface = RecordingSurface::default();
        let mut notices = NoticeBus::new();
        mgr.set_active_org(&mut surface, Some("org-a"));

        mgr.apply(&mut surface, &want(&[(RasterId::Ortho, true)]), &mut notices)
            .await;
        assert!(surface.ops.is_empty());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

        mgr.notify_style_loaded(&mut surface, &mut notices).await;
        assert!(mgr.is_visible(RasterId::Ortho));
        assert!(surface.has_source("raster-ortho"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn toggle_cycle_reuses_cached_descriptor() {
        let (mut mgr, source, cache) = manager(false);
        let mut surface = RecordingSurface::default();
        let mut notices = NoticeBus::new();
        mgr.set_active_org(&mut surface, Some("org-a"));
        mgr.notify_style_loaded(&mut surface, &mut notices).await;

        mgr.apply(&mut surface, &want(&[(RasterId::Ortho, true)]), &mut notices)
            .await;
        mgr.apply(&mut surface, &want(&[(RasterId::Ortho, false)]), &mut notices)
            .await;
        assert!(!surface.has_source("raster-ortho"));
        assert!(cache.contains(RasterId::Ortho, "org-a"));

        mgr.apply(&mut surface, &want(&[(RasterId::Ortho, true)]), &mut notices)
            .await;
        assert!(surface.has_source("raster-ortho"));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn org_switch_unmounts_and_purges() {
        let (mut mgr, _source, cache) = manager(false);
        let mut surface = RecordingSurface::default();
        let mut notices = NoticeBus::new();
        mgr.set_active_org(&mut surface, Some("org-a"));
        mgr.notify_style_loaded(&mut surface, &mut notices).await;
        mgr.apply(&mut surface, &want(&[(RasterId::Ortho, true)]), &mut notices)
            .await;
        assert!(cache.contains(RasterId::Ortho, "org-a"));

        mgr.set_active_org(&mut surface, Some("org-b"));
        assert!(!surface.has_source("raster-ortho"));
        assert!(!mgr.is_visible(RasterId::Ortho));
        assert!(!cache.contains(RasterId::Ortho, "org-a"));
    }

    #[tokio::test]
    async fn fetch_failure_emits_notice_and_mounts_nothing() {
        let (mut mgr, _source, cache) = manager(true);
        let mut surface = RecordingSurface::default();
        let mut notices = NoticeBus::new();
        mgr.set_active_org(&mut surface, Some("org-a"));
        mgr.notify_style_loaded(&mut surface, &mut notices).await;

        mgr.apply(&mut surface, &want(&[(RasterId::Ortho, true)]), &mut notices)
            .await;
        assert!(!mgr.is_visible(RasterId::Ortho));
        assert!(!cache.contains(RasterId::Ortho, "org-a"));
        let drained = notices.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn unavailable_raster_is_ignored() {
        let (mut mgr, source, _cache) = manager(false);
        let mut surface = RecordingSurface::default();
        let mut notices = NoticeBus::new();
        mgr.set_active_org(&mut surface, Some("org-a"));
        mgr.notify_style_loaded(&mut surface, &mut notices).await;
        mgr.set_available(&mut surface, [RasterId::Ortho].into_iter().collect());

        mgr.apply(
            &mut surface,
            &want(&[(RasterId::DemHillshade, true)]),
            &mut notices,
        )
        .await;
        assert!(!mgr.is_visible(RasterId::DemHillshade));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }
}
