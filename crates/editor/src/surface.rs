use formats::{Feature, FeatureCollection, Geometry};

/// How an arriving feature collection reconciles with unsaved local edits.
///
/// With `ServerAuthoritative` a background re-fetch that lands before a save
/// completes silently discards in-progress edits; the server is the source
/// of truth and the surface mirrors it wholesale. `HoldWhileDirty` defers the
/// arriving collection instead and applies it once the surface is clean.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    #[default]
    ServerAuthoritative,
    HoldWhileDirty,
}

/// The interactive editing surface mirrored from the last fetched collection.
///
/// Reconciliation is a full replace, never a merge: on every applied
/// collection the surface is cleared, repopulated feature-by-feature, and the
/// dirty flag reset.
#[derive(Debug, Default)]
pub struct DrawSurface {
    policy: ReconcilePolicy,
    features: Vec<Feature>,
    dirty: bool,
    deferred: Option<FeatureCollection>,
}

impl DrawSurface {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn first(&self) -> Option<&Feature> {
        self.features.first()
    }

    pub fn find(&self, feature_id: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.feature_id() == Some(feature_id))
    }

    /// Applies a freshly fetched collection. Under `HoldWhileDirty` the
    /// collection is deferred while unsaved edits exist; returns whether the
    /// surface was replaced.
    pub fn apply_collection(&mut self, collection: FeatureCollection) -> bool {
        if self.policy == ReconcilePolicy::HoldWhileDirty && self.dirty {
            self.deferred = Some(collection);
            return false;
        }
        self.replace_all(collection);
        true
    }

    /// Applies a deferred collection once the surface is clean again.
    pub fn resolve_deferred(&mut self) -> bool {
        if self.dirty {
            return false;
        }
        match self.deferred.take() {
            Some(collection) => {
                self.replace_all(collection);
                true
            }
            None => false,
        }
    }

    /// Active-layer change: drop everything, including deferred state.
    pub fn clear(&mut self) {
        self.features.clear();
        self.dirty = false;
        self.deferred = None;
    }

    pub fn insert(&mut self, feature: Feature) {
        self.features.push(feature);
        self.dirty = true;
    }

    /// Replaces the geometry of a feature in place; returns `false` when the
    /// id is unknown.
    pub fn update_geometry(&mut self, feature_id: &str, geometry: Geometry) -> bool {
        let Some(feature) = self
            .features
            .iter_mut()
            .find(|f| f.feature_id() == Some(feature_id))
        else {
            return false;
        };
        feature.geometry = Some(geometry);
        self.dirty = true;
        true
    }

    pub fn remove(&mut self, feature_id: &str) -> bool {
        let before = self.features.len();
        self.features.retain(|f| f.feature_id() != Some(feature_id));
        if self.features.len() == before {
            return false;
        }
        self.dirty = true;
        true
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// A completed save settles the surface without touching its contents.
    pub fn set_clean(&mut self) {
        self.dirty = false;
    }

    fn replace_all(&mut self, collection: FeatureCollection) {
        self.features.clear();
        for feature in collection.features {
            self.features.push(feature);
        }
        self.dirty = false;
        self.deferred = None;
    }
}
