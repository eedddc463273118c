use catalog::LayerId;
use foundation::BboxTuple;

/// Identifies one bounded feature-collection fetch.
///
/// Two requests with equal keys are cache-equivalent: the planner never
/// re-issues the key that is already current, so equal keys collapse to one
/// in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureRequestKey {
    pub layer: LayerId,
    pub org_id: String,
    /// Canonical 6-decimal bbox serialization.
    pub bbox: String,
    pub limit: u32,
}

impl FeatureRequestKey {
    pub fn new(layer: LayerId, org_id: impl Into<String>, bbox: &BboxTuple, limit: u32) -> Self {
        Self {
            layer,
            org_id: org_id.into(),
            bbox: bbox.to_query_string(),
            limit,
        }
    }

    /// Query-string form attached to the items request.
    pub fn query_string(&self) -> String {
        format!(
            "org_id={}&bbox={}&bbox-crs=EPSG:4326&limit={}",
            self.org_id, self.bbox, self.limit
        )
    }
}
