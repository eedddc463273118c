use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Optional imagery overlays available per organization.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RasterId {
    Ortho,
    DemHillshade,
}

impl RasterId {
    pub const ALL: [RasterId; 2] = [RasterId::Ortho, RasterId::DemHillshade];

    pub fn as_str(&self) -> &'static str {
        match self {
            RasterId::Ortho => "ortho",
            RasterId::DemHillshade => "dem_hillshade",
        }
    }

    /// Map layer/source identifier for this raster.
    pub fn layer_key(&self) -> String {
        format!("raster-{}", self.as_str())
    }
}

impl fmt::Display for RasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterDefinition {
    pub id: RasterId,
    pub title: &'static str,
    /// Descriptor route; callers append `?org_id=`.
    pub tilejson_route: String,
}

pub(crate) fn build_rasters() -> BTreeMap<RasterId, RasterDefinition> {
    let mut rasters = BTreeMap::new();
    rasters.insert(
        RasterId::Ortho,
        RasterDefinition {
            id: RasterId::Ortho,
            title: "Orthophoto",
            tilejson_route: "/api/rasters/ortho/tilejson".to_string(),
        },
    );
    rasters.insert(
        RasterId::DemHillshade,
        RasterDefinition {
            id: RasterId::DemHillshade,
            title: "DEM Hillshade",
            tilejson_route: "/api/rasters/dem_hillshade/tilejson".to_string(),
        },
    );
    rasters
}

#[cfg(test)]
mod tests {
    use super::RasterId;
    use crate::Registry;

    #[test]
    fn raster_layer_keys_are_prefixed() {
        assert_eq!(RasterId::Ortho.layer_key(), "raster-ortho");
        assert_eq!(RasterId::DemHillshade.layer_key(), "raster-dem_hillshade");
    }

    #[test]
    fn descriptor_routes_are_registered() {
        let registry = Registry::default();
        assert_eq!(
            registry.raster(RasterId::Ortho).tilejson_route,
            "/api/rasters/ortho/tilejson"
        );
    }
}
