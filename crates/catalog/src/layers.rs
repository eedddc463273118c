use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RegistryConfig;

/// The editable vector layers, ordered coarse to fine.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    Farms,
    Fields,
    Buildings,
    Greenhouses,
    GreenhouseAreas,
}

impl LayerId {
    pub const ALL: [LayerId; 5] = [
        LayerId::Farms,
        LayerId::Fields,
        LayerId::Buildings,
        LayerId::Greenhouses,
        LayerId::GreenhouseAreas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerId::Farms => "farms",
            LayerId::Fields => "fields",
            LayerId::Buildings => "buildings",
            LayerId::Greenhouses => "greenhouses",
            LayerId::GreenhouseAreas => "greenhouse_areas",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayer(pub String);

impl fmt::Display for UnknownLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown layer: {}", self.0)
    }
}

impl std::error::Error for UnknownLayer {}

impl FromStr for LayerId {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownLayer(s.to_string()))
    }
}

/// Declared geometry type for a layer.
///
/// Layers declaring `MultiPolygon` also accept `Polygon` payloads; the
/// upsert RPCs widen single polygons on write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Polygon,
    MultiPolygon,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }

    pub fn accepts(&self, geometry_type_name: &str) -> bool {
        geometry_type_name == self.as_str()
            || (*self == GeometryType::MultiPolygon && geometry_type_name == "Polygon")
    }
}

/// Fill + line styling for a vector layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPaint {
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub line_color: &'static str,
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerDefinition {
    pub id: LayerId,
    pub title: &'static str,
    pub geom_type: GeometryType,
    /// Feature server collection, also the `{layer}` segment of write routes.
    pub collection_id: &'static str,
    pub tiles_path_template: String,
    pub feature_collection_path: String,
    pub rpc_upsert: &'static str,
    pub rpc_delete: &'static str,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub paint: LayerPaint,
}

impl LayerDefinition {
    /// Whether the layer should be visible at all at the given zoom.
    pub fn visible_at_zoom(&self, zoom: f64) -> bool {
        zoom >= self.minzoom as f64 && zoom <= self.maxzoom as f64
    }
}

/// Attribute fields that must be non-empty before a feature may be saved.
pub fn required_fields(layer: LayerId) -> &'static [&'static str] {
    match layer {
        LayerId::Farms => &["name"],
        LayerId::Buildings => &["btype"],
        LayerId::GreenhouseAreas => &["use_type"],
        LayerId::Fields | LayerId::Greenhouses => &[],
    }
}

pub(crate) fn build_vector_layers(
    config: &RegistryConfig,
) -> BTreeMap<LayerId, LayerDefinition> {
    let def = |id: LayerId,
               title: &'static str,
               minzoom: u8,
               maxzoom: u8,
               paint: LayerPaint| LayerDefinition {
        id,
        title,
        geom_type: GeometryType::MultiPolygon,
        collection_id: id.as_str(),
        tiles_path_template: format!(
            "{}/public.{}/{{z}}/{{x}}/{{y}}.pbf",
            config.tileserv_base,
            id.as_str()
        ),
        feature_collection_path: format!(
            "{}/collections/{}/items",
            config.featureserv_base,
            id.as_str()
        ),
        rpc_upsert: match id {
            LayerId::Farms => "farms_upsert",
            LayerId::Fields => "fields_upsert",
            LayerId::Buildings => "buildings_upsert",
            LayerId::Greenhouses => "greenhouses_upsert",
            LayerId::GreenhouseAreas => "greenhouse_areas_upsert",
        },
        rpc_delete: match id {
            LayerId::Farms => "farms_delete",
            LayerId::Fields => "fields_delete",
            LayerId::Buildings => "buildings_delete",
            LayerId::Greenhouses => "greenhouses_delete",
            LayerId::GreenhouseAreas => "greenhouse_areas_delete",
        },
        minzoom,
        maxzoom,
        paint,
    };

    let mut layers = BTreeMap::new();
    layers.insert(
        LayerId::Farms,
        def(
            LayerId::Farms,
            "Farms",
            4,
            16,
            LayerPaint {
                fill_color: "#22c55e",
                fill_opacity: 0.3,
                line_color: "#15803d",
                line_width: 1.5,
            },
        ),
    );
    layers.insert(
        LayerId::Fields,
        def(
            LayerId::Fields,
            "Fields",
            8,
            22,
            LayerPaint {
                fill_color: "#0ea5e9",
                fill_opacity: 0.25,
                line_color: "#0369a1",
                line_width: 1.5,
            },
        ),
    );
    layers.insert(
        LayerId::Buildings,
        def(
            LayerId::Buildings,
            "Buildings",
            12,
            22,
            LayerPaint {
                fill_color: "#f97316",
                fill_opacity: 0.3,
                line_color: "#c2410c",
                line_width: 1.5,
            },
        ),
    );
    layers.insert(
        LayerId::Greenhouses,
        def(
            LayerId::Greenhouses,
            "Greenhouses",
            12,
            22,
            LayerPaint {
                fill_color: "#a855f7",
                fill_opacity: 0.35,
                line_color: "#7c3aed",
                line_width: 1.5,
            },
        ),
    );
    layers.insert(
        LayerId::GreenhouseAreas,
        def(
            LayerId::GreenhouseAreas,
            "Greenhouse Areas",
            14,
            22,
            LayerPaint {
                fill_color: "#facc15",
                fill_opacity: 0.25,
                line_color: "#d97706",
                line_width: 1.2,
            },
        ),
    );
    layers
}

#[cfg(test)]
mod tests {
    use super::{GeometryType, LayerId, required_fields};
    use crate::{Registry, RegistryConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn layer_ids_round_trip_as_strings() {
        for id in LayerId::ALL {
            assert_eq!(id.as_str().parse::<LayerId>(), Ok(id));
        }
        assert!("orchards".parse::<LayerId>().is_err());
    }

    #[test]
    fn multipolygon_widens_polygon() {
        assert!(GeometryType::MultiPolygon.accepts("MultiPolygon"));
        assert!(GeometryType::MultiPolygon.accepts("Polygon"));
        assert!(!GeometryType::MultiPolygon.accepts("LineString"));
        assert!(GeometryType::Polygon.accepts("Polygon"));
        assert!(!GeometryType::Polygon.accepts("MultiPolygon"));
    }

    #[test]
    fn required_fields_match_layer_rules() {
        assert_eq!(required_fields(LayerId::Farms), &["name"]);
        assert_eq!(required_fields(LayerId::Buildings), &["btype"]);
        assert_eq!(required_fields(LayerId::GreenhouseAreas), &["use_type"]);
        assert!(required_fields(LayerId::Fields).is_empty());
    }

    #[test]
    fn endpoints_are_templated_on_config() {
        let registry = Registry::new(&RegistryConfig {
            featureserv_base: "https://features.example".to_string(),
            tileserv_base: "https://tiles.example".to_string(),
        });
        let farms = registry.layer(LayerId::Farms);
        assert_eq!(
            farms.feature_collection_path,
            "https://features.example/collections/farms/items"
        );
        assert_eq!(
            farms.tiles_path_template,
            "https://tiles.example/public.farms/{z}/{x}/{y}.pbf"
        );
        assert_eq!(farms.rpc_upsert, "farms_upsert");
        assert!(farms.visible_at_zoom(10.0));
        assert!(!farms.visible_at_zoom(2.0));
    }
}
