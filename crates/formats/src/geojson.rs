//! Typed GeoJSON feature model.
//!
//! Only the shapes the console actually exchanges are modelled: features with
//! Polygon/MultiPolygon geometries and a flat property map carrying the
//! stable `id` and the tenant `org_id`. Other geometry types still
//! round-trip so foreign collections deserialize without loss of the
//! positions we care about.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON position: `[lng, lat]`, optionally with altitude.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Visits every position in the geometry, including nested collections.
    pub fn for_each_position(&self, visit: &mut impl FnMut(&Position)) {
        match self {
            Geometry::Point { coordinates } => visit(coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().for_each(|p| visit(p))
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().for_each(|p| visit(p))
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| visit(p)),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().for_each(|g| g.for_each_position(visit))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureTag {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CollectionTag {
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry),
            properties: Some(properties),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }

    fn string_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(Value::as_str)
    }

    /// Stable feature identity, preferring the `id` property over the
    /// top-level member (the feature services key rows by the property).
    pub fn feature_id(&self) -> Option<&str> {
        self.string_property("id")
            .or_else(|| self.id.as_ref().and_then(Value::as_str))
    }

    pub fn org_id(&self) -> Option<&str> {
        self.string_property("org_id")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    tag: CollectionTag,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Corner bounds `((min_lng, min_lat), (max_lng, max_lat))` over every
    /// position in the collection, or `None` when no finite position exists.
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);

        for feature in &self.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            geometry.for_each_position(&mut |position| {
                let (Some(&lng), Some(&lat)) = (position.first(), position.get(1)) else {
                    return;
                };
                if !lng.is_finite() || !lat.is_finite() {
                    return;
                }
                min.0 = min.0.min(lng);
                min.1 = min.1.min(lat);
                max.0 = max.0.max(lng);
                max.1 = max.1.max(lat);
            });
        }

        if min.0.is_finite() && min.1.is_finite() && max.0.is_finite() && max.1.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Feature, FeatureCollection, Geometry};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    fn polygon(ring: Vec<Vec<f64>>) -> Geometry {
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }

    fn props(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn feature_round_trips_through_json() {
        let feature = Feature::new(
            polygon(vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0],
            ]),
            props(&[("id", "f-1"), ("org_id", "org-1"), ("name", "North field")]),
        );

        let encoded = serde_json::to_value(&feature).expect("serialize");
        assert_eq!(encoded["type"], "Feature");
        assert_eq!(encoded["geometry"]["type"], "Polygon");

        let decoded: Feature = serde_json::from_value(encoded).expect("deserialize");
        assert_eq!(decoded, feature);
        assert_eq!(decoded.feature_id(), Some("f-1"));
        assert_eq!(decoded.org_id(), Some("org-1"));
    }

    #[test]
    fn deserializes_null_properties() {
        let decoded: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
            "properties": null
        }))
        .expect("deserialize");
        assert!(decoded.org_id().is_none());
    }

    #[test]
    fn collection_bounds_cover_nested_geometries() {
        let collection = FeatureCollection::new(vec![
            Feature::new(
                polygon(vec![vec![-3.0, 1.0], vec![0.0, 1.0], vec![0.0, 4.0], vec![-3.0, 1.0]]),
                Map::new(),
            ),
            Feature::new(
                Geometry::MultiPolygon {
                    coordinates: vec![vec![vec![
                        vec![5.0, -2.0],
                        vec![6.0, -2.0],
                        vec![6.0, 0.0],
                        vec![5.0, -2.0],
                    ]]],
                },
                Map::new(),
            ),
        ]);

        assert_eq!(collection.bounds(), Some(((-3.0, -2.0), (6.0, 4.0))));
    }

    #[test]
    fn empty_collection_has_no_bounds() {
        assert_eq!(FeatureCollection::empty().bounds(), None);
    }
}
