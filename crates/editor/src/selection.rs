use formats::Feature;
use serde_json::{Map, Value};

/// The currently selected feature plus its attribute-edit buffer.
///
/// Merge precedence for the outgoing property map, lowest first:
/// the feature's existing properties, the locally edited fields, the active
/// organization id override.
#[derive(Debug, Default)]
pub struct Selection {
    selected: Option<Feature>,
    edits: Map<String, Value>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&Feature> {
        self.selected.as_ref()
    }

    pub fn edits(&self) -> &Map<String, Value> {
        &self.edits
    }

    pub fn select(&mut self, feature: Feature) {
        self.edits = feature.properties.clone().unwrap_or_default();
        self.selected = Some(feature);
    }

    /// Active-layer change: selection and buffer are dropped together.
    pub fn clear(&mut self) {
        self.selected = None;
        self.edits.clear();
    }

    /// Replaces the edit buffer with attribute-panel input.
    pub fn set_edits(&mut self, edits: Map<String, Value>) {
        self.edits = edits;
    }

    /// The property map submitted on save. `base` is the save candidate's
    /// own property map, which is the selected feature's when one exists and
    /// the first drawn feature's otherwise.
    pub fn merged_properties(
        &self,
        base: Option<&Map<String, Value>>,
        org_id: &str,
    ) -> Map<String, Value> {
        let mut merged = base.cloned().unwrap_or_default();
        for (key, value) in &self.edits {
            merged.insert(key.clone(), value.clone());
        }
        merged.insert("org_id".to_string(), Value::String(org_id.to_string()));
        merged
    }

    /// Adopts the server-echoed feature after a successful save.
    pub fn adopt_saved(&mut self, feature: Feature) {
        self.edits = feature.properties.clone().unwrap_or_default();
        self.selected = Some(feature);
    }
}

#[cfg(test)]
mod tests {
    use formats::{Feature, Geometry};
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    use super::Selection;

    fn feature_with(props: Value) -> Feature {
        Feature::new(
            Geometry::Polygon {
                coordinates: vec![vec![
                    vec![0.0, 0.0],
                    vec![1.0, 0.0],
                    vec![1.0, 1.0],
                    vec![0.0, 0.0],
                ]],
            },
            props.as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn merge_precedence_is_props_then_edits_then_org() {
        let mut selection = Selection::new();
        selection.select(feature_with(json!({
            "id": "f-1",
            "name": "Old name",
            "org_id": "stale-org"
        })));

        let mut edits = Map::new();
        edits.insert("name".to_string(), Value::String("New name".to_string()));
        selection.set_edits(edits);

        let base = selection.selected().and_then(|f| f.properties.clone());
        let merged = selection.merged_properties(base.as_ref(), "org-active");
        assert_eq!(merged["id"], "f-1");
        assert_eq!(merged["name"], "New name");
        assert_eq!(merged["org_id"], "org-active");
    }

    #[test]
    fn drawn_candidate_properties_seed_the_merge_without_a_selection() {
        let mut selection = Selection::new();
        let mut edits = Map::new();
        edits.insert("name".to_string(), Value::String("New farm".to_string()));
        selection.set_edits(edits);

        let drawn = feature_with(json!({ "btype": "barn" }));
        let merged = selection.merged_properties(drawn.properties.as_ref(), "org-active");
        assert_eq!(merged["btype"], "barn");
        assert_eq!(merged["name"], "New farm");
        assert_eq!(merged["org_id"], "org-active");
    }

    #[test]
    fn adopting_a_saved_feature_resets_the_buffer() {
        let mut selection = Selection::new();
        selection.select(feature_with(json!({ "name": "Draft" })));

        let saved = feature_with(json!({ "id": "f-9", "name": "Saved" }));
        selection.adopt_saved(saved.clone());

        assert_eq!(selection.selected(), Some(&saved));
        assert_eq!(selection.edits()["name"], "Saved");
    }

    #[test]
    fn clear_drops_selection_and_buffer() {
        let mut selection = Selection::new();
        selection.select(feature_with(json!({ "name": "Draft" })));
        selection.clear();
        assert!(selection.selected().is_none());
        assert!(selection.edits().is_empty());
    }
}
