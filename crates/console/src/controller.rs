//! Session controller for the editable vector map.
//!
//! One controller per map session. It owns the planner, driver, draw
//! surface, and selection, and exposes three entry points to the
//! embedding's event loop: `viewport_changed`/`poll_coalesced` on camera
//! movement and ticks, `handle_outcome` for results from the driver's
//! receiver, and `handle_command` for UI commands.

use std::sync::Arc;

use catalog::{user_message, LayerDefinition, LayerId, Registry};
use editor::{validate_feature_payload, DrawSurface, ReconcilePolicy, Selection};
use formats::Feature;
use foundation::ViewportBounds;
use tokio::sync::mpsc;
use viewsync::{FetchDriver, FetchOutcome, FetchPlan, FetchPolicy, FeatureSource, RequestPlanner};

use crate::commands::{DrawMode, MapCommand};
use crate::notices::{NoticeBus, NoticeLevel};
use crate::writer::FeatureWriter;

pub struct MapController {
    registry: Registry,
    planner: RequestPlanner,
    driver: FetchDriver,
    source: Arc<dyn FeatureSource>,
    surface: DrawSurface,
    selection: Selection,
    writer: Arc<dyn FeatureWriter>,
    notices: NoticeBus,
    draw_mode: DrawMode,
    active_layer: Option<LayerId>,
    active_org: Option<String>,
    last_viewport: Option<ViewportBounds>,
}

impl MapController {
    /// Builds a controller and hands back the outcome receiver the
    /// embedding must pump into [`MapController::handle_outcome`].
    pub fn new(
        source: Arc<dyn FeatureSource>,
        writer: Arc<dyn FeatureWriter>,
        registry: Registry,
        policy: FetchPolicy,
        reconcile: ReconcilePolicy,
    ) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (driver, outcomes) = FetchDriver::new(source.clone());
        let controller = Self {
            registry,
            planner: RequestPlanner::new(policy),
            driver,
            source,
            surface: DrawSurface::new(reconcile),
            selection: Selection::new(),
            writer,
            notices: NoticeBus::new(),
            draw_mode: DrawMode::default(),
            active_layer: None,
            active_org: None,
            last_viewport: None,
        };
        (controller, outcomes)
    }

    pub fn surface(&self) -> &DrawSurface {
        &self.surface
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.active_layer
    }

    pub fn active_org(&self) -> Option<&str> {
        self.active_org.as_deref()
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn drain_notices(&mut self) -> Vec<crate::notices::Notice> {
        self.notices.drain()
    }

    /// Switches the editable layer. Edits in progress are discarded and
    /// the surface reloads for the new layer at the last viewport.
    pub fn set_active_layer(&mut self, layer: Option<LayerId>) {
        if self.active_layer == layer {
            return;
        }
        self.active_layer = layer;
        self.selection.clear();
        self.surface.clear();
        self.force_refetch();
    }

    /// Switches the active organization, clearing all tenant-scoped state.
    pub fn set_active_org(&mut self, org: Option<&str>) {
        if self.active_org.as_deref() == org {
            return;
        }
        self.active_org = org.map(str::to_string);
        self.selection.clear();
        self.surface.clear();
        self.force_refetch();
    }

    /// Called when the camera settles. Returns the plan so the embedding
    /// can schedule its next [`MapController::poll_coalesced`] tick.
    pub fn viewport_changed(&mut self, bounds: ViewportBounds, now_ms: u64) -> FetchPlan {
        self.last_viewport = Some(bounds);
        self.planner
            .offer(self.active_layer, self.active_org.as_deref(), &bounds, now_ms)
    }

    /// Releases the coalesced key once its window has closed and puts the
    /// fetch in flight. Safe to call every tick.
    pub fn poll_coalesced(&mut self, now_ms: u64) {
        if let Some(key) = self.planner.poll(now_ms) {
            self.driver.dispatch(key);
        }
    }

    /// Applies one fetch outcome. Stale generations are dropped; errors
    /// become notices. Returns whether the surface was updated.
    pub fn handle_outcome(&mut self, outcome: FetchOutcome) -> bool {
        if !self.driver.is_current(&outcome) {
            tracing::debug!(
                generation = outcome.generation,
                "dropping superseded fetch outcome"
            );
            return false;
        }
        match outcome.result {
            Ok(collection) => self.surface.apply_collection(collection),
            Err(err) => {
                tracing::warn!(error = %err, "viewport fetch failed");
                self.notices
                    .emit(NoticeLevel::Error, format!("Could not load features: {err}"));
                false
            }
        }
    }

    /// Registers a feature drawn on the surface and selects it for editing.
    pub fn feature_drawn(&mut self, feature: Feature) {
        self.selection.select(feature.clone());
        self.surface.insert(feature);
    }

    /// Selects a feature by id, preferring the surface copy and falling
    /// back to a detail lookup against the feature service for features
    /// outside the fetched page.
    pub async fn select_feature(&mut self, feature_id: &str) -> bool {
        if let Some(feature) = self.surface.find(feature_id).cloned() {
            self.selection.select(feature);
            return true;
        }
        let (Some(layer), Some(org)) = (self.active_layer, self.active_org.clone()) else {
            return false;
        };
        match self.source.fetch_by_id(layer, &org, feature_id).await {
            Ok(Some(feature)) => {
                self.selection.select(feature);
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "feature detail lookup failed");
                self.notices
                    .emit(NoticeLevel::Error, format!("Could not load feature: {err}"));
                false
            }
        }
    }

    pub async fn handle_command(&mut self, command: MapCommand) {
        match command {
            MapCommand::StartDraw(mode) => {
                self.draw_mode = mode;
            }
            MapCommand::UpdateAttributes(edits) => {
                self.selection.set_edits(edits);
                self.surface.mark_dirty();
            }
            MapCommand::Save => self.save_selected().await,
            MapCommand::DeleteSelection => self.delete_selected().await,
            MapCommand::CancelEdits => {
                self.selection.clear();
                self.surface.clear();
                self.force_refetch();
            }
        }
    }

    async fn save_selected(&mut self) {
        let (Some(layer_id), Some(org)) = (self.active_layer, self.active_org.clone()) else {
            self.notices
                .emit(NoticeLevel::Error, "Select an organization and layer.");
            return;
        };
        let Some(candidate) = self
            .selection
            .selected()
            .cloned()
            .or_else(|| self.surface.first().cloned())
        else {
            self.notices
                .emit(NoticeLevel::Info, "Draw or select a feature to save.");
            return;
        };
        let Some(geometry) = candidate.geometry.clone() else {
            self.notices
                .emit(NoticeLevel::Error, "Selected feature has no geometry.");
            return;
        };

        let properties = self
            .selection
            .merged_properties(candidate.properties.as_ref(), &org);

        let layer: LayerDefinition = self.registry.layer(layer_id).clone();
        let payload = match validate_feature_payload(&layer, &geometry, &properties) {
            Ok(payload) => payload,
            Err(err) => {
                let message = user_message(err.code())
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                self.notices.emit(NoticeLevel::Error, message);
                return;
            }
        };

        match self.writer.upsert(&layer, &payload).await {
            Ok(echo) => {
                let saved = echo.unwrap_or(payload.feature);
                tracing::info!(layer = %layer_id, id = ?saved.feature_id(), "feature saved");
                self.notices.emit(NoticeLevel::Success, "Feature saved");
                self.selection.adopt_saved(saved);
                self.surface.set_clean();
                self.surface.resolve_deferred();
                self.force_refetch();
            }
            Err(err) => {
                let message = err
                    .code
                    .as_deref()
                    .and_then(user_message)
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                tracing::warn!(layer = %layer_id, error = %err, "feature save failed");
                self.notices.emit(NoticeLevel::Error, message);
            }
        }
    }

    async fn delete_selected(&mut self) {
        let (Some(layer_id), Some(org)) = (self.active_layer, self.active_org.clone()) else {
            self.notices
                .emit(NoticeLevel::Error, "Select an organization and layer.");
            return;
        };
        let Some(feature_id) = self
            .selection
            .selected()
            .and_then(Feature::feature_id)
            .map(str::to_string)
        else {
            self.notices
                .emit(NoticeLevel::Info, "Select a feature to delete.");
            return;
        };

        let layer: LayerDefinition = self.registry.layer(layer_id).clone();
        match self.writer.delete(&layer, &feature_id, &org).await {
            Ok(()) => {
                tracing::info!(layer = %layer_id, id = %feature_id, "feature deleted");
                self.notices.emit(NoticeLevel::Success, "Feature deleted");
                self.selection.clear();
                self.surface.set_clean();
                self.force_refetch();
            }
            Err(err) => {
                let message = err
                    .code
                    .as_deref()
                    .and_then(user_message)
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                self.notices.emit(NoticeLevel::Error, message);
            }
        }
    }

    /// Busts the planner's current key and re-issues the last viewport
    /// immediately, bypassing the coalescing window.
    fn force_refetch(&mut self) {
        self.planner.invalidate();
        let Some(bounds) = self.last_viewport else {
            return;
        };
        if let FetchPlan::Skip(_) =
            self.planner
                .offer(self.active_layer, self.active_org.as_deref(), &bounds, 0)
        {
            return;
        }
        if let Some(key) = self.planner.flush() {
            self.driver.dispatch(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::RegistryConfig;
    use editor::WritePayload;
    use formats::FeatureCollection;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value};
    use viewsync::error::FetchError;
    use viewsync::key::FeatureRequestKey;
    use viewsync::source::BoxFuture;

    struct EmptySource;

    impl FeatureSource for EmptySource {
        fn fetch_collection(
            &self,
            _key: &FeatureRequestKey,
        ) -> BoxFuture<'_, Result<FeatureCollection, FetchError>> {
            Box::pin(async { Ok(FeatureCollection::empty()) })
        }

        fn fetch_by_id(
            &self,
            _layer: LayerId,
            _org_id: &str,
            _feature_id: &str,
        ) -> BoxFuture<'_, Result<Option<Feature>, FetchError>> {
            Box::pin(async { Ok(None) })
        }
    }

    struct RejectingWriter;

    impl FeatureWriter for RejectingWriter {
        fn upsert(
            &self,
            _layer: &LayerDefinition,
            _payload: &WritePayload,
        ) -> BoxFuture<'_, Result<Option<Feature>, crate::writer::WriteError>> {
            Box::pin(async {
                Err(crate::writer::WriteError {
                    status: Some(403),
                    code: Some("RLS_DENIED".to_string()),
                    message: "permission denied".to_string(),
                })
            })
        }

        fn delete(
            &self,
            _layer: &LayerDefinition,
            _feature_id: &str,
            _org_id: &str,
        ) -> BoxFuture<'_, Result<(), crate::writer::WriteError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn controller() -> MapController {
        let registry = Registry::new(&RegistryConfig::default());
        let (controller, _outcomes) = MapController::new(
            Arc::new(EmptySource),
            Arc::new(RejectingWriter),
            registry,
            FetchPolicy::default(),
            ReconcilePolicy::ServerAuthoritative,
        );
        controller
    }

    #[tokio::test]
    async fn save_without_context_emits_error_notice() {
        let mut ctl = controller();
        ctl.handle_command(MapCommand::Save).await;
        let notices = ctl.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Select an organization and layer.");
    }

    #[tokio::test]
    async fn save_with_nothing_drawn_emits_info_notice() {
        let mut ctl = controller();
        ctl.set_active_org(Some("0d7e3c9a-52cb-4b0f-9a3e-0f6a4f9b2c11"));
        ctl.set_active_layer(Some(LayerId::Farms));
        ctl.handle_command(MapCommand::Save).await;
        let notices = ctl.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert_eq!(notices[0].message, "Draw or select a feature to save.");
    }

    #[tokio::test]
    async fn upstream_denial_maps_to_user_message() {
        let mut ctl = controller();
        ctl.set_active_org(Some("0d7e3c9a-52cb-4b0f-9a3e-0f6a4f9b2c11"));
        ctl.set_active_layer(Some(LayerId::Farms));

        let geometry: formats::Geometry = serde_json::from_value(serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }))
        .unwrap();
        let mut props = Map::new();
        props.insert("name".to_string(), Value::String("North farm".to_string()));
        ctl.feature_drawn(Feature::new(geometry, props));

        ctl.handle_command(MapCommand::Save).await;
        let notices = ctl.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(
            notices[0].message,
            "You don't have permission to modify this organization's data."
        );
    }

    #[tokio::test]
    async fn invalid_geometry_never_reaches_the_writer() {
        let mut ctl = controller();
        ctl.set_active_org(Some("0d7e3c9a-52cb-4b0f-9a3e-0f6a4f9b2c11"));
        ctl.set_active_layer(Some(LayerId::Fields));

        let geometry: formats::Geometry = serde_json::from_value(serde_json::json!({
            "type": "LineString",
            "coordinates": [[0.0, 0.0], [1.0, 1.0]]
        }))
        .unwrap();
        ctl.feature_drawn(Feature::new(geometry, Map::new()));

        ctl.handle_command(MapCommand::Save).await;
        let notices = ctl.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Invalid geometry.");
    }

    #[tokio::test]
    async fn cancel_edits_clears_selection_and_surface() {
        let mut ctl = controller();
        ctl.set_active_org(Some("0d7e3c9a-52cb-4b0f-9a3e-0f6a4f9b2c11"));
        ctl.set_active_layer(Some(LayerId::Farms));
        let geometry: formats::Geometry = serde_json::from_value(serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }))
        .unwrap();
        ctl.feature_drawn(Feature::new(geometry, Map::new()));
        assert!(!ctl.surface().is_empty());

        ctl.handle_command(MapCommand::CancelEdits).await;
        assert!(ctl.surface().is_empty());
        assert!(ctl.selection().selected().is_none());
    }
}
