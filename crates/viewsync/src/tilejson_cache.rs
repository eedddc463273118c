//! Memoized raster descriptors.
//!
//! TileJSON fetches are keyed by (raster id, organization id) so repeated
//! visibility toggles for the same organization hit the cache, while an
//! organization switch invalidates every entry of the departing tenant.

use catalog::RasterId;
use dashmap::DashMap;
use formats::{TileJson, decode_error_body};

use crate::error::FetchError;
use crate::source::BoxFuture;

/// Source of TileJSON descriptors, scoped by organization.
pub trait DescriptorSource: Send + Sync {
    fn fetch_tilejson(
        &self,
        raster: RasterId,
        org_id: &str,
    ) -> BoxFuture<'_, Result<TileJson, FetchError>>;
}

/// HTTP descriptor source hitting the console's raster routes.
pub struct HttpDescriptorSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDescriptorSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl DescriptorSource for HttpDescriptorSource {
    fn fetch_tilejson(
        &self,
        raster: RasterId,
        org_id: &str,
    ) -> BoxFuture<'_, Result<TileJson, FetchError>> {
        let url = format!(
            "{}/api/rasters/{}/tilejson?org_id={}",
            self.base_url.trim_end_matches('/'),
            raster,
            org_id
        );
        Box::pin(async move {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::transport("tilejson request failed", e))?;

            let status = response.status();
            if !status.is_success() {
                let status_line = format!(
                    "{} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("error")
                );
                let body = response.text().await.unwrap_or_default();
                let (code, message) = decode_error_body(&body, &status_line);
                return Err(FetchError::Upstream {
                    status: status.as_u16(),
                    code,
                    message,
                });
            }

            response
                .json::<TileJson>()
                .await
                .map_err(|e| FetchError::transport("tilejson decode failed", e))
        })
    }
}

/// Process-wide descriptor cache, shared across toggle events.
#[derive(Debug, Default)]
pub struct TileJsonCache {
    entries: DashMap<(RasterId, String), TileJson>,
}

impl TileJsonCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, raster: RasterId, org_id: &str) -> bool {
        self.entries.contains_key(&(raster, org_id.to_string()))
    }

    /// Returns the cached descriptor or fetches and memoizes it. Descriptors
    /// with an empty tile list are treated as unavailable and never cached.
    pub async fn get_or_fetch(
        &self,
        source: &dyn DescriptorSource,
        raster: RasterId,
        org_id: &str,
    ) -> Result<TileJson, FetchError> {
        if let Some(hit) = self.entries.get(&(raster, org_id.to_string())) {
            return Ok(hit.clone());
        }

        let descriptor = source.fetch_tilejson(raster, org_id).await?;
        if !descriptor.is_usable() {
            return Err(FetchError::Unavailable {
                message: format!("raster {raster} has no tiles for this organization"),
            });
        }

        self.entries
            .insert((raster, org_id.to_string()), descriptor.clone());
        Ok(descriptor)
    }

    pub fn remove(&self, raster: RasterId, org_id: &str) {
        self.entries.remove(&(raster, org_id.to_string()));
    }

    /// Drops every entry belonging to `org_id` (organization switch).
    pub fn purge_org(&self, org_id: &str) {
        self.entries.retain(|(_, entry_org), _| entry_org != org_id);
    }
}
