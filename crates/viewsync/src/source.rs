//! Feature retrieval behind a `dyn`-compatible trait.
//!
//! The HTTP implementation talks to a pg_featureserv-style collection API:
//! `GET {base}/collections/{layer}/items?org_id=&bbox=&bbox-crs=&limit=`.

use std::future::Future;
use std::pin::Pin;

use catalog::LayerId;
use formats::{Feature, FeatureCollection, decode_error_body};
use serde_json::json;

use crate::error::FetchError;
use crate::key::FeatureRequestKey;

/// Boxed future that can be sent between tasks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of feature collections for the visible viewport.
///
/// Implementations must be `Send + Sync`; methods return boxed futures for
/// dyn-compatibility.
pub trait FeatureSource: Send + Sync {
    /// Fetches the bounded page of features the key describes.
    fn fetch_collection(
        &self,
        key: &FeatureRequestKey,
    ) -> BoxFuture<'_, Result<FeatureCollection, FetchError>>;

    /// Detail lookup for a single feature by its stable id.
    fn fetch_by_id(
        &self,
        layer: LayerId,
        org_id: &str,
        feature_id: &str,
    ) -> BoxFuture<'_, Result<Option<Feature>, FetchError>>;
}

/// HTTP feature source.
pub struct HttpFeatureSource {
    base_url: String,
    client: reqwest::Client,
    geo_api_key: Option<String>,
}

impl HttpFeatureSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            geo_api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.geo_api_key = Some(key.into());
        self
    }

    fn items_url(&self, layer: LayerId) -> String {
        format!(
            "{}/collections/{}/items",
            self.base_url.trim_end_matches('/'),
            layer
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.geo_api_key {
            Some(key) => request.header("x-geo-key", key),
            None => request,
        }
    }

    async fn read_collection(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<FeatureCollection, FetchError> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| FetchError::transport("feature request failed", e))?;

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
            .json::<FeatureCollection>()
            .await
            .map_err(|e| FetchError::transport("feature decode failed", e))
    }
}

impl FeatureSource for HttpFeatureSource {
    fn fetch_collection(
        &self,
        key: &FeatureRequestKey,
    ) -> BoxFuture<'_, Result<FeatureCollection, FetchError>> {
        let url = format!("{}?{}", self.items_url(key.layer), key.query_string());
        Box::pin(async move {
            tracing::debug!(%url, "fetching feature collection");
            self.read_collection(self.client.get(&url)).await
        })
    }

    fn fetch_by_id(
        &self,
        layer: LayerId,
        org_id: &str,
        feature_id: &str,
    ) -> BoxFuture<'_, Result<Option<Feature>, FetchError>> {
        let url = self.items_url(layer);
        let filter = json!({ "id": feature_id }).to_string();
        let org_id = org_id.to_string();
        Box::pin(async move {
            let request = self.client.get(&url).query(&[
                ("org_id", org_id.as_str()),
                ("filter", filter.as_str()),
                ("limit", "1"),
            ]);
            let mut collection = self.read_collection(request).await?;
            Ok(if collection.features.is_empty() {
                None
            } else {
                Some(collection.features.remove(0))
            })
        })
    }
}
