//! Persistence of feature edits behind a `dyn`-compatible trait.
//!
//! The HTTP implementation calls the write API's RPC routes, one upsert
//! and one delete function per layer, as named in the layer definition.

use std::error::Error;
use std::fmt;

use catalog::LayerDefinition;
use editor::WritePayload;
use formats::{decode_error_body, Feature};
use serde_json::json;
use viewsync::source::BoxFuture;

#[derive(Clone, Debug)]
pub struct WriteError {
    /// HTTP status when the upstream answered; `None` for transport failures.
    pub status: Option<u16>,
    /// Stable error code from the response envelope, when present.
    pub code: Option<String>,
    pub message: String,
}

impl WriteError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, self.status) {
            (Some(code), _) => write!(f, "{} ({})", self.message, code),
            (None, Some(status)) => write!(f, "{} (status {})", self.message, status),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl Error for WriteError {}

/// Sink for feature writes.
pub trait FeatureWriter: Send + Sync {
    /// Creates or updates a feature. Returns the upstream echo of the saved
    /// row when the API provides one.
    fn upsert(
        &self,
        layer: &LayerDefinition,
        payload: &WritePayload,
    ) -> BoxFuture<'_, Result<Option<Feature>, WriteError>>;

    /// Removes a feature by id, scoped to the owning organization.
    fn delete(
        &self,
        layer: &LayerDefinition,
        feature_id: &str,
        org_id: &str,
    ) -> BoxFuture<'_, Result<(), WriteError>>;
}

/// HTTP feature writer targeting `POST {base}/rpc/{function}`.
pub struct HttpFeatureWriter {
    base_url: String,
    client: reqwest::Client,
    api_key: Option<String>,
}

impl HttpFeatureWriter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{}", self.base_url.trim_end_matches('/'), function)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-geo-key", key),
            None => request,
        }
    }

    async fn send_rpc(
        &self,
        function: &str,
        body: serde_json::Value,
    ) -> Result<String, WriteError> {
        let url = self.rpc_url(function);
        tracing::debug!(%url, "dispatching write rpc");
        let response = self
            .authed(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| WriteError::transport(format!("write request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let status_line = format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            );
            let (code, message) = decode_error_body(&text, &status_line);
            return Err(WriteError {
                status: Some(status.as_u16()),
                code,
                message,
            });
        }
        Ok(text)
    }
}

impl FeatureWriter for HttpFeatureWriter {
    fn upsert(
        &self,
        layer: &LayerDefinition,
        payload: &WritePayload,
    ) -> BoxFuture<'_, Result<Option<Feature>, WriteError>> {
        let function = layer.rpc_upsert;
        let body = serde_json::to_value(payload).unwrap_or_else(|_| json!({}));
        Box::pin(async move {
            let text = self.send_rpc(function, body).await?;
            // The upsert functions echo the saved feature; older deployments
            // return an empty body.
            Ok(serde_json::from_str::<Feature>(&text).ok())
        })
    }

    fn delete(
        &self,
        layer: &LayerDefinition,
        feature_id: &str,
        org_id: &str,
    ) -> BoxFuture<'_, Result<(), WriteError>> {
        let function = layer.rpc_delete;
        let body = json!({ "id": feature_id, "org_id": org_id });
        Box::pin(async move {
            self.send_rpc(function, body).await?;
            Ok(())
        })
    }
}
