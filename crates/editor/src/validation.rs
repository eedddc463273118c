use std::fmt;

use catalog::{LayerDefinition, required_fields};
use formats::{Feature, Geometry};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Client-side validation failures, raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Geometry type does not match the layer's declared type (Polygon is
    /// accepted where MultiPolygon is declared).
    GeomInvalid {
        declared: &'static str,
        supplied: &'static str,
    },
    /// A required attribute is missing or empty, or `org_id` is absent or
    /// not a UUID.
    ValidationFailed { detail: String },
}

impl ValidationError {
    /// The application error code, matching the server-side taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::GeomInvalid { .. } => "GEOM_INVALID",
            ValidationError::ValidationFailed { .. } => "VALIDATION_FAILED",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::GeomInvalid { declared, supplied } => {
                write!(f, "geometry type {supplied} not accepted by layer declaring {declared}")
            }
            ValidationError::ValidationFailed { detail } => write!(f, "{detail}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// The body submitted to the write route: the feature itself plus the flat
/// property map the upsert RPC consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WritePayload {
    pub feature: Feature,
    pub properties: Map<String, Value>,
}

/// Validates a candidate feature against the layer's schema and assembles
/// the write payload. Fails fast with a named code; nothing here touches the
/// network.
pub fn validate_feature_payload(
    layer: &LayerDefinition,
    geometry: &Geometry,
    properties: &Map<String, Value>,
) -> Result<WritePayload, ValidationError> {
    let supplied = geometry.type_name();
    if !layer.geom_type.accepts(supplied) {
        return Err(ValidationError::GeomInvalid {
            declared: layer.geom_type.as_str(),
            supplied,
        });
    }

    for field in required_fields(layer.id) {
        if !is_present(properties.get(*field)) {
            return Err(ValidationError::ValidationFailed {
                detail: format!("required field {field} is missing or empty"),
            });
        }
    }

    let org_id = properties
        .get("org_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::ValidationFailed {
            detail: "org_id is required".to_string(),
        })?;
    Uuid::parse_str(org_id).map_err(|_| ValidationError::ValidationFailed {
        detail: "org_id must be a UUID".to_string(),
    })?;

    Ok(WritePayload {
        feature: Feature::new(geometry.clone(), properties.clone()),
        properties: properties.clone(),
    })
}

/// Required fields follow the original truthiness rule: absent, null, empty
/// string, `false`, and `0` all count as missing.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
