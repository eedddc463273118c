//! Static registries for the console's map content:
//! - the five editable vector layers (geometry types, tile/feature endpoints,
//!   RPC names, zoom ranges, paint);
//! - the optional raster overlays and their descriptor routes;
//! - the error-code → user-facing message table.

pub mod layers;
pub mod messages;
pub mod rasters;

pub use layers::*;
pub use messages::*;
pub use rasters::*;

use std::collections::BTreeMap;
use std::env;

/// Upstream service endpoints the registries are templated on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Feature server base, e.g. `https://features.internal`.
    pub featureserv_base: String,
    /// Vector tile server base, e.g. `https://tiles.internal`.
    pub tileserv_base: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            featureserv_base: "http://127.0.0.1:9000".to_string(),
            tileserv_base: "http://127.0.0.1:9001".to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            featureserv_base: env::var("FEATURESERV_BASE")
                .unwrap_or(defaults.featureserv_base),
            tileserv_base: env::var("TILESERV_BASE").unwrap_or(defaults.tileserv_base),
        }
    }
}

/// Immutable registry of everything the map can show.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    layers: BTreeMap<LayerId, LayerDefinition>,
    rasters: BTreeMap<RasterId, RasterDefinition>,
}

impl Registry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            layers: layers::build_vector_layers(config),
            rasters: rasters::build_rasters(),
        }
    }

    pub fn layer(&self, id: LayerId) -> &LayerDefinition {
        &self.layers[&id]
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerDefinition> {
        self.layers.values()
    }

    pub fn raster(&self, id: RasterId) -> &RasterDefinition {
        &self.rasters[&id]
    }

    pub fn rasters(&self) -> impl Iterator<Item = &RasterDefinition> {
        self.rasters.values()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(&RegistryConfig::default())
    }
}

/// Clamps a requested page limit to `(0, max]`, defaulting to `max` for
/// missing or non-positive requests.
pub fn clamp_page_limit(requested: Option<i64>, max: u32) -> u32 {
    match requested {
        Some(n) if n > 0 => (n as u64).min(max as u64) as u32,
        _ => max,
    }
}
