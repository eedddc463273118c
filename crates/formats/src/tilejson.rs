use serde::{Deserialize, Serialize};

fn default_tile_size() -> u32 {
    256
}

/// TileJSON descriptor for a raster (or vector) tile source.
///
/// Only the members the console consumes are modelled; the descriptor route
/// serves `tileSize` alongside the standard TileJSON fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileJson {
    pub tiles: Vec<String>,
    #[serde(rename = "tileSize", default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
}

impl TileJson {
    /// A descriptor with no tile templates cannot back a map source.
    pub fn is_usable(&self) -> bool {
        !self.tiles.is_empty()
    }
}
