use crate::bbox::{BboxTuple, LngLat};

/// Map viewport at a pan/zoom settle point.
///
/// Ephemeral: owned by the map surface and recomputed on every settle event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportBounds {
    pub south_west: LngLat,
    pub north_east: LngLat,
    pub zoom: f64,
}

impl ViewportBounds {
    pub fn new(south_west: LngLat, north_east: LngLat, zoom: f64) -> Self {
        Self {
            south_west,
            north_east,
            zoom,
        }
    }

    /// Builds a viewport from a `(west, south, east, north)` tuple.
    pub fn from_tuple(west: f64, south: f64, east: f64, north: f64, zoom: f64) -> Self {
        Self::new(LngLat::new(west, south), LngLat::new(east, north), zoom)
    }

    pub fn bbox(&self) -> BboxTuple {
        BboxTuple::from_corners(self.south_west, self.north_east)
    }
}
