//! Canonical bounding-box representation and its query-string codec.
//!
//! Upstream feature services take a `bbox` query parameter of exactly four
//! comma-joined coordinates at fixed 6-decimal precision. The codec performs
//! no range validation: malformed corners propagate whatever values are
//! present, and `min <= max` is the caller's obligation.

/// Geographic position in decimal degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// `[min_x, min_y, max_x, max_y]` in decimal degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BboxTuple {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BboxTuple {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Builds a bbox from south-west / north-east corners.
    pub fn from_corners(south_west: LngLat, north_east: LngLat) -> Self {
        Self::new(south_west.lng, south_west.lat, north_east.lng, north_east.lat)
    }

    /// Serializes to the canonical query value: four comma-joined fields,
    /// each formatted to exactly 6 decimal places, no whitespace.
    pub fn to_query_string(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }

    /// Viewport area in squared degrees, clamped to zero on inverted corners.
    pub fn area_deg2(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0) * (self.max_y - self.min_y).max(0.0)
    }
}

/// Shape check for bbox values that arrive as raw strings:
/// `-?digits[.digits],` repeated four times.
pub fn is_bbox_query_string(raw: &str) -> bool {
    let fields: Vec<&str> = raw.split(',').collect();
    fields.len() == 4 && fields.iter().all(|f| is_plain_decimal(f))
}

fn is_plain_decimal(field: &str) -> bool {
    let body = field.strip_prefix('-').unwrap_or(field);
    let mut parts = body.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match frac_part {
        None => true,
        Some(frac) => !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()),
    }
}
