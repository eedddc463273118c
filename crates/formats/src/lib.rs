pub mod envelope;
pub mod geojson;
pub mod tilejson;

pub use envelope::*;
pub use geojson::*;
pub use tilejson::*;
