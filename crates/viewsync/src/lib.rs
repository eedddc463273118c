//! Viewport-driven feature synchronization.
//!
//! This crate turns map viewport settle events into bounded feature-service
//! requests:
//! - `RequestPlanner` derives a deterministic request key from
//!   (layer, organization, viewport), applies the zoom/area guards, and
//!   coalesces rapid updates so only the newest key inside the window fires;
//! - `FetchDriver` runs at most one request at a time per fetcher, aborting
//!   the in-flight request whenever a newer key supersedes it;
//! - `TileJsonCache` memoizes raster descriptors per (raster, organization).
//!
//! Time is injected as plain milliseconds so the planner is fully
//! deterministic under test; only the driver touches the runtime.

pub mod driver;
pub mod error;
pub mod key;
pub mod plan;
pub mod source;
pub mod tilejson_cache;

pub use driver::*;
pub use error::*;
pub use key::*;
pub use plan::*;
pub use source::*;
pub use tilejson_cache::*;
