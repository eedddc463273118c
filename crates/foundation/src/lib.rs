pub mod bbox;
pub mod viewport;

// Foundation crate: small, well-tested primitives only.
pub use bbox::*;
pub use viewport::*;
