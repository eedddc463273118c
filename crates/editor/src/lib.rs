//! Interactive draw-surface state and client-side save validation.

pub mod selection;
pub mod surface;
pub mod validation;

pub use selection::*;
pub use surface::*;
pub use validation::*;
