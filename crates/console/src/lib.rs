//! Console crate: the interactive map session.
//!
//! [`MapController`] wires the lower crates together: it feeds viewport
//! movement through the request planner, hands released keys to the fetch
//! driver, reconciles responses into the draw surface, and runs the
//! save/delete paths against a [`FeatureWriter`]. Raster overlays are
//! managed separately by [`RasterVisibilityManager`], which talks to the
//! rendering surface through the [`MapSurface`] trait.
//!
//! The embedding owns the event loop: it forwards typed [`MapCommand`]s
//! from the UI, pumps [`FetchOutcome`]s from the driver's receiver back
//! into the controller, and drains the notice bus for display.
//!
//! [`FetchOutcome`]: viewsync::driver::FetchOutcome

pub mod commands;
pub mod controller;
pub mod notices;
pub mod raster;
pub mod writer;

pub use commands::{command_channel, CommandReceiver, CommandSender, DrawMode, MapCommand};
pub use controller::MapController;
pub use notices::{Notice, NoticeBus, NoticeLevel};
pub use raster::{MapSurface, RasterVisibilityManager};
pub use writer::{FeatureWriter, HttpFeatureWriter, WriteError};
