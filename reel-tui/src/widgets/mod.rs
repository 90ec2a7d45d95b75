//! UI widgets for REEL

mod fx_rack;
mod spools;
mod transport;

pub use fx_rack::{level_bar, FxRackWidget};
pub use spools::{spoke_line, spool_radius, SpoolsWidget};
pub use transport::TransportWidget;
