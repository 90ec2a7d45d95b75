//! Terminal UI for REEL - widgets, themes, and layout
//!
//! Draws the tape deck faceplate: spool window, transport bar, and the
//! coloration rack.

mod app;
mod theme;
pub mod widgets;

pub use app::App;
pub use theme::{Theme, CHROME, MIDNIGHT, WALNUT};
pub use widgets::{FxRackWidget, SpoolsWidget, TransportWidget};
