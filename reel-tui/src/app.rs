//! Application state for the UI thread

use crate::theme::Theme;
use reel_audio::{TapeEvent, TapeSnapshot};

/// Everything the render loop needs to draw one frame.
pub struct App {
    /// Latest deck snapshot; `None` until the first one arrives.
    pub snapshot: Option<TapeSnapshot>,
    /// Fatal startup failure to display instead of the deck.
    pub failure: Option<String>,
    pub should_quit: bool,
    pub theme: Theme,
}

impl App {
    pub fn new(theme: Theme) -> Self {
        Self {
            snapshot: None,
            failure: None,
            should_quit: false,
            theme,
        }
    }

    /// Put the UI into the failure screen; only quit works from there.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    pub fn handle_event(&mut self, event: TapeEvent) {
        match event {
            TapeEvent::Snapshot(snapshot) => self.snapshot = Some(*snapshot),
            TapeEvent::Error(message) => self.fail(message),
        }
    }
}
