//! Keyboard mapping for the tape deck controls

use crate::commands::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use reel_audio::EffectName;

/// Converts key events to deck commands.
///
/// Stateless by design: every control on the deck is a single key, so there
/// are no modes or multi-key sequences to track.
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&self, key: KeyEvent) -> Option<Command> {
        // Ignore key release/repeat events on terminals that report them.
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            // Transport
            KeyCode::Char(' ') | KeyCode::Char('p') => Some(Command::Play),
            KeyCode::Char('s') => Some(Command::Stop),
            KeyCode::Char('r') => Some(Command::Rewind),
            KeyCode::Char('f') => Some(Command::FastForward),

            // Speed selector: slow / normal / fast playback
            KeyCode::Char('1') => Some(Command::SelectRate(0.8)),
            KeyCode::Char('2') => Some(Command::SelectRate(1.0)),
            KeyCode::Char('3') => Some(Command::SelectRate(1.2)),

            // Effects rack
            KeyCode::Char('c') => Some(Command::ToggleEffect(EffectName::Crackle)),
            KeyCode::Char('g') => Some(Command::ToggleEffect(EffectName::Gramophone)),
            KeyCode::Char('e') => Some(Command::ToggleEffect(EffectName::Echo)),

            // Master volume
            KeyCode::Char('-') => Some(Command::AdjustMasterVolume(-0.05)),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::AdjustMasterVolume(0.05)),

            // Quit
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),

            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
