//! Keyboard input handling for REEL

mod commands;
mod keyboard;

pub use commands::{Command, EffectName};
pub use keyboard::InputHandler;
