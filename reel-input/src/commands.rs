//! Command definitions for REEL

pub use reel_audio::EffectName;

/// Commands that can be dispatched from input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    // Transport
    Play,
    Stop,
    Rewind,
    FastForward,

    // Speed selector
    SelectRate(f64),

    // Effects rack
    ToggleEffect(EffectName),

    // Master bus
    AdjustMasterVolume(f32),

    // Application
    Quit,
}
