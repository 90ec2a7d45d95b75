//! reel-audio: tape deck playback core
//!
//! Decoding and resampling of reels, the clock-driven playback engine, the
//! coloration effects chain, the transport state machine, and the command
//! shell the application drives over channels.

pub mod asset;
pub mod clock;
pub mod effects;
pub mod engine;
pub mod machine;
pub mod source;
pub mod spool;
pub mod transport;

pub use asset::{AudioAsset, LoadError, TapeLoader};
pub use clock::{ManualClock, SystemClock, TapeClock};
pub use effects::{ConnectionPlan, EffectName, EffectsGraph, OneShotState, Stage, WindingLoop};
pub use engine::{
    AlwaysReady, Direction, EngineEvent, OutputGate, PlaybackEngine, ResumeError,
};
pub use machine::{DeckHandle, EffectSnapshot, TapeCommand, TapeDeck, TapeEvent, TapeSnapshot};
pub use source::TapeSource;
pub use spool::SpoolAnimator;
pub use transport::{
    format_clock, ButtonStates, TransportConfig, TransportController, TransportMode,
};
