//! Playback engine
//!
//! Owns the loaded reels, the live source node, and the effects chain, and is
//! the single authority on playback position. Position is derived from the
//! injected clock (start position plus elapsed time scaled by rate and
//! direction, clamped to the reel bounds), never from the render cursor: the
//! render callback runs on its own cadence and may lag, but the transport
//! readout must not.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

use crate::asset::AudioAsset;
use crate::clock::TapeClock;
use crate::effects::{EffectsGraph, WindingLoop};
use crate::source::TapeSource;

/// Tape travel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// Position delta sign: +1 forward, -1 reverse.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// The audio output refused to start.
#[derive(Debug, Error)]
#[error("audio output could not be resumed: {0}")]
pub struct ResumeError(pub String);

/// Gate in front of the audio output. Starting playback asks the gate first;
/// a refusal leaves the transport stopped so the user can simply retry.
pub trait OutputGate: Send {
    fn resume(&mut self) -> Result<(), ResumeError>;
}

/// Production gate: the output stream is opened at startup and stays running,
/// so resuming always succeeds.
pub struct AlwaysReady;

impl OutputGate for AlwaysReady {
    fn resume(&mut self) -> Result<(), ResumeError> {
        Ok(())
    }
}

/// Transport notifications, consumed by the controller in FIFO order. Each is
/// queued only after the engine state it describes is fully settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    Started { direction: Direction, rate: f64 },
    Stopped { position: f64 },
    /// Playback ran off the start or end of the reel.
    Ended { position: f64 },
}

pub struct PlaybackEngine {
    assets: HashMap<String, Arc<AudioAsset>>,
    active: Option<String>,

    playing: bool,
    direction: Direction,
    rate: f64,
    /// Position at the moment playback last (re)started or stopped.
    position_secs: f64,
    /// Clock reading at the moment playback last (re)started.
    started_at: f64,

    source: Option<TapeSource>,
    source_serial: u64,

    effects: EffectsGraph,
    winding: WindingLoop,

    clock: Box<dyn TapeClock>,
    gate: Box<dyn OutputGate>,
    events: VecDeque<EngineEvent>,
}

impl PlaybackEngine {
    pub fn new(sample_rate: u32, clock: Box<dyn TapeClock>) -> Self {
        Self {
            assets: HashMap::new(),
            active: None,
            playing: false,
            direction: Direction::Forward,
            rate: 1.0,
            position_secs: 0.0,
            started_at: 0.0,
            source: None,
            source_serial: 0,
            effects: EffectsGraph::new(sample_rate as f32),
            winding: WindingLoop::new(sample_rate as f32),
            clock,
            gate: Box::new(AlwaysReady),
            events: VecDeque::new(),
        }
    }

    pub fn set_gate(&mut self, gate: Box<dyn OutputGate>) {
        self.gate = gate;
    }

    pub fn insert_asset(&mut self, asset: Arc<AudioAsset>) {
        self.assets.insert(asset.key().to_string(), asset);
    }

    /// Make `key` the active reel. Switching reels rewinds to the start.
    pub fn select(&mut self, key: &str) -> bool {
        if !self.assets.contains_key(key) {
            tracing::warn!(key, "select: no such reel");
            return false;
        }
        if self.active.as_deref() == Some(key) {
            return true;
        }
        self.source = None;
        self.playing = false;
        self.position_secs = 0.0;
        self.active = Some(key.to_string());
        true
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_duration(&self) -> f64 {
        self.active
            .as_ref()
            .and_then(|k| self.assets.get(k))
            .map(|a| a.duration_secs())
            .unwrap_or(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn effects(&self) -> &EffectsGraph {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectsGraph {
        &mut self.effects
    }

    pub fn set_winding(&mut self, active: bool) {
        self.winding.set_active(active);
    }

    pub fn winding_active(&self) -> bool {
        self.winding.is_active()
    }

    #[cfg(test)]
    pub(crate) fn winding_starts(&self) -> u64 {
        self.winding.times_started()
    }

    #[cfg(test)]
    pub(crate) fn source_serial(&self) -> u64 {
        self.source_serial
    }

    /// Clock-derived position, clamped to the reel bounds. Pure read.
    pub fn get_position(&self) -> f64 {
        self.raw_position().clamp(0.0, self.active_duration())
    }

    fn raw_position(&self) -> f64 {
        if !self.playing {
            return self.position_secs;
        }
        let elapsed = self.clock.now() - self.started_at;
        self.position_secs + elapsed * self.rate * self.direction.sign()
    }

    /// Start playback from the current position. Already playing is a no-op:
    /// the live source is untouched.
    pub fn play(&mut self) -> Result<(), ResumeError> {
        if self.playing {
            return Ok(());
        }
        self.gate.resume().map_err(|e| {
            tracing::warn!(error = %e, "output gate refused to resume");
            e
        })?;
        self.begin();
        Ok(())
    }

    /// Switch the live transport to a new direction and rate in one motion.
    ///
    /// A source node is bound to one buffer and direction for its lifetime,
    /// so any real change tears the node down and builds a fresh one at the
    /// current position. Requesting the mode already in effect does nothing;
    /// there is no audible restart.
    pub fn switch_to(&mut self, direction: Direction, rate: f64) -> Result<(), ResumeError> {
        let rate = rate.max(0.0);
        if self.playing && self.direction == direction && (self.rate - rate).abs() < 1e-9 {
            return Ok(());
        }

        if self.playing {
            self.position_secs = self.get_position();
            self.source = None;
            self.playing = false;
        } else {
            self.gate.resume().map_err(|e| {
                tracing::warn!(error = %e, "output gate refused to resume");
                e
            })?;
        }

        self.direction = direction;
        self.rate = rate;
        self.begin();
        Ok(())
    }

    /// Build the source node and start the position clock.
    fn begin(&mut self) {
        let Some(asset) = self.active.as_ref().and_then(|k| self.assets.get(k)) else {
            tracing::debug!("play with no active reel");
            return;
        };

        // The reversed buffer plays front-to-back, so its offset mirrors the
        // logical position.
        let (buffer, offset) = match self.direction {
            Direction::Forward => (asset.forward(), self.position_secs),
            Direction::Reverse => (asset.reversed(), asset.duration_secs() - self.position_secs),
        };

        self.source_serial += 1;
        self.source = Some(TapeSource::new(buffer, asset.sample_rate(), offset, self.rate));
        self.started_at = self.clock.now();
        self.playing = true;
        self.events.push_back(EngineEvent::Started {
            direction: self.direction,
            rate: self.rate,
        });
        tracing::debug!(
            direction = ?self.direction,
            rate = self.rate,
            position = self.position_secs,
            source = self.source_serial,
            "transport started"
        );
    }

    /// Halt playback, freezing the position where the tape stands. The
    /// position is finalized before the `Stopped` event is queued, so every
    /// observer of the event sees the settled value.
    pub fn stop(&mut self) {
        if !self.playing {
            tracing::debug!("stop while already stopped");
            return;
        }
        self.position_secs = self.get_position();
        self.source = None;
        self.playing = false;
        self.events.push_back(EngineEvent::Stopped {
            position: self.position_secs,
        });
        tracing::debug!(position = self.position_secs, "transport stopped");
    }

    /// Halt playback and rewind the counter to zero.
    pub fn reset(&mut self) {
        let was_playing = self.playing;
        self.source = None;
        self.playing = false;
        self.position_secs = 0.0;
        if was_playing {
            self.events.push_back(EngineEvent::Stopped { position: 0.0 });
        }
        tracing::debug!("transport reset");
    }

    /// Change the playback rate without restarting. The accrued position is
    /// folded in first so the rate change only affects time from now on.
    pub fn set_rate(&mut self, rate: f64) {
        let rate = rate.max(0.0);
        if self.playing {
            self.position_secs = self.get_position();
            self.started_at = self.clock.now();
            if let Some(source) = &mut self.source {
                source.set_rate(rate);
            }
        }
        self.rate = rate;
    }

    /// Poll for end of tape. When the unclamped position runs past a reel
    /// boundary, playback is finalized at the boundary and `Ended` is queued.
    pub fn tick(&mut self) {
        if !self.playing {
            return;
        }
        let duration = self.active_duration();
        let raw = self.raw_position();
        let ended = match self.direction {
            Direction::Forward => raw >= duration,
            Direction::Reverse => raw <= 0.0,
        };
        if ended {
            self.position_secs = raw.clamp(0.0, duration);
            self.source = None;
            self.playing = false;
            self.events.push_back(EngineEvent::Ended {
                position: self.position_secs,
            });
            tracing::debug!(position = self.position_secs, "end of tape");
        }
    }

    pub fn take_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }

    /// Render one output buffer (interleaved stereo). Called from the audio
    /// thread; everything here is allocation-free.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if let Some(source) = &mut self.source {
            source.render(out);
        }
        self.effects.process(out);
        self.winding.process(out);
        self.effects.apply_master(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn engine_with_reel(duration_secs: usize) -> (PlaybackEngine, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = PlaybackEngine::new(1000, Box::new(clock.clone()));
        // 1000Hz stereo: duration_secs * 1000 frames.
        let asset = AudioAsset::from_samples("reel_1", vec![0.0; duration_secs * 2000], 1000);
        engine.insert_asset(Arc::new(asset));
        assert!(engine.select("reel_1"));
        (engine, clock)
    }

    struct RefusingGate;
    impl OutputGate for RefusingGate {
        fn resume(&mut self) -> Result<(), ResumeError> {
            Err(ResumeError("output suspended".into()))
        }
    }

    #[test]
    fn position_advances_with_the_clock() {
        let (mut engine, clock) = engine_with_reel(4);
        engine.play().unwrap();
        clock.advance(1.5);
        assert!((engine.get_position() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn play_while_playing_keeps_the_live_source() {
        let (mut engine, clock) = engine_with_reel(4);
        engine.play().unwrap();
        clock.advance(0.5);
        engine.play().unwrap();
        assert_eq!(engine.source_serial(), 1);
        // Only one Started event was queued.
        assert!(matches!(engine.take_event(), Some(EngineEvent::Started { .. })));
        assert_eq!(engine.take_event(), None);
    }

    #[test]
    fn position_clamps_at_the_end_and_tick_finalizes() {
        let (mut engine, clock) = engine_with_reel(4);
        engine.play().unwrap();
        clock.advance(10.0);
        assert_eq!(engine.get_position(), 4.0);

        engine.tick();
        assert!(!engine.is_playing());
        engine.take_event(); // Started
        assert_eq!(engine.take_event(), Some(EngineEvent::Ended { position: 4.0 }));
    }

    #[test]
    fn reverse_playback_clamps_at_zero() {
        let (mut engine, clock) = engine_with_reel(4);
        engine.play().unwrap();
        clock.advance(2.0);
        engine.switch_to(Direction::Reverse, 5.0).unwrap();
        clock.advance(1.0); // raw position 2 - 5 = -3
        assert_eq!(engine.get_position(), 0.0);

        engine.tick();
        assert!(!engine.is_playing());
    }

    #[test]
    fn full_transport_scenario() {
        let (mut engine, clock) = engine_with_reel(150);
        engine.play().unwrap();
        clock.advance(10.0);
        assert!((engine.get_position() - 10.0).abs() < 1e-9);

        engine.switch_to(Direction::Reverse, 5.0).unwrap();
        clock.advance(2.0);
        assert_eq!(engine.get_position(), 0.0);

        engine.tick();
        assert!(!engine.is_playing());
        assert_eq!(engine.get_position(), 0.0);
        engine.stop(); // redundant, absorbed
        assert_eq!(engine.get_position(), 0.0);
    }

    #[test]
    fn switch_to_same_mode_is_a_no_op() {
        let (mut engine, clock) = engine_with_reel(10);
        engine.switch_to(Direction::Forward, 1.0).unwrap();
        clock.advance(1.0);
        engine.switch_to(Direction::Forward, 1.0).unwrap();
        assert_eq!(engine.source_serial(), 1);
        assert!((engine.get_position() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn switching_direction_rebuilds_the_source() {
        let (mut engine, clock) = engine_with_reel(10);
        engine.play().unwrap();
        clock.advance(3.0);
        engine.switch_to(Direction::Reverse, 5.0).unwrap();
        assert_eq!(engine.source_serial(), 2);
        // Position carried across the rebuild.
        assert!((engine.get_position() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn set_rate_rebases_accrued_position() {
        let (mut engine, clock) = engine_with_reel(20);
        engine.play().unwrap();
        clock.advance(2.0);
        engine.set_rate(3.0);
        clock.advance(1.0);
        assert!((engine.get_position() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn refused_gate_leaves_the_transport_stopped() {
        let (mut engine, clock) = engine_with_reel(4);
        engine.set_gate(Box::new(RefusingGate));

        assert!(engine.play().is_err());
        assert!(!engine.is_playing());
        clock.advance(5.0);
        assert_eq!(engine.get_position(), 0.0);
        assert_eq!(engine.take_event(), None);
    }

    #[test]
    fn stop_finalizes_position_before_notifying() {
        let (mut engine, clock) = engine_with_reel(10);
        engine.play().unwrap();
        clock.advance(1.0);
        engine.stop();

        assert!((engine.get_position() - 1.0).abs() < 1e-9);
        engine.take_event(); // Started
        match engine.take_event() {
            Some(EngineEvent::Stopped { position }) => {
                assert_eq!(position, engine.get_position());
            }
            other => panic!("expected Stopped, got {other:?}"),
        }
    }

    #[test]
    fn redundant_stop_is_absorbed() {
        let (mut engine, _clock) = engine_with_reel(4);
        engine.stop();
        assert_eq!(engine.take_event(), None);
    }

    #[test]
    fn render_is_silent_when_stopped() {
        let (mut engine, _clock) = engine_with_reel(4);
        let mut out = vec![0.7f32; 64];
        engine.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
