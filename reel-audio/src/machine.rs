//! Deck command shell
//!
//! Wraps the transport controller behind command/event channels so the UI
//! thread never touches engine state directly. The deck itself lives behind a
//! mutex shared with the audio output callback; commands and ticks run on the
//! audio control loop, snapshots flow back to the UI.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::effects::EffectName;
use crate::transport::{ButtonStates, TransportController, TransportMode};

/// Commands from the UI to the deck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapeCommand {
    PressPlay,
    PressStop,
    PressRewind,
    PressFastForward,
    SelectRate(f64),
    ToggleEffect(EffectName),
    SetEffectVolume(EffectName, f32),
    SetMasterVolume(f32),
    AdjustMasterVolume(f32),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectSnapshot {
    pub enabled: bool,
    pub level: f32,
}

/// Immutable view of the deck for rendering one UI frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TapeSnapshot {
    pub mode: TransportMode,
    pub buttons: ButtonStates,
    pub readout: String,
    pub position: f64,
    pub duration: f64,
    pub rate: f64,
    pub selected_rate: f64,
    pub spool_angles: (f64, f64),
    pub crackle: EffectSnapshot,
    pub gramophone: EffectSnapshot,
    pub echo: EffectSnapshot,
    pub master_volume: f32,
    pub winding: bool,
    pub active_key: Option<String>,
}

/// Events from the deck to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum TapeEvent {
    Snapshot(Box<TapeSnapshot>),
    /// Fatal audio-side failure; the UI shows it and offers only quit.
    Error(String),
}

pub struct TapeDeck {
    controller: TransportController,
}

impl TapeDeck {
    pub fn new(controller: TransportController) -> Self {
        Self { controller }
    }

    pub fn handle_command(&mut self, command: TapeCommand) {
        match command {
            TapeCommand::PressPlay => self.controller.press_play(),
            TapeCommand::PressStop => self.controller.press_stop(),
            TapeCommand::PressRewind => self.controller.press_rewind(),
            TapeCommand::PressFastForward => self.controller.press_fast_forward(),
            TapeCommand::SelectRate(rate) => self.controller.select_rate(rate),
            TapeCommand::ToggleEffect(name) => {
                self.controller.engine_mut().effects_mut().toggle(name);
            }
            TapeCommand::SetEffectVolume(name, level) => {
                self.controller
                    .engine_mut()
                    .effects_mut()
                    .set_effect_volume(name, level);
            }
            TapeCommand::SetMasterVolume(level) => {
                self.controller
                    .engine_mut()
                    .effects_mut()
                    .set_master_volume(level);
            }
            TapeCommand::AdjustMasterVolume(delta) => {
                let effects = self.controller.engine_mut().effects_mut();
                let current = effects.master_volume();
                effects.set_master_volume(current + delta);
            }
            TapeCommand::Shutdown => {}
        }
    }

    /// Run one control-loop iteration.
    pub fn tick(&mut self) {
        self.controller.tick();
    }

    /// Render audio into an interleaved stereo buffer. Audio-thread only.
    pub fn render(&mut self, out: &mut [f32]) {
        self.controller.engine_mut().render(out);
    }

    pub fn controller(&self) -> &TransportController {
        &self.controller
    }

    pub fn snapshot(&self) -> TapeSnapshot {
        let engine = self.controller.engine();
        let effects = engine.effects();
        let effect = |name| EffectSnapshot {
            enabled: effects.is_enabled(name),
            level: effects.effect_volume(name),
        };
        TapeSnapshot {
            mode: self.controller.mode(),
            buttons: self.controller.button_states(),
            readout: self.controller.readout().to_string(),
            position: self.controller.position(),
            duration: self.controller.duration(),
            rate: engine.rate(),
            selected_rate: self.controller.selected_rate(),
            spool_angles: self.controller.spool_angles(),
            crackle: effect(EffectName::Crackle),
            gramophone: effect(EffectName::Gramophone),
            echo: effect(EffectName::Echo),
            master_volume: effects.master_volume(),
            winding: engine.winding_active(),
            active_key: engine.active_key().map(str::to_string),
        }
    }
}

/// UI-side handle: command sender, event receiver, shutdown flag.
pub struct DeckHandle {
    command_tx: Sender<TapeCommand>,
    event_rx: Receiver<TapeEvent>,
    shutdown: Arc<AtomicBool>,
}

impl DeckHandle {
    /// Build the channel pair: the handle for the UI side and the matching
    /// (command receiver, event sender, shutdown flag) for the control loop.
    pub fn create_channels() -> (Self, Receiver<TapeCommand>, Sender<TapeEvent>, Arc<AtomicBool>) {
        let (command_tx, command_rx) = bounded(1024);
        let (event_tx, event_rx) = bounded(1024);
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = Self {
            command_tx,
            event_rx,
            shutdown: shutdown.clone(),
        };
        (handle, command_rx, event_tx, shutdown)
    }

    pub fn send(&self, command: TapeCommand) {
        if self.command_tx.try_send(command).is_err() {
            tracing::warn!(?command, "command channel full, dropping");
        }
    }

    pub fn events(&self) -> &Receiver<TapeEvent> {
        &self.event_rx
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AudioAsset;
    use crate::clock::ManualClock;
    use crate::engine::PlaybackEngine;
    use crate::transport::TransportConfig;
    use std::sync::Arc;

    fn deck() -> (TapeDeck, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = PlaybackEngine::new(1000, Box::new(clock.clone()));
        let asset = AudioAsset::from_samples("reel_1", vec![0.0; 120_000], 1000);
        engine.insert_asset(Arc::new(asset));
        engine.select("reel_1");
        let controller =
            TransportController::new(engine, TransportConfig::default(), Box::new(clock.clone()));
        (TapeDeck::new(controller), clock)
    }

    #[test]
    fn commands_drive_the_transport() {
        let (mut deck, clock) = deck();
        deck.handle_command(TapeCommand::PressPlay);
        clock.advance(2.0);

        let snap = deck.snapshot();
        assert_eq!(snap.mode, TransportMode::Playing);
        assert!(snap.buttons.play);
        assert!((snap.position - 2.0).abs() < 1e-9);
        assert_eq!(snap.active_key.as_deref(), Some("reel_1"));
    }

    #[test]
    fn effect_toggle_round_trips_through_the_snapshot() {
        let (mut deck, _clock) = deck();
        assert!(!deck.snapshot().echo.enabled);

        deck.handle_command(TapeCommand::ToggleEffect(EffectName::Echo));
        assert!(deck.snapshot().echo.enabled);

        deck.handle_command(TapeCommand::SetEffectVolume(EffectName::Echo, 0.3));
        assert_eq!(deck.snapshot().echo.level, 0.3);
    }

    #[test]
    fn master_volume_adjusts_relatively_and_clamps() {
        let (mut deck, _clock) = deck();
        deck.handle_command(TapeCommand::AdjustMasterVolume(-0.3));
        assert!((deck.snapshot().master_volume - 0.7).abs() < 1e-6);

        deck.handle_command(TapeCommand::AdjustMasterVolume(10.0));
        assert_eq!(deck.snapshot().master_volume, 1.0);
    }

    #[test]
    fn handle_signals_shutdown() {
        let (handle, command_rx, _event_tx, shutdown) = DeckHandle::create_channels();
        handle.send(TapeCommand::PressPlay);
        assert_eq!(command_rx.try_recv(), Ok(TapeCommand::PressPlay));

        assert!(!shutdown.load(Ordering::SeqCst));
        handle.shutdown();
        assert!(handle.is_shutdown());
        assert!(shutdown.load(Ordering::SeqCst));
    }
}
