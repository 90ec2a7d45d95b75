//! Transport controller
//!
//! Sits between the buttons and the playback engine: owns the transport mode
//! state machine, the double-press stop disambiguation, the winding sound
//! effect lifecycle, the spool animation, and the tape counter readout.

use crate::clock::TapeClock;
use crate::engine::{Direction, EngineEvent, PlaybackEngine};
use crate::spool::SpoolAnimator;

/// What the transport is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Idle,
    Playing,
    Rewinding,
    FastForwarding,
}

#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    /// Rate used for rewind and fast-forward.
    pub fast_rate: f64,
    /// Window in which a second stop press means "reset to zero".
    pub double_click_window: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            fast_rate: 5.0,
            double_click_window: 0.25,
        }
    }
}

/// Which transport buttons light up; at most one is ever active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonStates {
    pub play: bool,
    pub rewind: bool,
    pub fast_forward: bool,
}

/// Refresh interval for the tape counter readout.
const READOUT_REFRESH_SECS: f64 = 0.25;

pub struct TransportController {
    engine: PlaybackEngine,
    spools: SpoolAnimator,
    mode: TransportMode,
    config: TransportConfig,
    /// Rate the speed selector requests for normal playback.
    selected_rate: f64,
    /// When set, a plain stop fires at this time unless a second press or
    /// another transport press intervenes.
    pending_stop_deadline: Option<f64>,
    clock: Box<dyn TapeClock>,
    last_tick: f64,
    readout: String,
    last_readout_refresh: f64,
}

impl TransportController {
    pub fn new(engine: PlaybackEngine, config: TransportConfig, clock: Box<dyn TapeClock>) -> Self {
        let now = clock.now();
        let mut controller = Self {
            engine,
            spools: SpoolAnimator::new(),
            mode: TransportMode::Idle,
            config,
            selected_rate: 1.0,
            pending_stop_deadline: None,
            clock,
            last_tick: now,
            readout: String::new(),
            last_readout_refresh: now,
        };
        controller.refresh_readout();
        controller
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn button_states(&self) -> ButtonStates {
        ButtonStates {
            play: self.mode == TransportMode::Playing,
            rewind: self.mode == TransportMode::Rewinding,
            fast_forward: self.mode == TransportMode::FastForwarding,
        }
    }

    pub fn readout(&self) -> &str {
        &self.readout
    }

    pub fn position(&self) -> f64 {
        self.engine.get_position()
    }

    pub fn duration(&self) -> f64 {
        self.engine.active_duration()
    }

    pub fn selected_rate(&self) -> f64 {
        self.selected_rate
    }

    pub fn spool_angles(&self) -> (f64, f64) {
        (self.spools.angles().0, self.spools.angles().1)
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    pub fn press_play(&mut self) {
        self.pending_stop_deadline = None;
        if self.mode == TransportMode::Playing {
            return;
        }
        // Coming out of winding, the loop goes quiet first.
        self.engine.set_winding(false);
        if self
            .engine
            .switch_to(Direction::Forward, self.selected_rate)
            .is_err()
        {
            self.enter_idle();
            return;
        }
        self.mode = TransportMode::Playing;
        self.spools.start(self.selected_rate, Direction::Forward);
        self.refresh_readout();
    }

    pub fn press_rewind(&mut self) {
        self.press_winding_mode(TransportMode::Rewinding, Direction::Reverse);
    }

    pub fn press_fast_forward(&mut self) {
        self.press_winding_mode(TransportMode::FastForwarding, Direction::Forward);
    }

    fn press_winding_mode(&mut self, mode: TransportMode, direction: Direction) {
        self.pending_stop_deadline = None;
        if self.mode == mode {
            return;
        }
        // Restart the winding loop for the new pass: off, retarget, on. A
        // rewind-to-fast-forward flip gets a fresh loop start rather than a
        // seamless (and wrong-sounding) carryover.
        self.engine.set_winding(false);
        if self
            .engine
            .switch_to(direction, self.config.fast_rate)
            .is_err()
        {
            self.enter_idle();
            return;
        }
        self.engine.set_winding(true);
        self.mode = mode;
        self.spools.start(self.config.fast_rate, direction);
        self.refresh_readout();
    }

    /// Stop is double-press aware: one press halts in place, a second press
    /// inside the window rewinds the counter to zero. The halt is deferred
    /// until the window closes so a reset never stops-then-resets audibly.
    pub fn press_stop(&mut self) {
        let now = self.clock.now();
        match self.pending_stop_deadline {
            Some(deadline) if now <= deadline => {
                self.pending_stop_deadline = None;
                self.engine.reset();
                self.enter_idle();
                tracing::debug!("double stop: counter reset");
            }
            _ => {
                self.pending_stop_deadline = Some(now + self.config.double_click_window);
            }
        }
    }

    /// Change the speed selector. Only normal playback follows it live;
    /// winding modes keep the fast rate.
    pub fn select_rate(&mut self, rate: f64) {
        self.selected_rate = rate.max(0.0);
        if self.mode == TransportMode::Playing {
            self.engine.set_rate(self.selected_rate);
            self.spools.update_speed(self.selected_rate, Direction::Forward);
        }
    }

    fn enter_idle(&mut self) {
        self.engine.set_winding(false);
        self.mode = TransportMode::Idle;
        self.spools.stop();
        self.refresh_readout();
    }

    /// Advance the transport by one control-loop iteration: resolve a pending
    /// single stop, poll the engine for end of tape, and run the animations.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let dt = (now - self.last_tick).max(0.0);
        self.last_tick = now;

        if let Some(deadline) = self.pending_stop_deadline {
            if now >= deadline {
                self.pending_stop_deadline = None;
                self.engine.stop();
                self.enter_idle();
            }
        }

        self.engine.tick();
        while let Some(event) = self.engine.take_event() {
            if let EngineEvent::Ended { position } = event {
                tracing::info!(position, "tape ran out");
                self.enter_idle();
            }
        }

        self.spools.advance(dt);

        if now - self.last_readout_refresh >= READOUT_REFRESH_SECS {
            self.refresh_readout();
        }
    }

    fn refresh_readout(&mut self) {
        self.readout = format!(
            "{} / {}",
            format_clock(self.engine.get_position()),
            format_clock(self.engine.active_duration())
        );
        self.last_readout_refresh = self.clock.now();
    }
}

/// Format seconds as a tape counter, `MM:SS`.
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AudioAsset;
    use crate::clock::ManualClock;
    use crate::engine::{OutputGate, ResumeError};
    use std::sync::Arc;

    fn controller(duration_secs: usize) -> (TransportController, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = PlaybackEngine::new(1000, Box::new(clock.clone()));
        let asset = AudioAsset::from_samples("reel_1", vec![0.0; duration_secs * 2000], 1000);
        engine.insert_asset(Arc::new(asset));
        engine.select("reel_1");
        let controller =
            TransportController::new(engine, TransportConfig::default(), Box::new(clock.clone()));
        (controller, clock)
    }

    #[test]
    fn single_stop_fires_only_after_the_window() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(2.0);
        t.press_stop();

        // Still rolling inside the disambiguation window.
        clock.advance(0.1);
        t.tick();
        assert_eq!(t.mode(), TransportMode::Playing);

        clock.advance(0.2);
        t.tick();
        assert_eq!(t.mode(), TransportMode::Idle);
        // Halted in place, not reset.
        assert!(t.position() > 2.0);
    }

    #[test]
    fn double_stop_resets_the_counter() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(5.0);

        t.press_stop();
        clock.advance(0.1);
        t.press_stop();
        assert_eq!(t.mode(), TransportMode::Idle);
        assert_eq!(t.position(), 0.0);

        // The deferred single stop must not fire afterwards.
        clock.advance(1.0);
        t.tick();
        assert_eq!(t.mode(), TransportMode::Idle);
        assert_eq!(t.position(), 0.0);
    }

    #[test]
    fn slow_second_stop_is_two_single_stops() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(5.0);

        t.press_stop();
        clock.advance(0.3);
        t.tick(); // first stop fires
        assert!(t.position() > 5.0 - 1e-9);

        t.press_stop(); // outside the window: arms a new pending stop
        clock.advance(0.3);
        t.tick();
        assert_eq!(t.mode(), TransportMode::Idle);
        assert!(t.position() > 0.0, "late second press must not reset");
    }

    #[test]
    fn transport_press_cancels_a_pending_stop() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(2.0);
        t.press_stop();
        t.press_rewind();

        clock.advance(0.5);
        t.tick();
        assert_eq!(t.mode(), TransportMode::Rewinding);
    }

    #[test]
    fn at_most_one_button_is_active() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(1.0);
        t.press_fast_forward();

        let buttons = t.button_states();
        assert!(!buttons.play);
        assert!(!buttons.rewind);
        assert!(buttons.fast_forward);
    }

    #[test]
    fn winding_loop_restarts_per_pass() {
        let (mut t, clock) = controller(60);
        t.press_fast_forward();
        clock.advance(1.0);
        t.press_rewind();

        // Two distinct loop starts, not one carried across the flip.
        assert_eq!(t.engine().winding_starts(), 2);
        assert!(t.engine().winding_active());
    }

    #[test]
    fn play_silences_the_winding_loop() {
        let (mut t, clock) = controller(60);
        t.press_rewind();
        clock.advance(1.0);
        t.press_play();
        assert!(!t.engine().winding_active());
        assert_eq!(t.mode(), TransportMode::Playing);
    }

    #[test]
    fn end_of_tape_deactivates_the_transport() {
        let (mut t, clock) = controller(4);
        t.press_fast_forward();
        clock.advance(2.0); // 2s at 5x = 10s > 4s reel
        t.tick();

        assert_eq!(t.mode(), TransportMode::Idle);
        assert_eq!(t.button_states(), ButtonStates::default());
        assert!(!t.engine().winding_active());
        assert_eq!(t.position(), 4.0);
    }

    #[test]
    fn rewind_hitting_the_start_deactivates() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(3.0);
        t.press_rewind();
        clock.advance(1.0); // 1s at 5x reverse from 3s
        t.tick();

        assert_eq!(t.mode(), TransportMode::Idle);
        assert_eq!(t.position(), 0.0);
    }

    #[test]
    fn speed_selector_applies_live_during_playback() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(2.0);
        t.select_rate(0.8);
        clock.advance(1.0);
        assert!((t.position() - 2.8).abs() < 1e-9);
        assert!((t.engine().rate() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn speed_selector_does_not_touch_winding_rate() {
        let (mut t, clock) = controller(60);
        t.press_play();
        clock.advance(1.0);
        t.press_fast_forward();
        t.select_rate(0.8);
        assert!((t.engine().rate() - 5.0).abs() < 1e-9);

        // The selection takes effect on the next play pass.
        clock.advance(0.1);
        t.press_play();
        assert!((t.engine().rate() - 0.8).abs() < 1e-9);
    }

    struct FlakyGate {
        fail_next: bool,
    }
    impl OutputGate for FlakyGate {
        fn resume(&mut self) -> Result<(), ResumeError> {
            if self.fail_next {
                self.fail_next = false;
                Err(ResumeError("output suspended".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn refused_resume_leaves_idle_and_retry_succeeds() {
        let (mut t, _clock) = controller(60);
        t.engine_mut().set_gate(Box::new(FlakyGate { fail_next: true }));

        t.press_play();
        assert_eq!(t.mode(), TransportMode::Idle);
        assert!(!t.engine().is_playing());

        t.press_play();
        assert_eq!(t.mode(), TransportMode::Playing);
    }

    #[test]
    fn readout_formats_as_tape_counter() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(75.4), "01:15");
        assert_eq!(format_clock(-3.0), "00:00");

        let (mut t, clock) = controller(90);
        t.press_play();
        clock.advance(65.0);
        t.tick();
        assert_eq!(t.readout(), "01:05 / 01:30");
    }
}
