//! Mechanical winding loop
//!
//! The looping motor-and-tape whirr heard while fast-forwarding or
//! rewinding. Synthesized: a low rumble plus flutter-modulated noise, with a
//! short gain ramp so starting and stopping never clicks.

use std::f32::consts::PI;

/// Motor rumble fundamental in Hz
const RUMBLE_HZ: f32 = 27.0;
/// Flutter modulation of the whirr in Hz
const FLUTTER_HZ: f32 = 6.5;
/// Overall loudness of the loop
const LOOP_GAIN: f32 = 0.12;

pub struct WindingLoop {
    active: bool,
    /// Times the loop has been started; one loop instance is reused, a
    /// restart is stop-then-start.
    starts: u64,

    rumble_phase: f32,
    rumble_inc: f32,
    flutter_phase: f32,
    flutter_inc: f32,

    // Noise state
    random_state: u64,
    noise_lp: f32,

    // Gain ramp for click-free start/stop
    gain_target: f32,
    gain_current: f32,
}

impl WindingLoop {
    /// Gain ramp coefficient (~8ms at 48kHz)
    const RAMP_COEFF: f32 = 0.9994;

    pub fn new(sample_rate: f32) -> Self {
        let sr = sample_rate.max(1.0);
        Self {
            active: false,
            starts: 0,
            rumble_phase: 0.0,
            rumble_inc: RUMBLE_HZ / sr,
            flutter_phase: 0.0,
            flutter_inc: FLUTTER_HZ / sr,
            random_state: 0x5EED_F00D_5EED_F00D,
            noise_lp: 0.0,
            gain_target: 0.0,
            gain_current: 0.0,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        if active && !self.active {
            self.starts += 1;
        }
        self.active = active;
        self.gain_target = if active { 1.0 } else { 0.0 };
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// How many times the loop has been started since creation.
    pub fn times_started(&self) -> u64 {
        self.starts
    }

    #[inline]
    fn next_random(&mut self) -> f32 {
        self.random_state ^= self.random_state << 13;
        self.random_state ^= self.random_state >> 7;
        self.random_state ^= self.random_state << 17;
        (self.random_state as f32) / (u64::MAX as f32) * 2.0 - 1.0
    }

    /// Mix the loop into a stereo interleaved buffer.
    pub fn process(&mut self, samples: &mut [f32]) {
        // Silent and settled: nothing to do
        if !self.active && self.gain_current < 0.0001 {
            return;
        }

        for frame in samples.chunks_mut(2) {
            self.gain_current = Self::RAMP_COEFF * self.gain_current
                + (1.0 - Self::RAMP_COEFF) * self.gain_target;

            let rumble = (self.rumble_phase * 2.0 * PI).sin() * 0.5;
            self.rumble_phase += self.rumble_inc;
            if self.rumble_phase >= 1.0 {
                self.rumble_phase -= 1.0;
            }

            let flutter = 0.6 + 0.4 * (self.flutter_phase * 2.0 * PI).sin();
            self.flutter_phase += self.flutter_inc;
            if self.flutter_phase >= 1.0 {
                self.flutter_phase -= 1.0;
            }

            // Dull the noise into a whirr
            let white = self.next_random();
            self.noise_lp = self.noise_lp * 0.92 + white * 0.08;

            let sample = (rumble + self.noise_lp * flutter * 1.5) * LOOP_GAIN * self.gain_current;
            frame[0] += sample;
            if frame.len() > 1 {
                frame[1] += sample;
            }
        }
    }
}
