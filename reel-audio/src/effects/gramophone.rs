//! Gramophone coloration - serial horn-band voicing
//!
//! Unlike the parallel effects, the gramophone defines the entire timbre
//! while active, so it processes the signal path serially: band-limited horn
//! EQ, soft saturation, and a slow amplitude warble.

use std::f32::consts::PI;

/// Lower edge of the horn band in Hz
const HORN_LOW_HZ: f32 = 300.0;
/// Upper edge of the horn band in Hz
const HORN_HIGH_HZ: f32 = 3200.0;
/// Warble LFO rate in Hz (roughly 78rpm eccentricity)
const WARBLE_RATE_HZ: f32 = 0.65;
/// Warble depth as a gain swing
const WARBLE_DEPTH: f32 = 0.12;

pub struct Gramophone {
    enabled: bool,
    level: f32,

    // One-pole highpass state per channel
    hp_coeff: f32,
    hp_state_l: f32,
    hp_state_r: f32,

    // One-pole lowpass state per channel
    lp_coeff: f32,
    lp_state_l: f32,
    lp_state_r: f32,

    // Warble LFO
    warble_phase: f32,
    warble_inc: f32,

    // Saturation drive
    drive: f32,
}

impl Gramophone {
    pub fn new(sample_rate: f32) -> Self {
        let sr = sample_rate.max(1.0);
        Self {
            enabled: false,
            level: 1.0,
            hp_coeff: (-2.0 * PI * HORN_LOW_HZ / sr).exp(),
            hp_state_l: 0.0,
            hp_state_r: 0.0,
            lp_coeff: (-2.0 * PI * HORN_HIGH_HZ / sr).exp(),
            lp_state_l: 0.0,
            lp_state_r: 0.0,
            warble_phase: 0.0,
            warble_inc: WARBLE_RATE_HZ / sr,
            drive: 2.2,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.reset();
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Output trim of the colored signal (0.0 - 1.0).
    pub fn set_level(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.hp_state_l = 0.0;
        self.hp_state_r = 0.0;
        self.lp_state_l = 0.0;
        self.lp_state_r = 0.0;
        self.warble_phase = 0.0;
    }

    /// Soft saturation, fast tanh approximation
    #[inline(always)]
    fn saturate(x: f32) -> f32 {
        x / (1.0 + x.abs())
    }

    #[inline]
    fn warble_gain(&mut self) -> f32 {
        let lfo = (self.warble_phase * 2.0 * PI).sin();
        self.warble_phase += self.warble_inc;
        if self.warble_phase >= 1.0 {
            self.warble_phase -= 1.0;
        }
        1.0 - WARBLE_DEPTH * 0.5 + lfo * WARBLE_DEPTH * 0.5
    }

    /// Process a stereo interleaved buffer in place (serial coloration).
    pub fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }

        // Makeup for the energy lost to band-limiting
        let makeup = 1.6 * self.level;

        for frame in samples.chunks_mut(2) {
            let warble = self.warble_gain();

            // Highpass: subtract the lowpassed running average
            self.hp_state_l = self.hp_state_l * self.hp_coeff + frame[0] * (1.0 - self.hp_coeff);
            let hp_l = frame[0] - self.hp_state_l;
            self.lp_state_l = self.lp_state_l * self.lp_coeff + hp_l * (1.0 - self.lp_coeff);
            frame[0] = Self::saturate(self.lp_state_l * self.drive) * makeup * warble;

            if frame.len() > 1 {
                self.hp_state_r = self.hp_state_r * self.hp_coeff + frame[1] * (1.0 - self.hp_coeff);
                let hp_r = frame[1] - self.hp_state_r;
                self.lp_state_r = self.lp_state_r * self.lp_coeff + hp_r * (1.0 - self.lp_coeff);
                frame[1] = Self::saturate(self.lp_state_r * self.drive) * makeup * warble;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_transparent() {
        let mut gram = Gramophone::new(48000.0);
        let mut samples = vec![0.5f32, -0.5, 0.25, -0.25];
        let original = samples.clone();
        gram.process(&mut samples);
        assert_eq!(samples, original);
    }

    #[test]
    fn enabled_colors_the_signal() {
        let mut gram = Gramophone::new(48000.0);
        gram.set_enabled(true);

        let mut samples: Vec<f32> = (0..2048)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        let original = samples.clone();
        gram.process(&mut samples);

        assert_ne!(samples, original);
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn saturation_limits_extremes() {
        assert!(Gramophone::saturate(100.0) < 1.0);
        assert!(Gramophone::saturate(-100.0) > -1.0);
    }

    #[test]
    fn output_bounded_even_at_full_drive() {
        let mut gram = Gramophone::new(48000.0);
        gram.set_enabled(true);

        let mut samples = vec![1.0f32; 4096];
        gram.process(&mut samples);
        // Saturation caps at 1.0, makeup at 1.6: output stays bounded.
        assert!(samples.iter().all(|s| s.abs() <= 2.0));
    }

    #[test]
    fn level_scales_contribution() {
        let run = |level: f32| {
            let mut gram = Gramophone::new(48000.0);
            gram.set_enabled(true);
            gram.set_level(level);
            let mut samples: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.1).sin()).collect();
            gram.process(&mut samples);
            samples.iter().map(|s| s.abs()).sum::<f32>()
        };

        assert!(run(0.25) < run(1.0));
        assert_eq!(run(0.0), 0.0);
    }
}
