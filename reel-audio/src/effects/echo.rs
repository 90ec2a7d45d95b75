//! Echo - parallel wet-only delay tap
//!
//! The dry signal passes untouched; only the delayed wet signal is added on
//! top. Feedback runs through a soft saturator to prevent runaway.

/// Maximum delay time in seconds
const MAX_DELAY_SECS: f32 = 2.0;

pub struct Echo {
    enabled: bool,
    sample_rate: f32,
    /// Delay buffer (stereo interleaved: L,R,L,R,...)
    buffer: Vec<f32>,
    /// Buffer length in stereo frames
    buffer_frames: usize,
    /// Write position in frames
    write_pos: usize,
    /// Delay time in frames
    delay_frames: usize,
    /// Feedback amount (0.0 - 0.95)
    feedback: f32,
    /// Wet contribution (0.0 - 1.0)
    level: f32,
    /// Wet envelope for click-free enable/disable
    wet_target: f32,
    wet_current: f32,
}

impl Echo {
    /// Wet envelope smoothing coefficient (~10ms at 48kHz)
    const WET_SMOOTH_COEFF: f32 = 0.9995;

    pub fn new(sample_rate: f32) -> Self {
        let sr = sample_rate.max(1.0);
        let buffer_frames = (sr * MAX_DELAY_SECS) as usize;
        Self {
            enabled: false,
            sample_rate: sr,
            buffer: vec![0.0; buffer_frames.max(1) * 2],
            buffer_frames: buffer_frames.max(1),
            write_pos: 0,
            delay_frames: (sr * 0.3) as usize, // 300ms default
            feedback: 0.45,
            level: 0.6,
            wet_target: 0.0,
            wet_current: 0.0,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.wet_target = if enabled { 1.0 } else { 0.0 };
        // Tails fade out naturally on disable; no hard reset.
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_delay_ms(&mut self, ms: f32) {
        let clamped = ms.clamp(1.0, MAX_DELAY_SECS * 1000.0);
        self.delay_frames = ((clamped / 1000.0) * self.sample_rate) as usize;
        self.delay_frames = self.delay_frames.clamp(1, self.buffer_frames - 1);
    }

    pub fn delay_ms(&self) -> f32 {
        self.delay_frames as f32 / self.sample_rate * 1000.0
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.wet_current = 0.0;
    }

    /// Soft saturation on the feedback path
    #[inline(always)]
    fn soft_saturate(x: f32) -> f32 {
        x / (1.0 + x.abs())
    }

    /// Add the wet tap to a stereo interleaved buffer.
    pub fn process(&mut self, samples: &mut [f32]) {
        // Skip only once disabled and the envelope has settled
        if !self.enabled && self.wet_current < 0.0001 {
            return;
        }

        for frame in samples.chunks_mut(2) {
            if frame.len() < 2 {
                continue;
            }

            self.wet_current = Self::WET_SMOOTH_COEFF * self.wet_current
                + (1.0 - Self::WET_SMOOTH_COEFF) * self.wet_target;

            let read_pos = if self.write_pos >= self.delay_frames {
                self.write_pos - self.delay_frames
            } else {
                self.buffer_frames - (self.delay_frames - self.write_pos)
            };

            let delayed_l = self.buffer[read_pos * 2];
            let delayed_r = self.buffer[read_pos * 2 + 1];

            let write_idx = self.write_pos * 2;
            if self.enabled {
                self.buffer[write_idx] = Self::soft_saturate(frame[0] + delayed_l * self.feedback);
                self.buffer[write_idx + 1] =
                    Self::soft_saturate(frame[1] + delayed_r * self.feedback);
            } else {
                // Disabled: stop feeding input, let the tail decay
                self.buffer[write_idx] = delayed_l * self.feedback * 0.95;
                self.buffer[write_idx + 1] = delayed_r * self.feedback * 0.95;
            }

            // Wet-only: the dry samples are never attenuated
            let wet = self.level * self.wet_current;
            frame[0] += delayed_l * wet;
            frame[1] += delayed_r * wet;

            self.write_pos = (self.write_pos + 1) % self.buffer_frames;
        }
    }
}
