//! Crackle/hiss noise bed with a one-shot generator
//!
//! The underlying noise generator is one-shot: once stopped it can never be
//! started again. Re-enabling the effect after a stop builds a brand new
//! generator instead of trying (and failing) to restart the old one.

/// Lifecycle of a one-shot noise generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OneShotState {
    /// Built but never started.
    #[default]
    Fresh,
    /// Producing noise.
    Started,
    /// Stopped; can never produce noise again.
    Exhausted,
}

/// One-shot noise source: pink-ish surface hiss, random clicks, scheduled
/// pops with decay.
struct NoiseGen {
    state: OneShotState,
    sample_rate: f32,

    // PRNG state (deterministic, no allocation)
    random_state: u64,

    // Surface noise filter state (pink-ish noise)
    filter_b0: f32,
    filter_b1: f32,
    filter_b2: f32,

    // Pop timing
    samples_until_next_pop: u32,
    current_pop_amplitude: f32,
    pop_decay: f32,

    // Per-sample click probability
    click_probability: f32,
}

impl NoiseGen {
    fn new(sample_rate: f32) -> Self {
        Self {
            state: OneShotState::Fresh,
            sample_rate,
            random_state: 0xDEADBEEF_CAFEBABE,
            filter_b0: 0.0,
            filter_b1: 0.0,
            filter_b2: 0.0,
            samples_until_next_pop: 0,
            current_pop_amplitude: 0.0,
            pop_decay: 0.0,
            click_probability: 0.0004,
        }
    }

    fn state(&self) -> OneShotState {
        self.state
    }

    /// Start producing noise. Only legal from `Fresh`; anything else is
    /// absorbed with a log line, never an error to the caller.
    fn start(&mut self) {
        match self.state {
            OneShotState::Fresh => {
                self.state = OneShotState::Started;
                self.schedule_next_pop();
            }
            OneShotState::Started => {
                tracing::debug!("crackle generator already started");
            }
            OneShotState::Exhausted => {
                tracing::debug!("attempt to restart an exhausted crackle generator");
            }
        }
    }

    /// Stop for good. Stopping twice is absorbed.
    fn stop(&mut self) {
        match self.state {
            OneShotState::Started | OneShotState::Fresh => {
                self.state = OneShotState::Exhausted;
            }
            OneShotState::Exhausted => {
                tracing::debug!("crackle generator stopped twice");
            }
        }
    }

    /// Random interval 0.5-5s until the next pop, with a 10-30ms decay.
    fn schedule_next_pop(&mut self) {
        let interval = 0.5 + self.next_random() * 4.5;
        self.samples_until_next_pop = (interval * self.sample_rate) as u32;
        let pop_duration = 0.01 + self.next_random() * 0.02;
        self.pop_decay = 1.0 - (1.0 / (pop_duration * self.sample_rate));
    }

    /// xorshift64 PRNG (no allocation, fast)
    #[inline]
    fn next_random(&mut self) -> f32 {
        self.random_state ^= self.random_state << 13;
        self.random_state ^= self.random_state >> 7;
        self.random_state ^= self.random_state << 17;
        (self.random_state as f32) / (u64::MAX as f32)
    }

    #[inline]
    fn white_noise(&mut self) -> f32 {
        self.next_random() * 2.0 - 1.0
    }

    /// Paul Kellet's economy pink noise filter.
    #[inline]
    fn pink_noise(&mut self) -> f32 {
        let white = self.white_noise();
        self.filter_b0 = 0.99886 * self.filter_b0 + white * 0.0555179;
        self.filter_b1 = 0.99332 * self.filter_b1 + white * 0.0750759;
        self.filter_b2 = 0.96900 * self.filter_b2 + white * 0.1538520;
        let pink = self.filter_b0 + self.filter_b1 + self.filter_b2 + white * 0.5362;
        pink * 0.11
    }

    /// Single mono noise sample; silent unless started.
    #[inline]
    fn sample(&mut self) -> f32 {
        if self.state != OneShotState::Started {
            return 0.0;
        }

        let mut output = self.pink_noise() * 0.010;

        // Random clicks
        if self.next_random() < self.click_probability {
            output += (self.next_random() - 0.5) * 2.0 * 0.03;
        }

        // Scheduled pops with decay
        if self.samples_until_next_pop == 0 {
            self.current_pop_amplitude = 0.05 * (0.5 + self.next_random() * 0.5);
            self.schedule_next_pop();
        } else {
            self.samples_until_next_pop -= 1;
        }
        if self.current_pop_amplitude > 0.0001 {
            output += self.current_pop_amplitude * (self.next_random() - 0.5);
            self.current_pop_amplitude *= self.pop_decay;
        }

        output
    }
}

/// The crackle effect: a noise bed added on top of the program signal.
pub struct Crackle {
    enabled: bool,
    sample_rate: f32,
    level: f32,
    generator: NoiseGen,
}

impl Crackle {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            enabled: false,
            sample_rate,
            level: 1.0,
            generator: NoiseGen::new(sample_rate),
        }
    }

    /// Enable or disable the noise bed, managing the one-shot generator:
    /// enabling out of `Exhausted` rebuilds a fresh generator, so at most one
    /// generator is ever live.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        if enabled {
            if self.generator.state() == OneShotState::Exhausted {
                self.generator = NoiseGen::new(self.sample_rate);
            }
            self.generator.start();
        } else {
            self.generator.stop();
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn generator_state(&self) -> OneShotState {
        self.generator.state()
    }

    /// Add the noise bed to a stereo interleaved buffer.
    pub fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }

        for frame in samples.chunks_mut(2) {
            let noise = self.generator.sample() * self.level;
            frame[0] += noise;
            if frame.len() > 1 {
                // Slight stereo variation for a more natural bed
                let variation = 1.0 + (self.generator.next_random() - 0.5) * 0.1;
                frame[1] += noise * variation;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_starts_fresh() {
        let crackle = Crackle::new(48000.0);
        assert_eq!(crackle.generator_state(), OneShotState::Fresh);
        assert!(!crackle.is_enabled());
    }

    #[test]
    fn enable_starts_disable_exhausts() {
        let mut crackle = Crackle::new(48000.0);
        crackle.set_enabled(true);
        assert_eq!(crackle.generator_state(), OneShotState::Started);

        crackle.set_enabled(false);
        assert_eq!(crackle.generator_state(), OneShotState::Exhausted);
    }

    #[test]
    fn reenabling_builds_a_fresh_generator() {
        let mut crackle = Crackle::new(48000.0);
        crackle.set_enabled(true);
        crackle.set_enabled(false);
        assert_eq!(crackle.generator_state(), OneShotState::Exhausted);

        // A stopped generator cannot restart; a new one must be live now.
        crackle.set_enabled(true);
        assert_eq!(crackle.generator_state(), OneShotState::Started);
    }

    #[test]
    fn double_stop_is_absorbed() {
        let mut gen = NoiseGen::new(48000.0);
        gen.start();
        gen.stop();
        gen.stop(); // must not panic
        assert_eq!(gen.state(), OneShotState::Exhausted);
    }

    #[test]
    fn exhausted_generator_is_silent() {
        let mut gen = NoiseGen::new(48000.0);
        gen.start();
        gen.stop();
        for _ in 0..1000 {
            assert_eq!(gen.sample(), 0.0);
        }
    }

    #[test]
    fn enabled_bed_adds_signal() {
        let mut crackle = Crackle::new(48000.0);
        crackle.set_enabled(true);

        let mut samples = vec![0.0f32; 48000];
        crackle.process(&mut samples);
        let non_zero = samples.iter().filter(|&&s| s != 0.0).count();
        assert!(non_zero > 0);
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn disabled_bed_is_transparent() {
        let mut crackle = Crackle::new(48000.0);
        let mut samples = vec![0.1f32; 64];
        crackle.process(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.1));
    }
}
