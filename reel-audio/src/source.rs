//! Live tape source node

use std::sync::Arc;

/// One live playback source.
///
/// A source is bound to a single buffer for its lifetime: forward playback
/// binds the forward buffer, reverse playback the frame-reversed one.
/// Changing direction therefore always means tearing this node down and
/// building a new one; only the rate can change in place.
pub struct TapeSource {
    buffer: Arc<Vec<f32>>,
    /// Cursor in frames; fractional for rate-scaled playback.
    cursor: f64,
    rate: f64,
}

impl TapeSource {
    pub fn new(buffer: Arc<Vec<f32>>, sample_rate: u32, offset_secs: f64, rate: f64) -> Self {
        let frames = (buffer.len() / 2) as f64;
        let cursor = (offset_secs * sample_rate as f64).clamp(0.0, frames);
        Self {
            buffer,
            cursor,
            rate: rate.max(0.0),
        }
    }

    /// Update the playback rate in place. Unlike direction, this never
    /// requires a rebuild.
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.max(0.0);
    }

    /// True once the cursor has run off the end of the buffer.
    pub fn exhausted(&self) -> bool {
        self.cursor as usize + 1 >= self.buffer.len() / 2
    }

    /// Mix this source into `out` (interleaved stereo), advancing the cursor
    /// by `rate` frames per output frame. Linear interpolation smooths
    /// non-integer cursor positions.
    pub fn render(&mut self, out: &mut [f32]) {
        let frames = self.buffer.len() / 2;

        for frame in out.chunks_mut(2) {
            if frame.len() < 2 {
                break;
            }
            let pos = self.cursor as usize;
            if pos + 1 >= frames {
                break;
            }

            let frac = (self.cursor - pos as f64) as f32;
            let i = pos * 2;
            let l0 = self.buffer[i];
            let r0 = self.buffer[i + 1];
            let (l1, r1) = if pos + 2 < frames {
                (self.buffer[i + 2], self.buffer[i + 3])
            } else {
                (l0, r0)
            };

            frame[0] += l0 + frac * (l1 - l0);
            frame[1] += r0 + frac * (r1 - r0);

            self.cursor += self.rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(frames: usize) -> Arc<Vec<f32>> {
        let mut v = Vec::with_capacity(frames * 2);
        for f in 0..frames {
            v.push(f as f32);
            v.push(-(f as f32));
        }
        Arc::new(v)
    }

    #[test]
    fn renders_from_offset() {
        let mut src = TapeSource::new(ramp_buffer(100), 100, 0.1, 1.0);
        let mut out = vec![0.0f32; 4];
        src.render(&mut out);
        // Offset 0.1s at 100Hz = frame 10.
        assert_eq!(out[0], 10.0);
        assert_eq!(out[1], -10.0);
        assert_eq!(out[2], 11.0);
    }

    #[test]
    fn rate_scales_cursor_advance() {
        let mut src = TapeSource::new(ramp_buffer(100), 100, 0.0, 2.0);
        let mut out = vec![0.0f32; 6];
        src.render(&mut out);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[2], 2.0);
        assert_eq!(out[4], 4.0);
    }

    #[test]
    fn exhausted_source_leaves_silence() {
        let mut src = TapeSource::new(ramp_buffer(4), 100, 10.0, 1.0);
        let mut out = vec![0.0f32; 8];
        src.render(&mut out);
        assert!(src.exhausted());
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn fractional_cursor_interpolates() {
        let mut src = TapeSource::new(ramp_buffer(100), 100, 0.0, 0.5);
        let mut out = vec![0.0f32; 4];
        src.render(&mut out);
        assert_eq!(out[0], 0.0);
        assert!((out[2] - 0.5).abs() < 1e-6);
    }
}
