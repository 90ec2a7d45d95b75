//! Reel loading and decoding

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Errors that can occur while loading a reel. Any of these is fatal to
/// initialization: the deck must not come up half-loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no audio track found in {0}")]
    NoAudioTrack(PathBuf),
    #[error("decode error in {path}: {detail}")]
    Decode { path: PathBuf, detail: String },
    #[error("{0} decoded to zero frames")]
    Empty(PathBuf),
}

/// A decoded reel: the forward sample buffer plus a precomputed
/// frame-reversed copy for reverse playback.
///
/// Immutable after load. A live source node's buffer is fixed for its
/// lifetime, so reverse playback always binds to `reversed` rather than
/// stepping the forward buffer backwards.
pub struct AudioAsset {
    key: String,
    samples: Arc<Vec<f32>>,
    reversed: Arc<Vec<f32>>,
    sample_rate: u32,
    duration_secs: f64,
}

impl AudioAsset {
    /// Build an asset from interleaved stereo samples.
    pub fn from_samples(key: impl Into<String>, mut samples: Vec<f32>, sample_rate: u32) -> Self {
        // Force whole stereo frames.
        if samples.len() % 2 != 0 {
            samples.pop();
        }

        let mut reversed = Vec::with_capacity(samples.len());
        for frame in samples.chunks_exact(2).rev() {
            reversed.push(frame[0]);
            reversed.push(frame[1]);
        }

        let frames = samples.len() / 2;
        let duration_secs = if sample_rate == 0 {
            0.0
        } else {
            frames as f64 / sample_rate as f64
        };

        Self {
            key: key.into(),
            samples: Arc::new(samples),
            reversed: Arc::new(reversed),
            sample_rate,
            duration_secs,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Forward playback buffer (interleaved stereo).
    pub fn forward(&self) -> Arc<Vec<f32>> {
        self.samples.clone()
    }

    /// Frame-reversed playback buffer (interleaved stereo).
    pub fn reversed(&self) -> Arc<Vec<f32>> {
        self.reversed.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }
}

/// Reel file loader using Symphonia, resampling to the engine rate.
pub struct TapeLoader {
    target_sample_rate: u32,
}

impl TapeLoader {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Load and decode every entry; fails fast on the first error so the
    /// caller never observes a partially-ready asset set.
    pub fn load_set(
        &self,
        entries: &[(String, PathBuf)],
    ) -> Result<HashMap<String, Arc<AudioAsset>>, LoadError> {
        let mut assets = HashMap::with_capacity(entries.len());
        for (key, path) in entries {
            let asset = self.load(key, path)?;
            assets.insert(key.clone(), Arc::new(asset));
        }
        Ok(assets)
    }

    /// Load and decode a single reel.
    pub fn load(&self, key: &str, path: &Path) -> Result<AudioAsset, LoadError> {
        let (samples, source_rate, channels) = self.decode(path)?;

        let stereo = interleave_stereo(&samples, channels);
        let stereo = if source_rate != self.target_sample_rate {
            self.resample(&stereo, source_rate, path)?
        } else {
            stereo
        };

        if stereo.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        tracing::info!(
            key,
            path = %path.display(),
            frames = stereo.len() / 2,
            "reel loaded"
        );
        Ok(AudioAsset::from_samples(key, stereo, self.target_sample_rate))
    }

    /// Decode a file to interleaved f32 at its native rate and channel count.
    fn decode(&self, path: &Path) -> Result<(Vec<f32>, u32, usize), LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Decode {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| LoadError::NoAudioTrack(path.to_path_buf()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let source_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(_) => continue,
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            let mut sample_buf = SampleBuffer::<f32>::new(capacity, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        Ok((samples, source_rate, channels))
    }

    /// Resample interleaved stereo audio to the target sample rate.
    fn resample(&self, samples: &[f32], source_rate: u32, path: &Path) -> Result<Vec<f32>, LoadError> {
        use rubato::{FftFixedInOut, Resampler};

        let frames = samples.len() / 2;
        let mut resampler =
            FftFixedInOut::<f32>::new(source_rate as usize, self.target_sample_rate as usize, 1024, 2)
                .map_err(|e| LoadError::Decode {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?;

        // Deinterleave
        let deinterleaved: Vec<Vec<f32>> = (0..2)
            .map(|ch| (0..frames).map(|f| samples[f * 2 + ch]).collect())
            .collect();

        let chunk_size = resampler.input_frames_next();
        let mut output: Vec<Vec<f32>> = vec![Vec::new(); 2];

        let mut pos = 0;
        while pos + chunk_size <= frames {
            let input_refs: Vec<&[f32]> = deinterleaved
                .iter()
                .map(|ch| &ch[pos..pos + chunk_size])
                .collect();

            let resampled = resampler
                .process(&input_refs, None)
                .map_err(|e| LoadError::Decode {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?;

            for (ch, data) in resampled.into_iter().enumerate() {
                output[ch].extend(data);
            }

            pos += chunk_size;
        }

        // Tail: pad the final partial chunk with zeros, keep the
        // proportional amount of output.
        if pos < frames {
            let remaining = frames - pos;
            let padded: Vec<Vec<f32>> = deinterleaved
                .iter()
                .map(|ch| {
                    let mut v = ch[pos..].to_vec();
                    v.resize(chunk_size, 0.0);
                    v
                })
                .collect();

            let input_refs: Vec<&[f32]> = padded.iter().map(|v| v.as_slice()).collect();
            if let Ok(resampled) = resampler.process(&input_refs, None) {
                let keep = (remaining * self.target_sample_rate as usize) / source_rate as usize;
                for (ch, data) in resampled.into_iter().enumerate() {
                    output[ch].extend(&data[..keep.min(data.len())]);
                }
            }
        }

        // Reinterleave
        let output_frames = output[0].len().min(output[1].len());
        let mut interleaved = Vec::with_capacity(output_frames * 2);
        for frame in 0..output_frames {
            interleaved.push(output[0][frame]);
            interleaved.push(output[1][frame]);
        }

        Ok(interleaved)
    }
}

/// Convert decoded audio of any channel count to interleaved stereo.
fn interleave_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => {
            let mut out = Vec::with_capacity(samples.len() * 2);
            for &s in samples {
                out.push(s);
                out.push(s);
            }
            out
        }
        2 => samples.to_vec(),
        n => {
            // Keep the first two channels of multichannel material.
            let frames = samples.len() / n;
            let mut out = Vec::with_capacity(frames * 2);
            for f in 0..frames {
                out.push(samples[f * n]);
                out.push(samples[f * n + 1]);
            }
            out
        }
    }
}
