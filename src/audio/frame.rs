use super::format::AudioFormat;
use anyhow::Result;

/// Raw sample storage for one captured block
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    F32(Vec<f32>),
    I16(Vec<i16>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::F32(s) => s.len(),
            Samples::I16(s) => s.len(),
        }
    }
}

/// A block of captured audio stored planar (all of channel 0, then all of channel 1, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    format: AudioFormat,
    samples: Samples,
}

impl AudioFrame {
    pub fn planar(sample_rate: u32, channels: u16, samples: Samples) -> Result<Self> {
        if channels == 0 {
            anyhow::bail!("Audio frame must have at least one channel");
        }
        if samples.len() % channels as usize != 0 {
            anyhow::bail!(
                "Audio frame has {} samples, not a multiple of {} channels",
                samples.len(),
                channels
            );
        }

        Ok(Self {
            format: AudioFormat::new(sample_rate, channels),
            samples,
        })
    }

    /// Build a frame from interleaved hardware samples (l0 r0 l1 r1 ...)
    pub fn from_interleaved(sample_rate: u32, channels: u16, samples: Samples) -> Result<Self> {
        let samples = match samples {
            Samples::F32(s) => Samples::F32(deinterleave(&s, channels as usize)),
            Samples::I16(s) => Samples::I16(deinterleave(&s, channels as usize)),
        };
        Self::planar(sample_rate, channels, samples)
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    pub fn samples_per_channel(&self) -> usize {
        self.samples.len() / self.format.channels as usize
    }

    /// Samples of one channel, converted to 16-bit PCM
    pub fn channel_i16(&self, channel: usize) -> Vec<i16> {
        let n = self.samples_per_channel();
        let range = channel * n..(channel + 1) * n;
        match &self.samples {
            Samples::F32(s) => s[range].iter().copied().map(f32_to_i16).collect(),
            Samples::I16(s) => s[range].to_vec(),
        }
    }
}

/// Convert a float sample to 16-bit PCM.
///
/// The value is clamped to [-1.0, 1.0]. Positive values scale by `i16::MAX`,
/// negative values by `-(i16::MIN)`, and the product is truncated toward zero,
/// so 1.0 and -1.0 reach the two ends of the i16 range. NaN becomes 0.
pub fn f32_to_i16(sample: f32) -> i16 {
    let sample = sample.clamp(-1.0, 1.0);
    if sample >= 0.0 {
        (sample * i16::MAX as f32) as i16
    } else {
        (sample * -(i16::MIN as f32)) as i16
    }
}

fn deinterleave<T: Copy>(samples: &[T], channels: usize) -> Vec<T> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let frames = samples.len() / channels;
    let mut out = Vec::with_capacity(frames * channels);
    for ch in 0..channels {
        out.extend(samples.chunks_exact(channels).map(|block| block[ch]));
    }
    out
}

/// Frames accumulated during one recording session
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<AudioFrame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: AudioFrame) {
        self.frames.push(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Hand the accumulated frames over and leave the buffer empty
    pub fn take(&mut self) -> Vec<AudioFrame> {
        std::mem::take(&mut self.frames)
    }
}
