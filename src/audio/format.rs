// NOTE: Everything written to disk is 16-bit signed integer PCM.
// Capture may deliver f32 blocks; they are converted when the clip is encoded.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const BITS_PER_SAMPLE: u16 = 16;
    pub const BYTES_PER_SAMPLE: u16 = Self::BITS_PER_SAMPLE / 8;

    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Calculate number of samples (across all channels) for a given duration in seconds
    pub fn samples_for_duration(&self, seconds: f32) -> usize {
        (self.sample_rate as f32 * seconds) as usize * self.channels as usize
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.channels) * u32::from(Self::BYTES_PER_SAMPLE)
    }

    pub fn block_align(&self) -> u16 {
        self.channels * Self::BYTES_PER_SAMPLE
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_rates() {
        let format = AudioFormat::new(44100, 2);
        assert_eq!(format.byte_rate(), 176_400);
        assert_eq!(format.block_align(), 4);
    }

    #[test]
    fn test_samples_for_duration_counts_all_channels() {
        let format = AudioFormat::new(16000, 2);
        assert_eq!(format.samples_for_duration(0.5), 16000);
    }
}
