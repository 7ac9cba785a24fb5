use super::format::AudioFormat;
use super::frame::AudioFrame;
use anyhow::{Context, Result};
use std::fmt;

pub const HEADER_LEN: usize = 44;
const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Encode captured frames into a canonical 16-bit PCM WAV file.
///
/// The first frame decides the sample rate and channel count. Frames with a
/// different channel count are skipped. Returns `None` when there is nothing
/// to encode.
pub fn encode_wav(frames: &[AudioFrame]) -> Option<Vec<u8>> {
    let first = frames.first()?;
    let format = first.format();
    let channels = format.channels as usize;

    let mut planar: Vec<Vec<i16>> = vec![Vec::new(); channels];
    for (idx, frame) in frames.iter().enumerate() {
        if frame.channels() != format.channels {
            tracing::warn!(
                "Skipping frame {}: {} channels, expected {}",
                idx,
                frame.channels(),
                format.channels
            );
            continue;
        }
        for (ch, samples) in planar.iter_mut().enumerate() {
            samples.extend(frame.channel_i16(ch));
        }
    }

    let samples_per_channel = planar[0].len();
    if samples_per_channel == 0 {
        return None;
    }

    let Some((riff_len, data_len)) = samples_per_channel
        .checked_mul(format.block_align() as usize)
        .and_then(chunk_sizes)
    else {
        tracing::warn!(
            "Recording too long for a WAV file: {} samples per channel",
            samples_per_channel
        );
        return None;
    };

    let mut buf = Vec::with_capacity(HEADER_LEN + data_len as usize);
    write_header(&mut buf, format, riff_len, data_len);

    for i in 0..samples_per_channel {
        for samples in &planar {
            buf.extend_from_slice(&samples[i].to_le_bytes());
        }
    }

    tracing::debug!(
        "Encoded {} frames into {} bytes ({} Hz, {} ch)",
        frames.len(),
        buf.len(),
        format.sample_rate,
        format.channels
    );
    Some(buf)
}

/// RIFF chunk size and data chunk size for `data_len` payload bytes.
/// Both are 32-bit fields, so payloads that do not fit yield `None`.
fn chunk_sizes(data_len: usize) -> Option<(u32, u32)> {
    let data_len = u32::try_from(data_len).ok()?;
    let riff_len = data_len.checked_add((HEADER_LEN - 8) as u32)?;
    Some((riff_len, data_len))
}

fn write_header(buf: &mut Vec<u8>, format: AudioFormat, riff_len: u32, data_len: u32) {
    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&riff_len.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    buf.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    buf.extend_from_slice(&format.channels.to_le_bytes());
    buf.extend_from_slice(&format.sample_rate.to_le_bytes());
    buf.extend_from_slice(&format.byte_rate().to_le_bytes());
    buf.extend_from_slice(&format.block_align().to_le_bytes());
    buf.extend_from_slice(&AudioFormat::BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
}

/// Fields of the canonical 44-byte header written by [`encode_wav`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_len: u32,
}

impl WavHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header = bytes
            .get(..HEADER_LEN)
            .context("WAV data shorter than header")?;

        if &header[0..4] != b"RIFF" || &header[8..16] != b"WAVEfmt " || &header[36..40] != b"data"
        {
            anyhow::bail!("Not a canonical RIFF/WAVE file");
        }

        let format_code = read_u16(header, 20);
        if format_code != PCM_FORMAT {
            anyhow::bail!("Unsupported WAV format code {}", format_code);
        }

        let parsed = Self {
            channels: read_u16(header, 22),
            sample_rate: read_u32(header, 24),
            byte_rate: read_u32(header, 28),
            block_align: read_u16(header, 32),
            bits_per_sample: read_u16(header, 34),
            data_len: read_u32(header, 40),
        };

        let expected_align = parsed.channels as u32 * (parsed.bits_per_sample as u32 / 8);
        if parsed.block_align as u32 != expected_align {
            anyhow::bail!(
                "WAV block align {} does not match {} ch at {}-bit",
                parsed.block_align,
                parsed.channels,
                parsed.bits_per_sample
            );
        }

        let available = bytes.len() - HEADER_LEN;
        if parsed.data_len as usize > available {
            anyhow::bail!(
                "WAV header declares {} data bytes, only {} present",
                parsed.data_len,
                available
            );
        }

        Ok(parsed)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        self.data_len as f64 / self.byte_rate as f64
    }
}

impl fmt::Display for WavHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}-bit",
            self.sample_rate, self.channels, self.bits_per_sample
        )
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
