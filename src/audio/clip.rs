use super::wav::WavHeader;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const MAX_NAME_SUFFIX: u32 = 99;

/// A finished recording: encoded WAV bytes and the moment capture ended
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub wav: Vec<u8>,
    pub captured_at: DateTime<Local>,
}

impl Clip {
    pub fn new(wav: Vec<u8>, captured_at: DateTime<Local>) -> Self {
        Self { wav, captured_at }
    }

    /// Download name, e.g. `recording_142503.wav`
    pub fn file_name(&self) -> String {
        format!("recording_{}.wav", self.captured_at.format("%H%M%S"))
    }

    pub fn header(&self) -> Option<WavHeader> {
        WavHeader::parse(&self.wav).ok()
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.header().map(|h| h.duration_secs())
    }

    /// Write the clip into `dir` under its download name.
    ///
    /// The bytes go to a temp file in the same directory first and are then
    /// renamed into place, so a reader never sees a half-written WAV. An
    /// existing file is never replaced: a clash picks `recording_HHMMSS_1.wav`,
    /// `_2` and so on.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create recordings directory: {:?}", dir))?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("recstudio-")
            .suffix(".wav")
            .tempfile_in(dir)
            .context("Failed to create temp file")?;

        temp_file
            .write_all(&self.wav)
            .context("Failed to write recording")?;

        for attempt in 0..=MAX_NAME_SUFFIX {
            let path = dir.join(self.numbered_name(attempt));
            match temp_file.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::info!("Recording saved to {:?}", path);
                    return Ok(path);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("{:?} already exists, trying next name", path);
                    temp_file = e.file;
                }
                Err(e) => {
                    return Err(e.error)
                        .with_context(|| format!("Failed to save recording to {:?}", path));
                }
            }
        }

        anyhow::bail!(
            "Failed to save recording: {} and {} numbered variants already exist in {:?}",
            self.file_name(),
            MAX_NAME_SUFFIX,
            dir
        )
    }

    fn numbered_name(&self, n: u32) -> String {
        if n == 0 {
            return self.file_name();
        }
        format!("recording_{}_{}.wav", self.captured_at.format("%H%M%S"), n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::{AudioFrame, Samples};
    use crate::audio::wav::{HEADER_LEN, encode_wav};
    use chrono::TimeZone;

    fn sample_clip() -> Clip {
        let frame = AudioFrame::planar(8000, 1, Samples::F32(vec![0.0; 8000])).unwrap();
        let captured_at = Local.with_ymd_and_hms(2024, 3, 9, 14, 25, 3).unwrap();
        Clip::new(encode_wav(&[frame]).unwrap(), captured_at)
    }

    #[test]
    fn test_file_name_from_timestamp() {
        assert_eq!(sample_clip().file_name(), "recording_142503.wav");
    }

    #[test]
    fn test_duration() {
        let duration = sample_clip().duration_secs().unwrap();
        assert!((duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_save_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("recordings");

        let clip = sample_clip();
        let path = clip.save_to(&target).unwrap();

        assert_eq!(path, target.join("recording_142503.wav"));
        assert_eq!(std::fs::read(&path).unwrap(), clip.wav);
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 1);
    }

    #[test]
    fn test_save_to_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = sample_clip();
        let mut second = sample_clip();
        second.wav.truncate(HEADER_LEN);

        let first_path = first.save_to(dir.path()).unwrap();
        let second_path = second.save_to(dir.path()).unwrap();
        let third_path = first.save_to(dir.path()).unwrap();

        assert_eq!(first_path, dir.path().join("recording_142503.wav"));
        assert_eq!(second_path, dir.path().join("recording_142503_1.wav"));
        assert_eq!(third_path, dir.path().join("recording_142503_2.wav"));
        assert_eq!(std::fs::read(&first_path).unwrap(), first.wav);
        assert_eq!(std::fs::read(&second_path).unwrap(), second.wav);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_header_reports_format() {
        let header = sample_clip().header().unwrap();
        assert_eq!(header.to_string(), "8000 Hz, 1 ch, 16-bit");
        assert!(Clip::new(vec![1, 2, 3], Local::now()).header().is_none());
    }
}
