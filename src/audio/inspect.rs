use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "ogg"];

#[derive(Debug, Clone, PartialEq)]
pub struct WavDetails {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub duration_secs: f64,
}

/// What we can tell about an uploaded audio file
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFileInfo {
    pub name: String,
    pub extension: String,
    pub size_bytes: u64,
    pub wav: Option<WavDetails>,
}

impl AudioFileInfo {
    pub fn mime(&self) -> String {
        format!("audio/{}", self.extension)
    }
}

impl fmt::Display for AudioFileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {:.1} KB)",
            self.name,
            self.mime(),
            self.size_bytes as f64 / 1024.0
        )?;
        if let Some(wav) = &self.wav {
            write!(
                f,
                " - {} Hz, {} ch, {}-bit, {:.2}s",
                wav.sample_rate, wav.channels, wav.bits_per_sample, wav.duration_secs
            )?;
        }
        Ok(())
    }
}

pub fn accepted_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn inspect(path: &Path) -> Result<AudioFileInfo> {
    let extension = accepted_extension(path).with_context(|| {
        format!(
            "Unsupported audio file {:?}; expected one of: {}",
            path,
            ACCEPTED_EXTENSIONS.join(", ")
        )
    })?;

    let metadata =
        std::fs::metadata(path).with_context(|| format!("Failed to read {:?}", path))?;

    let wav = if extension == "wav" {
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to parse WAV file {:?}", path))?;
        let spec = reader.spec();
        Some(WavDetails {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            duration_secs: reader.duration() as f64 / spec.sample_rate as f64,
        })
    } else {
        None
    };

    Ok(AudioFileInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension,
        size_bytes: metadata.len(),
        wav,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    #[test]
    fn test_accepted_extension() {
        assert_eq!(accepted_extension(Path::new("a/b.WAV")).as_deref(), Some("wav"));
        assert_eq!(accepted_extension(Path::new("talk.m4a")).as_deref(), Some("m4a"));
        assert!(accepted_extension(Path::new("notes.txt")).is_none());
        assert!(accepted_extension(Path::new("noext")).is_none());
    }

    #[test]
    fn test_inspect_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..8000 * 2 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let info = inspect(&path).unwrap();
        assert_eq!(info.name, "clip.wav");
        assert_eq!(info.mime(), "audio/wav");

        let wav = info.wav.unwrap();
        assert_eq!(wav.channels, 2);
        assert_eq!(wav.sample_rate, 8000);
        assert!((wav.duration_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inspect_compressed_reports_size_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.mp3");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let info = inspect(&path).unwrap();
        assert_eq!(info.size_bytes, 2048);
        assert!(info.wav.is_none());
        assert_eq!(info.to_string(), "voice.mp3 (audio/mp3, 2.0 KB)");
    }

    #[test]
    fn test_inspect_rejects_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        assert!(inspect(&path).is_err());
    }
}
