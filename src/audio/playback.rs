use anyhow::{Context, Result};
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr;

/// Speeds offered by the upload-and-playback mode
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PlaybackSpeed {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndAQuarter,
    OneAndAHalf,
}

impl PlaybackSpeed {
    pub fn factor(self) -> f32 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::ThreeQuarters => 0.75,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndAQuarter => 1.25,
            PlaybackSpeed::OneAndAHalf => 1.5,
        }
    }
}

impl FromStr for PlaybackSpeed {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches(['x', 'X']) {
            "0.5" => Ok(PlaybackSpeed::Half),
            "0.75" => Ok(PlaybackSpeed::ThreeQuarters),
            "1" | "1.0" => Ok(PlaybackSpeed::Normal),
            "1.25" => Ok(PlaybackSpeed::OneAndAQuarter),
            "1.5" => Ok(PlaybackSpeed::OneAndAHalf),
            _ => Err(anyhow::anyhow!(
                "speed must be one of: 0.5x, 0.75x, 1x, 1.25x, 1.5x"
            )),
        }
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub path: PathBuf,
    pub speed: PlaybackSpeed,
    pub looped: bool,
}

/// Play a file on the default output device until it ends
///
/// Looped playback only ends when the process is interrupted.
pub async fn play(request: PlaybackRequest) -> Result<()> {
    tokio::task::spawn_blocking(move || play_blocking(&request))
        .await
        .context("spawn_blocking failed")?
}

fn play_blocking(request: &PlaybackRequest) -> Result<()> {
    let file = File::open(&request.path)
        .with_context(|| format!("Failed to open audio file {:?}", request.path))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to decode {:?}", request.path))?;

    let stream_handle =
        OutputStreamBuilder::open_default_stream().context("Failed to open audio output")?;
    let sink = Sink::connect_new(stream_handle.mixer());
    sink.set_speed(request.speed.factor());

    if request.looped {
        sink.append(source.repeat_infinite());
    } else {
        sink.append(source);
    }

    tracing::info!(
        "Playing {:?} at {}{}",
        request.path,
        request.speed,
        if request.looped { " (looped)" } else { "" }
    );
    sink.sleep_until_end();

    Ok(())
}
