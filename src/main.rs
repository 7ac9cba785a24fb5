mod analysis;
mod audio;
mod bridge;
mod config;
mod messages;
mod services;
mod session;

use audio::{PlaybackRequest, PlaybackSpeed};
use bridge::{CapturePayload, Mailbox};
use clap::{Parser, Subcommand};
use config::Config;
use messages::StudioState;
use services::{MicrophoneSource, RecorderHandle};
use session::{MonitorStatus, StudioSession, StudioView};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

/// Recruitment studio: record interview clips, play uploads, triage résumés
#[derive(Parser)]
#[command(name = "recstudio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (default: ~/.config/recstudio/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record from the default microphone; press Enter to start/stop, q to quit
    Record {
        /// Also write the capture payload JSON of the last clip here
        #[arg(long)]
        payload_out: Option<PathBuf>,
    },

    /// Decode a capture payload JSON file and save the clip
    Import {
        payload: PathBuf,
    },

    /// Play an audio file (mp3, wav, m4a, ogg)
    Play {
        file: PathBuf,

        /// Playback speed: 0.5x, 0.75x, 1x, 1.25x or 1.5x
        #[arg(long, default_value = "1x")]
        speed: PlaybackSpeed,

        /// Repeat until interrupted
        #[arg(long = "loop")]
        looped: bool,
    },

    /// Show format details of an audio file
    Inspect {
        file: PathBuf,
    },

    /// Run résumé analysis over pdf, docx or txt files
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show monitoring status and audio preferences
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Record { payload_out } => {
            // LocalSet for !Send futures (the recorder holds cpal::Stream)
            let local = tokio::task::LocalSet::new();
            local
                .run_until(async move { run_studio(&config, payload_out.as_deref()).await })
                .await
        }
        Commands::Import { payload } => import_payload(&config, &payload),
        Commands::Play {
            file,
            speed,
            looped,
        } => {
            let info = audio::inspect::inspect(&file)?;
            println!("Playing {} at {}{}", info, speed, if looped { " with loop" } else { "" });
            audio::playback::play(PlaybackRequest {
                path: file,
                speed,
                looped,
            })
            .await
        }
        Commands::Inspect { file } => {
            println!("{}", audio::inspect::inspect(&file)?);
            Ok(())
        }
        Commands::Analyze { files } => run_analysis(&config, &files).await,
        Commands::Status => {
            print_status(&config);
            Ok(())
        }
    }
}

async fn run_studio(config: &Config, payload_out: Option<&Path>) -> Result<()> {
    // Observable studio state
    let (state_tx, _state_rx) = watch::channel(StudioState::Idle);

    let mailbox = Arc::new(Mailbox::new());
    let recorder =
        services::spawn_recorder(config.audio_format(), MicrophoneSource, mailbox.clone());
    let mut session = StudioSession::new(mailbox);

    println!("{}", MonitorStatus::from_config(config).describe());
    println!("Press Enter to start recording, Enter again to stop, q to quit.");
    render(&session.evaluate(false), config, payload_out)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tracing::debug!("Studio loop: waiting for input");
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().eq_ignore_ascii_case("q") {
                    break;
                }

                if let Err(e) = handle_toggle(&state_tx, &recorder).await {
                    tracing::error!("Error handling toggle: {}", e);
                }

                let playing = *state_tx.borrow() == StudioState::Recording;
                render(&session.evaluate(playing), config, payload_out)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    if *state_tx.borrow() == StudioState::Recording {
        recorder.stop().await?;
        render(&session.evaluate(false), config, payload_out)?;
    }

    tracing::info!("Studio shutdown complete");
    Ok(())
}

async fn handle_toggle(
    state: &watch::Sender<StudioState>,
    recorder: &RecorderHandle,
) -> Result<()> {
    let current_state = state.borrow().clone();
    tracing::debug!("handle_toggle: current state = {:?}", current_state);

    match current_state {
        StudioState::Idle => {
            tracing::info!("Starting recording");
            state.send(StudioState::Recording)?;
            recorder.start().await?;
        }

        StudioState::Recording => {
            tracing::info!("Stopping recording");
            state.send(StudioState::Processing)?;

            let result = recorder.stop().await;
            state.send(StudioState::Idle)?;

            let posted = result?;
            tracing::debug!("handle_toggle: clip posted = {}", posted);
        }

        StudioState::Processing => {
            tracing::debug!("Already processing, ignoring toggle");
        }
    }

    Ok(())
}

fn render(view: &StudioView, config: &Config, payload_out: Option<&Path>) -> Result<()> {
    match view {
        StudioView::Recording => println!("Recording... your voice is being captured."),
        StudioView::ClipReady(clip) => {
            let path = clip.save_to(&config.recordings_dir)?;
            match clip.header() {
                Some(header) => println!(
                    "Recording finished! {:.1}s ({}) saved to {}",
                    header.duration_secs(),
                    header,
                    path.display()
                ),
                None => println!("Recording finished! Saved to {}", path.display()),
            }

            if let Some(out) = payload_out {
                std::fs::write(out, CapturePayload::from_clip(clip).to_json())
                    .with_context(|| format!("Failed to write payload to {:?}", out))?;
            }
        }
        StudioView::NothingCaptured => println!(
            "Could not generate the file. Check that the microphone is available."
        ),
        StudioView::Showing(clip) => println!("Last recording: {}", clip.file_name()),
        StudioView::Empty => println!("No recording available yet."),
    }
    Ok(())
}

fn import_payload(config: &Config, payload: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(payload)
        .with_context(|| format!("Failed to read payload file: {:?}", payload))?;

    match bridge::decode_payload(&raw) {
        Some(clip) => {
            let path = clip.save_to(&config.recordings_dir)?;
            println!("Imported recording to {}", path.display());
        }
        None => println!("No recording available in {}", payload.display()),
    }
    Ok(())
}

async fn run_analysis(config: &Config, files: &[PathBuf]) -> Result<()> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        if !analysis::document::Document::is_supported(path) {
            tracing::warn!(
                "Skipping {:?}: expected one of {}",
                path,
                analysis::document::ACCEPTED_EXTENSIONS.join(", ")
            );
            continue;
        }
        documents.push(analysis::Document::load(path)?);
    }

    if documents.is_empty() {
        println!("No files uploaded yet.");
        return Ok(());
    }

    let analyzer = analysis::select_analyzer(config);
    if analyzer.is_simulated() {
        println!("No agent service configured (set api_key). Showing a simulation below.");
    }

    let request = analysis::AnalysisRequest::from_config(config);
    let reports = analysis::run_batch(analyzer.as_ref(), &documents, &request).await;

    for report in &reports {
        let label = if report.simulated { " (simulated)" } else { "" };
        println!("### Result: {}{}", report.file_name, label);
        match &report.body {
            Ok(text) => println!("{}", text),
            Err(e) => println!("Analysis failed: {}", e),
        }
        println!();
    }

    println!("Uploaded files");
    for document in &documents {
        println!("{}", document.listing());
    }
    Ok(())
}

fn print_status(config: &Config) {
    println!("{}", MonitorStatus::from_config(config).describe());
    println!("Microphone level: {}%", config.input_level);
    println!("Speaker level: {}%", config.output_level);
    println!("Max latency: {} ms", config.max_latency_ms);
    println!(
        "Capture format: {} Hz, {} ch, {}-bit",
        config.sample_rate,
        config.channels,
        audio::AudioFormat::BITS_PER_SAMPLE
    );
    println!("Recordings directory: {}", config.recordings_dir.display());
}
