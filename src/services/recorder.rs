use crate::audio::capture::CaptureGuard;
use crate::audio::{AudioCapture, AudioFormat, AudioFrame, Clip, FrameBuffer, encode_wav};
use crate::bridge::{CapturePayload, Mailbox};
use crate::messages::RecorderCommand;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound on waiting for capture to hand over its last frames
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Where captured frames come from
///
/// The live implementation opens a cpal stream; the returned guard keeps
/// capture running until it is dropped. Every sender handed to `start` must
/// be released once the guard is gone, after any final frames are sent.
pub trait FrameSource {
    type Guard;

    fn start(&mut self, format: AudioFormat, tx: mpsc::Sender<AudioFrame>) -> Result<Self::Guard>;
}

pub struct MicrophoneSource;

impl FrameSource for MicrophoneSource {
    type Guard = CaptureGuard;

    fn start(&mut self, format: AudioFormat, tx: mpsc::Sender<AudioFrame>) -> Result<CaptureGuard> {
        AudioCapture::start(format, tx)
    }
}

/// Coordinates audio capture and encoding
///
/// This service:
/// - Manages the capture lifecycle
/// - Accumulates captured frames for the current recording
/// - Encodes the recording on stop and posts it to the mailbox as a payload
///
/// Note: the live source holds cpal::Stream which is !Send, so this service
/// must be spawned on a LocalSet using tokio::task::spawn_local.
pub struct Recorder<S: FrameSource> {
    format: AudioFormat,
    source: S,
    cmd_rx: mpsc::Receiver<RecorderCommand>,
    frame_rx: mpsc::Receiver<AudioFrame>,
    frame_tx: mpsc::Sender<AudioFrame>,
    frames: FrameBuffer,
    mailbox: Arc<Mailbox<String>>,
    guard: Option<S::Guard>,
    recording: bool,
}

impl<S: FrameSource> Recorder<S> {
    pub fn new(
        format: AudioFormat,
        source: S,
        cmd_rx: mpsc::Receiver<RecorderCommand>,
        mailbox: Arc<Mailbox<String>>,
    ) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(100);
        Self {
            format,
            source,
            cmd_rx,
            frame_rx,
            frame_tx,
            frames: FrameBuffer::new(),
            mailbox,
            guard: None,
            recording: false,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }

                Some(frame) = self.frame_rx.recv(), if self.recording => {
                    self.frames.push(frame);
                }
            }
        }
        tracing::debug!("Recorder: command channel closed, exiting");
    }

    async fn handle_command(&mut self, cmd: RecorderCommand) {
        match cmd {
            RecorderCommand::Start => {
                if self.recording {
                    tracing::debug!("Already recording, ignoring start");
                    return;
                }

                // A new recording discards anything the studio has not picked up yet
                self.frames.clear();
                self.mailbox.clear();

                match self.source.start(self.format, self.frame_tx.clone()) {
                    Ok(guard) => {
                        self.guard = Some(guard);
                        self.recording = true;
                        tracing::info!("Recording started");
                    }
                    Err(e) => {
                        tracing::error!("Failed to start capture: {}", e);
                    }
                }
            }

            RecorderCommand::Stop(reply) => {
                self.recording = false;

                // Swap in a fresh channel; the old one closes once capture
                // has released its sender
                let (frame_tx, frame_rx) = mpsc::channel(100);
                self.frame_tx = frame_tx;
                let mut pending_rx = std::mem::replace(&mut self.frame_rx, frame_rx);

                // Drop the guard to stop audio capture and flush the tail
                self.guard = None;

                let frames = &mut self.frames;
                let drain = async {
                    while let Some(frame) = pending_rx.recv().await {
                        frames.push(frame);
                    }
                };
                if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
                    tracing::warn!("Capture did not release its frames in time, encoding what arrived");
                }

                let frames = self.frames.take();
                tracing::debug!("Recorder: encoding {} frames", frames.len());

                let posted = match encode_wav(&frames) {
                    Some(wav) => {
                        let clip = Clip::new(wav, chrono::Local::now());
                        let payload = CapturePayload::from_clip(&clip);
                        self.mailbox.post(payload.to_json());
                        true
                    }
                    None => {
                        tracing::warn!("Recording stopped with no audio captured");
                        false
                    }
                };

                let _ = reply.send(Ok(posted));

                tracing::info!("Recording stopped");
            }
        }
    }
}

/// Handle for communicating with the Recorder
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<RecorderCommand>,
}

impl RecorderHandle {
    pub fn new(tx: mpsc::Sender<RecorderCommand>) -> Self {
        Self { tx }
    }

    pub async fn start(&self) -> Result<()> {
        self.tx
            .send(RecorderCommand::Start)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send start command: {}", e))
    }

    pub async fn stop(&self) -> Result<bool> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(RecorderCommand::Stop(reply))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send stop command: {}", e))?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive stop response: {}", e))?
    }
}

/// Spawn a recorder on the current LocalSet and return its handle
pub fn spawn_recorder<S>(format: AudioFormat, source: S, mailbox: Arc<Mailbox<String>>) -> RecorderHandle
where
    S: FrameSource + 'static,
    S::Guard: 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(10);
    let recorder = Recorder::new(format, source, cmd_rx, mailbox);
    tokio::task::spawn_local(recorder.run());
    RecorderHandle::new(cmd_tx)
}
