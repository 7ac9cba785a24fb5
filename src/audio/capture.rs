use super::format::AudioFormat;
use super::frame::{AudioFrame, Samples};
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use ringbuf::{HeapRb, traits::*};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, mpsc};

/// Wakeups from the audio callback plus the stop request from the guard
#[derive(Default)]
struct CaptureSignal {
    notify: Notify,
    stopped: AtomicBool,
}

impl CaptureSignal {
    fn wake(&self) {
        self.notify.notify_one();
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Keeps capture running; dropping it stops the stream and flushes the
/// remaining samples as a final frame
pub struct CaptureGuard {
    stream: Option<cpal::Stream>,
    signal: Arc<CaptureSignal>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        // The callback must be gone before the bridge task reads the tail
        self.stream.take();
        self.signal.stop();
    }
}

pub struct AudioCapture;

impl AudioCapture {
    /// Start audio capture from the default input device
    ///
    /// Captured blocks are sent as planar `AudioFrame`s via frame_tx. The
    /// returned guard must be kept alive for capture to continue. Once it is
    /// dropped the sender is released after the last frame is sent.
    pub fn start(format: AudioFormat, frame_tx: mpsc::Sender<AudioFrame>) -> Result<CaptureGuard> {
        let ring = HeapRb::<f32>::new(format.samples_for_duration(60.0));
        let (mut producer, consumer) = ring.split();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No input audio device available")?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let signal = Arc::new(CaptureSignal::default());
        let signal_callback = signal.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                    signal_callback.wake();
                },
                move |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .context("Failed to build input stream")?;

        stream.play().context("Failed to start audio stream")?;

        let chunk_size = format.samples_for_duration(0.5);
        tokio::task::spawn_local(Self::bridge_task(
            consumer,
            frame_tx,
            format,
            chunk_size,
            signal.clone(),
        ));

        tracing::info!(
            "Audio capture started ({} Hz, {} ch)",
            format.sample_rate,
            format.channels
        );
        Ok(CaptureGuard {
            stream: Some(stream),
            signal,
        })
    }

    async fn bridge_task(
        mut consumer: impl Consumer<Item = f32>,
        tx: mpsc::Sender<AudioFrame>,
        format: AudioFormat,
        chunk_size: usize,
        signal: Arc<CaptureSignal>,
    ) {
        let channels = format.channels as usize;

        loop {
            signal.notify.notified().await;
            let stopped = signal.is_stopped();

            while consumer.occupied_len() >= chunk_size {
                if !Self::forward(&mut consumer, &tx, format, chunk_size).await {
                    return;
                }
            }

            if stopped {
                let available = consumer.occupied_len();
                let tail = available - available % channels;
                if tail > 0 {
                    Self::forward(&mut consumer, &tx, format, tail).await;
                }
                tracing::debug!("Capture bridge: flushed {} tail samples", tail);
                return;
            }
        }
    }

    /// Pop `len` samples and send them as one frame; false once the receiver is gone
    async fn forward(
        consumer: &mut impl Consumer<Item = f32>,
        tx: &mpsc::Sender<AudioFrame>,
        format: AudioFormat,
        len: usize,
    ) -> bool {
        let mut chunk = vec![0.0f32; len];
        let n = consumer.pop_slice(&mut chunk);
        chunk.truncate(n);

        match AudioFrame::from_interleaved(format.sample_rate, format.channels, Samples::F32(chunk))
        {
            Ok(frame) => tx.send(frame).await.is_ok(),
            Err(e) => {
                tracing::warn!("Dropping captured block: {}", e);
                true
            }
        }
    }
}
