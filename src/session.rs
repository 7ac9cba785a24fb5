//! Per-session studio context.
//!
//! The studio re-evaluates after every user interaction. Everything that must
//! survive between passes lives in [`StudioSession`] and is handed to each pass
//! explicitly.

use crate::audio::Clip;
use crate::bridge::{Mailbox, decode_payload};
use crate::config::Config;
use std::sync::Arc;

/// What one evaluation pass shows
#[derive(Debug, Clone, PartialEq)]
pub enum StudioView {
    /// Capture is running
    Recording,
    /// A recording just finished and decoded cleanly
    ClipReady(Clip),
    /// A recording just finished but produced nothing usable
    NothingCaptured,
    /// Idle, still holding the last finished clip
    Showing(Clip),
    /// Idle, nothing recorded yet
    Empty,
}

pub struct StudioSession {
    mailbox: Arc<Mailbox<String>>,
    was_streaming: bool,
    recorded: Option<Clip>,
}

impl StudioSession {
    pub fn new(mailbox: Arc<Mailbox<String>>) -> Self {
        Self {
            mailbox,
            was_streaming: false,
            recorded: None,
        }
    }

    /// Run one evaluation pass given whether capture is currently playing
    pub fn evaluate(&mut self, playing: bool) -> StudioView {
        if playing {
            if !self.was_streaming {
                tracing::debug!("Session: recording began, dropping previous clip");
            }
            self.was_streaming = true;
            self.recorded = None;
            return StudioView::Recording;
        }

        if self.was_streaming {
            self.was_streaming = false;
            self.recorded = self.mailbox.take().and_then(|raw| decode_payload(&raw));

            return match &self.recorded {
                Some(clip) => StudioView::ClipReady(clip.clone()),
                None => StudioView::NothingCaptured,
            };
        }

        match &self.recorded {
            Some(clip) => StudioView::Showing(clip.clone()),
            None => StudioView::Empty,
        }
    }
}

/// Which audio sources are being monitored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Both,
    InputOnly,
    OutputOnly,
    Disabled,
}

impl MonitorStatus {
    pub fn from_config(config: &Config) -> Self {
        match (config.monitor_input, config.monitor_output) {
            (true, true) => MonitorStatus::Both,
            (true, false) => MonitorStatus::InputOnly,
            (false, true) => MonitorStatus::OutputOnly,
            (false, false) => MonitorStatus::Disabled,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            MonitorStatus::Both => "Monitoring audio input and output.",
            MonitorStatus::InputOnly => "Monitoring the microphone only.",
            MonitorStatus::OutputOnly => "Monitoring the speakers only.",
            MonitorStatus::Disabled => "No audio source enabled.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::Samples;
    use crate::audio::{AudioFrame, encode_wav};
    use crate::bridge::CapturePayload;
    use chrono::{Local, TimeZone};

    fn posted_clip(mailbox: &Mailbox<String>) -> Clip {
        let frame = AudioFrame::planar(8000, 1, Samples::I16(vec![1, 2, 3])).unwrap();
        let clip = Clip::new(
            encode_wav(&[frame]).unwrap(),
            Local.with_ymd_and_hms(2024, 6, 2, 10, 30, 0).unwrap(),
        );
        mailbox.post(CapturePayload::from_clip(&clip).to_json());
        clip
    }

    #[test]
    fn test_idle_session_is_empty() {
        let mut session = StudioSession::new(Arc::new(Mailbox::new()));
        assert_eq!(session.evaluate(false), StudioView::Empty);
    }

    #[test]
    fn test_record_then_stop_picks_up_clip() {
        let mailbox = Arc::new(Mailbox::new());
        let mut session = StudioSession::new(mailbox.clone());

        assert_eq!(session.evaluate(true), StudioView::Recording);
        let clip = posted_clip(&mailbox);

        assert_eq!(session.evaluate(false), StudioView::ClipReady(clip.clone()));
        assert!(mailbox.is_empty());
        assert_eq!(session.evaluate(false), StudioView::Showing(clip));
    }

    #[test]
    fn test_stop_without_payload_warns_once() {
        let mut session = StudioSession::new(Arc::new(Mailbox::new()));

        session.evaluate(true);
        assert_eq!(session.evaluate(false), StudioView::NothingCaptured);
        assert_eq!(session.evaluate(false), StudioView::Empty);
    }

    #[test]
    fn test_malformed_payload_is_no_recording() {
        let mailbox = Arc::new(Mailbox::new());
        let mut session = StudioSession::new(mailbox.clone());

        session.evaluate(true);
        mailbox.post("{\"kind\":\"recording\",\"data\":".to_string());
        assert_eq!(session.evaluate(false), StudioView::NothingCaptured);
    }

    #[test]
    fn test_new_recording_drops_previous_clip() {
        let mailbox = Arc::new(Mailbox::new());
        let mut session = StudioSession::new(mailbox.clone());

        session.evaluate(true);
        let clip = posted_clip(&mailbox);
        session.evaluate(false);
        assert_eq!(session.evaluate(false), StudioView::Showing(clip));

        assert_eq!(session.evaluate(true), StudioView::Recording);
        assert_eq!(session.evaluate(false), StudioView::NothingCaptured);
        assert_eq!(session.evaluate(false), StudioView::Empty);
    }

    #[test]
    fn test_monitor_status() {
        let mut config = Config::default();
        assert_eq!(MonitorStatus::from_config(&config), MonitorStatus::InputOnly);

        config.monitor_output = true;
        assert_eq!(MonitorStatus::from_config(&config), MonitorStatus::Both);

        config.monitor_input = false;
        config.monitor_output = false;
        assert_eq!(
            MonitorStatus::from_config(&config).describe(),
            "No audio source enabled."
        );
    }
}
