//! Handoff between the capture timeline and the evaluation pass.
//!
//! The recorder finishes on its own schedule; the studio only looks for a
//! result when it next evaluates. A [`Mailbox`] holds at most one pending
//! value, and the value itself travels as an opaque [`CapturePayload`].

use crate::audio::Clip;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Single-slot handoff: a new post replaces any unread value
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning the unread value it replaced
    pub fn post(&self, value: T) -> Option<T> {
        let previous = self.slot.lock().replace(value);
        if previous.is_some() {
            tracing::debug!("Mailbox: overwrote unread value");
        }
        previous
    }

    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn clear(&self) {
        if self.slot.lock().take().is_some() {
            tracing::debug!("Mailbox: discarded unread value");
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

const PAYLOAD_KIND: &str = "recording";
const PAYLOAD_MIME: &str = "audio/wav";

/// Wire envelope for a finished recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturePayload {
    pub kind: String,
    pub mime: String,
    pub captured_at: DateTime<Local>,
    pub data: String,
}

impl CapturePayload {
    pub fn from_clip(clip: &Clip) -> Self {
        Self {
            kind: PAYLOAD_KIND.to_string(),
            mime: PAYLOAD_MIME.to_string(),
            captured_at: clip.captured_at,
            data: STANDARD.encode(&clip.wav),
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of strings and a timestamp always serializes
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::debug!("Ignoring malformed capture payload: {}", e);
                None
            }
        }
    }

    /// Decode the clip; anything unusable counts as "no recording available"
    pub fn into_clip(self) -> Option<Clip> {
        if self.kind != PAYLOAD_KIND {
            tracing::debug!("Ignoring capture payload of kind {:?}", self.kind);
            return None;
        }

        match STANDARD.decode(self.data.trim()) {
            Ok(wav) if !wav.is_empty() => Some(Clip::new(wav, self.captured_at)),
            Ok(_) => {
                tracing::debug!("Ignoring capture payload with empty data");
                None
            }
            Err(e) => {
                tracing::debug!("Ignoring capture payload with bad base64: {}", e);
                None
            }
        }
    }
}

/// Parse and decode a raw payload string in one step
pub fn decode_payload(raw: &str) -> Option<Clip> {
    CapturePayload::from_json(raw)?.into_clip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn clip() -> Clip {
        let captured_at = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Clip::new(vec![b'R', b'I', b'F', b'F', 0, 1, 2, 3], captured_at)
    }

    #[test]
    fn test_mailbox_take_clears() {
        let mailbox = Mailbox::new();
        assert!(mailbox.post(1).is_none());
        assert_eq!(mailbox.take(), Some(1));
        assert_eq!(mailbox.take(), None);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_mailbox_overwrites_unread() {
        let mailbox = Mailbox::new();
        mailbox.post("first");
        assert_eq!(mailbox.post("second"), Some("first"));
        assert_eq!(mailbox.take(), Some("second"));
    }

    #[test]
    fn test_mailbox_clear_discards() {
        let mailbox = Mailbox::new();
        mailbox.post(5);
        mailbox.clear();
        assert!(mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_mailbox_across_tasks() {
        let mailbox = Arc::new(Mailbox::new());
        let producer = mailbox.clone();

        tokio::spawn(async move {
            producer.post(String::from("clip"));
        })
        .await
        .unwrap();

        assert_eq!(mailbox.take().as_deref(), Some("clip"));
    }

    #[test]
    fn test_payload_round_trip() {
        let original = clip();
        let raw = CapturePayload::from_clip(&original).to_json();
        assert_eq!(decode_payload(&raw), Some(original));
    }

    #[test]
    fn test_malformed_payloads_are_ignored() {
        assert!(decode_payload("not json").is_none());
        assert!(decode_payload(r#"{"kind":"recording"}"#).is_none());

        let mut payload = CapturePayload::from_clip(&clip());
        payload.data = "***not base64***".to_string();
        assert!(decode_payload(&payload.to_json()).is_none());

        let mut payload = CapturePayload::from_clip(&clip());
        payload.data = String::new();
        assert!(decode_payload(&payload.to_json()).is_none());

        let mut payload = CapturePayload::from_clip(&clip());
        payload.kind = "snapshot".to_string();
        assert!(decode_payload(&payload.to_json()).is_none());
    }
}
