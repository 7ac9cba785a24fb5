use anyhow::Result;
use tokio::sync::oneshot;

/// Commands for the Recorder service
pub enum RecorderCommand {
    Start,
    /// Reply is `true` when a finished clip was posted to the mailbox
    Stop(oneshot::Sender<Result<bool>>),
}

/// Studio state (observable via watch channel)
#[derive(Clone, Debug, PartialEq)]
pub enum StudioState {
    Idle,
    Recording,
    Processing,
}
