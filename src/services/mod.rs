pub mod recorder;

pub use recorder::{MicrophoneSource, RecorderHandle, spawn_recorder};
