pub mod capture;
pub mod clip;
pub mod format;
pub mod frame;
pub mod inspect;
pub mod playback;
pub mod wav;

pub use capture::AudioCapture;
pub use clip::Clip;
pub use format::AudioFormat;
pub use frame::{AudioFrame, FrameBuffer};
pub use playback::{PlaybackRequest, PlaybackSpeed};
pub use wav::encode_wav;
