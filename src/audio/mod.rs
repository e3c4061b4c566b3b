//! Audio plumbing: microphone capture for dictation and the theta drone.
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → stereo_to_mono
//!           → resample_to_16k → EndpointDetector → trimmed utterance
//!
//! ThetaDrone::start() → cpal output stream ← ThetaOscillator
//! ```

pub mod capture;
pub mod drone;
pub mod resample;
pub mod vad;

pub use capture::{AudioCapture, AudioChunk, DeviceError, StreamHandle};
pub use drone::{DroneError, DroneHandle, ThetaDrone, ThetaOscillator};
pub use resample::{resample_to_16k, stereo_to_mono, SPEECH_RATE};
pub use vad::{EndpointDetector, VadDetector};
