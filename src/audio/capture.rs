//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  Call
//! [`AudioCapture::start`] to begin streaming [`AudioChunk`]s over an mpsc
//! channel.  The returned [`StreamHandle`] is a RAII guard: dropping it
//! stops the underlying cpal stream.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// One buffer of interleaved `f32` samples as delivered by the cpal callback.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    /// Device sample rate in Hz.
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioChunk {
    /// Downmix and resample this chunk to 16 kHz mono, ready for the
    /// endpoint detector and the STT engine.
    pub fn to_speech_rate(&self) -> Vec<f32> {
        let mono = super::stereo_to_mono(&self.samples, self.channels);
        super::resample_to_16k(&mono, self.sample_rate)
    }
}

/// Keeps the cpal input stream alive until dropped.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// DeviceError
// ---------------------------------------------------------------------------

/// Errors raised while opening or running an audio device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no input device found on the default audio host")]
    NoInputDevice,

    #[error("failed to query default stream config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// The system default microphone, opened with its preferred configuration.
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use resonance_oracle::audio::{AudioCapture, AudioChunk};
///
/// let (tx, rx) = mpsc::channel::<AudioChunk>();
/// let capture = AudioCapture::new().unwrap();
/// let _handle = capture.start(tx).unwrap();
/// let first = rx.recv().unwrap();
/// println!("{} samples @ {} Hz", first.samples.len(), first.sample_rate);
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl AudioCapture {
    /// Open the default input device.
    ///
    /// # Errors
    ///
    /// [`DeviceError::NoInputDevice`] when the host has no microphone, or
    /// [`DeviceError::DefaultConfig`] when it cannot report a configuration.
    pub fn new() -> Result<Self, DeviceError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(DeviceError::NoInputDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;

        Ok(Self {
            device,
            config: supported.into(),
            sample_rate,
            channels,
        })
    }

    /// Start recording; every hardware buffer is forwarded to `tx`.
    ///
    /// Send failures (receiver gone) are ignored on the audio thread.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, DeviceError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| log::error!("capture: cpal stream error: {err}"),
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
