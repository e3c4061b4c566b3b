//! Background "theta" drone: a low sine carrier pulsing at 4 Hz.
//!
//! [`ThetaOscillator`] is the pure sample generator; [`ThetaDrone`] owns the
//! output device and hands out a [`DroneHandle`] whose drop silences it.
//! Nothing is opened until the user switches the drone on.

use std::f32::consts::TAU;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use thiserror::Error;

use crate::config::DroneConfig;

// ---------------------------------------------------------------------------
// DroneError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DroneError {
    #[error("no output device found on the default audio host")]
    NoOutputDevice,

    #[error("output device uses an unsupported sample format ({0:?})")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// ThetaOscillator
// ---------------------------------------------------------------------------

/// `sin(carrier) * (am_base + sin(lfo)) * master_gain`, one sample at a time.
///
/// ```rust
/// use resonance_oracle::audio::ThetaOscillator;
/// use resonance_oracle::config::DroneConfig;
///
/// let mut osc = ThetaOscillator::new(&DroneConfig::default(), 48_000);
/// let peak = (0..48_000).map(|_| osc.next_sample().abs()).fold(0.0, f32::max);
/// assert!(peak <= 0.15 * 1.5 + 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct ThetaOscillator {
    carrier_step: f32,
    lfo_step: f32,
    carrier_phase: f32,
    lfo_phase: f32,
    am_base: f32,
    master_gain: f32,
}

impl ThetaOscillator {
    pub fn new(config: &DroneConfig, sample_rate: u32) -> Self {
        let rate = sample_rate.max(1) as f32;
        Self {
            carrier_step: config.carrier_hz / rate,
            lfo_step: config.lfo_hz / rate,
            carrier_phase: 0.0,
            lfo_phase: 0.0,
            am_base: config.am_base,
            master_gain: config.master_gain,
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let carrier = (self.carrier_phase * TAU).sin();
        let lfo = (self.lfo_phase * TAU).sin();
        self.carrier_phase = (self.carrier_phase + self.carrier_step).fract();
        self.lfo_phase = (self.lfo_phase + self.lfo_step).fract();
        carrier * (self.am_base + lfo) * self.master_gain
    }

    /// Fill an interleaved buffer, writing the same sample to every channel.
    pub fn fill<T>(&mut self, buffer: &mut [T], channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        for frame in buffer.chunks_mut(channels.max(1)) {
            let sample = T::from_sample(self.next_sample());
            frame.fill(sample);
        }
    }
}

// ---------------------------------------------------------------------------
// ThetaDrone / DroneHandle
// ---------------------------------------------------------------------------

/// Sound is playing for as long as this handle lives.
pub struct DroneHandle {
    _stream: cpal::Stream,
}

/// Drone generator bound to the default output device.
pub struct ThetaDrone {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: cpal::SampleFormat,
    settings: DroneConfig,
}

impl ThetaDrone {
    pub fn new(settings: &DroneConfig) -> Result<Self, DroneError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(DroneError::NoOutputDevice)?;

        let supported = device.default_output_config()?;
        let format = supported.sample_format();

        Ok(Self {
            device,
            config: supported.into(),
            format,
            settings: settings.clone(),
        })
    }

    pub fn start(&self) -> Result<DroneHandle, DroneError> {
        let stream = match self.format {
            cpal::SampleFormat::F32 => self.build_stream::<f32>()?,
            cpal::SampleFormat::F64 => self.build_stream::<f64>()?,
            cpal::SampleFormat::I16 => self.build_stream::<i16>()?,
            cpal::SampleFormat::I32 => self.build_stream::<i32>()?,
            cpal::SampleFormat::U16 => self.build_stream::<u16>()?,
            cpal::SampleFormat::U8 => self.build_stream::<u8>()?,
            other => return Err(DroneError::UnsupportedFormat(other)),
        };

        stream.play()?;
        log::debug!(
            "drone: {} Hz carrier at {} Hz pulse",
            self.settings.carrier_hz,
            self.settings.lfo_hz
        );
        Ok(DroneHandle { _stream: stream })
    }

    fn build_stream<T>(&self) -> Result<cpal::Stream, DroneError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = usize::from(self.config.channels);
        let mut osc = ThetaOscillator::new(&self.settings, self.config.sample_rate.0);

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| osc.fill(data, channels),
            |err: cpal::StreamError| log::error!("drone: cpal stream error: {err}"),
            None,
        )?;
        Ok(stream)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
