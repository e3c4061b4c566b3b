//! Energy-based voice activity detection.
//!
//! Audio is split into 30 ms frames (480 samples at 16 kHz); a frame counts
//! as voice when its RMS amplitude exceeds the threshold.
//!
//! * [`VadDetector`] trims leading and trailing silence from a finished clip
//!   so Whisper does not hallucinate over quiet stretches.
//! * [`EndpointDetector`] watches a live stream and decides when the speaker
//!   has finished: voice was heard and then enough trailing silence followed,
//!   or the recording hit its length cap.

use std::time::Duration;

use super::resample::SPEECH_RATE;

/// 30 ms at 16 kHz.
const FRAME_SIZE: usize = 480;

// ---------------------------------------------------------------------------
// VadDetector
// ---------------------------------------------------------------------------

/// Energy-based silence trimmer.
///
/// ```rust
/// use resonance_oracle::audio::VadDetector;
///
/// let vad = VadDetector::new(0.01);
/// let mut audio = vec![0.0_f32; 480];
/// audio.extend(vec![0.5_f32; 480]);
/// audio.extend(vec![0.0_f32; 480]);
///
/// assert_eq!(vad.trim_silence(&audio).len(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct VadDetector {
    rms_threshold: f32,
}

impl VadDetector {
    /// `rms_threshold` in `[0.0, 1.0]`; `0.01` suits a quiet room.
    pub fn new(rms_threshold: f32) -> Self {
        Self { rms_threshold }
    }

    pub(crate) fn is_voice_frame(&self, frame: &[f32]) -> bool {
        if frame.is_empty() {
            return false;
        }
        let mean_sq = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
        mean_sq.sqrt() > self.rms_threshold
    }

    /// Sub-slice of `audio` from the first to the last voice frame.
    ///
    /// An all-silent signal yields an empty slice.
    pub fn trim_silence<'a>(&self, audio: &'a [f32]) -> &'a [f32] {
        let voiced: Vec<usize> = audio
            .chunks(FRAME_SIZE)
            .enumerate()
            .filter(|(_, frame)| self.is_voice_frame(frame))
            .map(|(i, _)| i)
            .collect();

        match (voiced.first(), voiced.last()) {
            (Some(&first), Some(&last)) => {
                let start = first * FRAME_SIZE;
                let end = ((last + 1) * FRAME_SIZE).min(audio.len());
                &audio[start..end]
            }
            _ => &audio[..0],
        }
    }
}

// ---------------------------------------------------------------------------
// EndpointDetector
// ---------------------------------------------------------------------------

/// Streaming end-of-utterance detector over 16 kHz mono samples.
///
/// ```rust
/// use std::time::Duration;
/// use resonance_oracle::audio::EndpointDetector;
///
/// let mut ep = EndpointDetector::new(0.01, Duration::from_millis(60), Duration::from_secs(5));
/// ep.push(&[0.5; 960]);
/// assert!(!ep.is_complete());
/// ep.push(&[0.0; 960]);
/// assert!(ep.is_complete());
/// assert_eq!(ep.finish().len(), 960);
/// ```
#[derive(Debug)]
pub struct EndpointDetector {
    vad: VadDetector,
    samples: Vec<f32>,
    /// Samples already classified, always a multiple of the frame size.
    scanned: usize,
    heard_voice: bool,
    trailing_silence: usize,
    silence_limit: usize,
    max_samples: usize,
}

impl EndpointDetector {
    pub fn new(rms_threshold: f32, silence: Duration, max_length: Duration) -> Self {
        Self {
            vad: VadDetector::new(rms_threshold),
            samples: Vec::new(),
            scanned: 0,
            heard_voice: false,
            trailing_silence: 0,
            silence_limit: duration_to_samples(silence).max(1),
            max_samples: duration_to_samples(max_length).max(FRAME_SIZE),
        }
    }

    /// Append samples and classify every complete frame.
    pub fn push(&mut self, samples: &[f32]) {
        let room = self.max_samples.saturating_sub(self.samples.len());
        self.samples.extend_from_slice(&samples[..samples.len().min(room)]);

        while self.scanned + FRAME_SIZE <= self.samples.len() {
            let frame = &self.samples[self.scanned..self.scanned + FRAME_SIZE];
            if self.vad.is_voice_frame(frame) {
                self.heard_voice = true;
                self.trailing_silence = 0;
            } else if self.heard_voice {
                self.trailing_silence += FRAME_SIZE;
            }
            self.scanned += FRAME_SIZE;
        }
    }

    pub fn heard_voice(&self) -> bool {
        self.heard_voice
    }

    /// True once the speaker has gone quiet after talking, or the length cap
    /// has been reached.
    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.max_samples
            || (self.heard_voice && self.trailing_silence >= self.silence_limit)
    }

    /// The recorded utterance with surrounding silence removed; empty when no
    /// voice was ever heard.
    pub fn finish(self) -> Vec<f32> {
        if !self.heard_voice {
            return Vec::new();
        }
        self.vad.trim_silence(&self.samples).to_vec()
    }
}

fn duration_to_samples(d: Duration) -> usize {
    (d.as_secs_f64() * f64::from(SPEECH_RATE)).round() as usize
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
