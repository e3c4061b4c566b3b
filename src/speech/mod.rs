//! Speech collaborators: text-to-speech playback and microphone dictation.
//!
//! Both sides are traits so the pipeline never depends on a concrete engine:
//!
//! * [`SpeechSynthesizer`] — `speak` a reply, `cancel` it mid-sentence.
//!   [`EspeakSynthesizer`] drives the `espeak-ng` executable.
//! * [`SpeechRecognizer`] — one listening session → one final transcript or
//!   nothing.  [`WhisperRecognizer`] records from the default microphone and
//!   transcribes locally.
//!
//! A capability the runtime lacks surfaces as [`SpeechError::Unavailable`];
//! callers treat that as a silent no-op.

pub mod listen;
pub mod synth;

pub use listen::{SpeechRecognizer, UnavailableRecognizer, WhisperRecognizer};
pub use synth::{EspeakSynthesizer, SilentSynthesizer, SpeechSynthesizer};

use thiserror::Error;

use crate::config::SpeechConfig;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors raised by speech collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// The runtime cannot provide this capability (no binary, no model, no
    /// device, disabled in config).
    #[error("speech unavailable: {0}")]
    Unavailable(String),

    /// The capability exists but this attempt failed.
    #[error("speech failed: {0}")]
    Failed(String),
}

impl SpeechError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SpeechError::Unavailable(_))
    }
}

// ---------------------------------------------------------------------------
// VoiceParams
// ---------------------------------------------------------------------------

/// Voice settings for one synthesis call.
///
/// `pitch` and `rate` use the familiar Web-Speech scale where `1.0` is the
/// engine's normal voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub locale: String,
    pub pitch: f32,
    pub rate: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            locale: "nl-NL".into(),
            pitch: 0.8,
            rate: 0.9,
        }
    }
}

impl From<&SpeechConfig> for VoiceParams {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            locale: config.locale.clone(),
            pitch: config.pitch,
            rate: config.rate,
        }
    }
}

/// Primary language subtag of a BCP-47 locale, lower-cased.
///
/// ```
/// use resonance_oracle::speech::language_tag;
///
/// assert_eq!(language_tag("nl-NL"), "nl");
/// assert_eq!(language_tag("EN_us"), "en");
/// assert_eq!(language_tag(""), "auto");
/// ```
pub fn language_tag(locale: &str) -> String {
    let primary = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if primary.is_empty() {
        "auto".into()
    } else {
        primary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
