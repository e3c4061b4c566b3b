//! Microphone dictation.
//!
//! One [`SpeechRecognizer::listen`] call is one session: record until the
//! speaker stops, transcribe, return the final text (or nothing when only
//! silence was heard).  Interim results are not produced.

use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{language_tag, SpeechError};
use crate::audio::{AudioCapture, AudioChunk, DeviceError, EndpointDetector};
use crate::config::ListenConfig;
use crate::stt::engine::MIN_AUDIO_SAMPLES;
use crate::stt::{SttEngine, SttError, TranscribeParams, WhisperEngine};

/// How long to wait for the next hardware buffer before re-checking the clock.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Grace period past `max_length` before a silent device is given up on.
const STALL_GRACE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Speech capture: one session yields one final transcript or none.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn listen(&self, locale: &str) -> Result<Option<String>, SpeechError>;
}

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

/// Records from the default microphone and transcribes with a local Whisper
/// model.  The model is loaded on the first session and kept afterwards.
#[derive(Clone)]
pub struct WhisperRecognizer {
    inner: Arc<Inner>,
}

struct Inner {
    model_path: PathBuf,
    config: ListenConfig,
    engine: Mutex<Option<Arc<dyn SttEngine>>>,
}

impl WhisperRecognizer {
    pub fn new(model_path: impl Into<PathBuf>, config: ListenConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                model_path: model_path.into(),
                config,
                engine: Mutex::new(None),
            }),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn listen(&self, locale: &str) -> Result<Option<String>, SpeechError> {
        let inner = Arc::clone(&self.inner);
        let language = language_tag(locale);
        tokio::task::spawn_blocking(move || inner.listen_blocking(&language))
            .await
            .map_err(|e| SpeechError::Failed(format!("listen task: {e}")))?
    }
}

impl Inner {
    fn listen_blocking(&self, language: &str) -> Result<Option<String>, SpeechError> {
        let engine = self.engine()?;
        let audio = self.record()?;
        log::debug!("listen: captured {} samples", audio.len());
        transcript_from(engine.as_ref(), &audio, language)
    }

    fn engine(&self) -> Result<Arc<dyn SttEngine>, SpeechError> {
        let mut slot = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        log::info!("listen: loading model {}", self.model_path.display());
        let engine: Arc<dyn SttEngine> = Arc::new(
            WhisperEngine::load(
                &self.model_path,
                TranscribeParams::with_beam_size(self.config.beam_size),
            )
                .map_err(stt_error)?,
        );
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Record 16 kHz mono audio until the endpoint detector is satisfied.
    fn record(&self) -> Result<Vec<f32>, SpeechError> {
        let capture = AudioCapture::new().map_err(device_error)?;
        let (tx, rx) = mpsc::channel::<AudioChunk>();
        let handle = capture.start(tx).map_err(device_error)?;

        let max_length = self.config.max_length();
        let mut detector =
            EndpointDetector::new(self.config.vad_threshold, self.config.silence(), max_length);
        let started = Instant::now();

        while !detector.is_complete() {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(chunk) => detector.push(&chunk.to_speech_rate()),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if started.elapsed() > max_length + STALL_GRACE {
                        log::warn!("listen: input device stopped delivering audio");
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        drop(handle);
        Ok(detector.finish())
    }
}

/// Turn captured audio into a transcript.
///
/// Silence (no audio) and blank transcripts are `None`.  A clip shorter than
/// the engine minimum is padded with silence so a single short word still
/// gets transcribed.
pub(crate) fn transcript_from(
    engine: &dyn SttEngine,
    audio: &[f32],
    language: &str,
) -> Result<Option<String>, SpeechError> {
    if audio.is_empty() {
        return Ok(None);
    }

    let padded;
    let audio = if audio.len() < MIN_AUDIO_SAMPLES {
        padded = {
            let mut v = audio.to_vec();
            v.resize(MIN_AUDIO_SAMPLES, 0.0);
            v
        };
        &padded[..]
    } else {
        audio
    };

    match engine.transcribe(audio, language) {
        Ok(text) => {
            let text = text.trim();
            Ok((!text.is_empty()).then(|| text.to_string()))
        }
        Err(SttError::AudioTooShort) => Ok(None),
        Err(e) => Err(stt_error(e)),
    }
}

fn stt_error(e: SttError) -> SpeechError {
    match e {
        SttError::ModelNotFound(_) | SttError::ContextInit(_) => {
            SpeechError::Unavailable(e.to_string())
        }
        other => SpeechError::Failed(other.to_string()),
    }
}

fn device_error(e: DeviceError) -> SpeechError {
    match e {
        DeviceError::NoInputDevice | DeviceError::DefaultConfig(_) => {
            SpeechError::Unavailable(e.to_string())
        }
        other => SpeechError::Failed(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// UnavailableRecognizer
// ---------------------------------------------------------------------------

/// Stand-in used when dictation is disabled.
#[derive(Debug, Default)]
pub struct UnavailableRecognizer;

#[async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    async fn listen(&self, _locale: &str) -> Result<Option<String>, SpeechError> {
        Err(SpeechError::Unavailable("speech capture disabled".into()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
