//! Text-to-speech playback.
//!
//! [`EspeakSynthesizer`] runs the `espeak-ng` executable (the same engine
//! many desktop screen readers use) as a child process.  The text is written
//! to its stdin so replies starting with `-` are never parsed as options.
//! `cancel` kills the child; dropping an in-flight `speak` future kills it as
//! well (`kill_on_drop`).

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Notify;

use super::{language_tag, SpeechError, VoiceParams};

/// espeak-ng's default speaking rate in words per minute.
const ESPEAK_BASE_WPM: f32 = 175.0;

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Speaks text aloud.
///
/// `speak` resolves once playback has finished (or was cancelled).
/// `cancel` stops any in-progress utterance immediately and is a no-op when
/// nothing is playing.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<(), SpeechError>;

    fn cancel(&self);
}

// ---------------------------------------------------------------------------
// EspeakSynthesizer
// ---------------------------------------------------------------------------

/// Synthesizer backed by the `espeak-ng` command-line tool.
pub struct EspeakSynthesizer {
    program: String,
    stop: Notify,
}

impl EspeakSynthesizer {
    /// `program` is the executable name or path (usually `"espeak-ng"`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            stop: Notify::new(),
        }
    }

    /// Command-line arguments for `voice`, excluding the text itself.
    pub fn voice_args(voice: &VoiceParams) -> Vec<String> {
        vec![
            "-v".into(),
            language_tag(&voice.locale),
            "-p".into(),
            espeak_pitch(voice.pitch).to_string(),
            "-s".into(),
            espeak_speed(voice.rate).to_string(),
            "--stdin".into(),
        ]
    }
}

/// Map a `1.0 = normal` pitch onto espeak's `0..=99` scale (50 = normal).
fn espeak_pitch(pitch: f32) -> u8 {
    (pitch * 50.0).round().clamp(0.0, 99.0) as u8
}

/// Map a `1.0 = normal` rate onto espeak's words-per-minute (80..=450).
fn espeak_speed(rate: f32) -> u16 {
    (rate * ESPEAK_BASE_WPM).round().clamp(80.0, 450.0) as u16
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<(), SpeechError> {
        // Registered up front so a cancel during spawn or the stdin write
        // still stops this utterance.
        let stopped = self.stop.notified();
        tokio::pin!(stopped);
        stopped.as_mut().enable();

        let mut child = Command::new(&self.program)
            .args(Self::voice_args(voice))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    SpeechError::Unavailable(format!("{}: {e}", self.program))
                }
                _ => SpeechError::Failed(e.to_string()),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| SpeechError::Failed(e.to_string()))?;
            // Dropping stdin closes it so espeak starts speaking.
        }

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| SpeechError::Failed(e.to_string()))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(SpeechError::Failed(format!("{} exited with {status}", self.program)))
                }
            }
            () = &mut stopped => {
                log::debug!("speech: playback cancelled");
                let _ = child.kill().await;
                Ok(())
            }
        }
    }

    fn cancel(&self) {
        self.stop.notify_waiters();
    }
}

// ---------------------------------------------------------------------------
// SilentSynthesizer
// ---------------------------------------------------------------------------

/// Stand-in used when speech output is disabled; every call is `Unavailable`.
#[derive(Debug, Default)]
pub struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn speak(&self, _text: &str, _voice: &VoiceParams) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable("speech output disabled".into()))
    }

    fn cancel(&self) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
