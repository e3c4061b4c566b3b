//! Pipeline state machine and shared application state.
//!
//! [`PipelineState`] drives the orchestrator; the UI reads it through
//! [`SharedState`] every frame to decide which controls are enabled.
//!
//! [`AppState`] is the single source of truth for the UI: exchange phase,
//! the reply being revealed, the failure notice, dictation status and any
//! transcript waiting to be copied into the input field.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::AppConfig;

use super::runner::PipelineError;

/// Shown in place of the reply whenever an exchange fails ("the field is
/// disturbed").  The underlying cause only goes to the log.
pub const FIELD_DISTURBED: &str = "ER IS EEN STORING IN HET VELD.";

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phases of one oracle exchange.
///
/// ```text
/// Idle ──submit──▶ AwaitingReply ──reply──▶ Revealing ──▶ Speaking ──▶ Idle
///                        └──service error / timeout──▶ Failed
/// Failed ──submit──▶ AwaitingReply
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    /// One language-model request is outstanding.
    AwaitingReply,
    /// The reply is being shown one character at a time.
    Revealing,
    /// The full reply is being spoken.
    Speaking,
    /// The last exchange failed; the fallback notice is on screen.
    Failed,
}

impl PipelineState {
    /// Returns `true` only while a request is in flight.
    ///
    /// ```
    /// use resonance_oracle::pipeline::PipelineState;
    ///
    /// assert!(PipelineState::AwaitingReply.call_outstanding());
    /// assert!(!PipelineState::Revealing.call_outstanding());
    /// assert!(!PipelineState::Failed.call_outstanding());
    /// ```
    pub fn call_outstanding(&self) -> bool {
        matches!(self, PipelineState::AwaitingReply)
    }

    /// Returns `true` while an exchange is running in any phase.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::AwaitingReply | PipelineState::Revealing | PipelineState::Speaking
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::AwaitingReply => "Awaiting reply",
            PipelineState::Revealing => "Revealing",
            PipelineState::Speaking => "Speaking",
            PipelineState::Failed => "Failed",
        }
    }
}

/// Dictation status, independent of the exchange state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenState {
    #[default]
    Idle,
    Listening,
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// User text accepted for submission: trimmed and never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance(String);

impl Utterance {
    /// ```
    /// use resonance_oracle::pipeline::{PipelineError, Utterance};
    ///
    /// assert_eq!(Utterance::new("  Wat is stilte? \n").unwrap().as_str(), "Wat is stilte?");
    /// assert_eq!(Utterance::new(" \t ").unwrap_err(), PipelineError::EmptyInput);
    /// ```
    pub fn new(raw: &str) -> Result<Self, PipelineError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// Reply text plus how much of it is on screen.
///
/// The revealed length only grows, always lands on a `char` boundary and
/// never exceeds the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    text: String,
    revealed: usize,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revealed: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The part of the reply currently visible.
    pub fn revealed(&self) -> &str {
        &self.text[..self.revealed]
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.revealed == self.text.len()
    }

    /// Reveal up to `byte_len` bytes, rounded down to a `char` boundary.
    /// Shorter lengths than what is already shown are ignored.
    pub fn advance_to(&mut self, byte_len: usize) {
        let mut end = byte_len.min(self.text.len());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }
        self.revealed = self.revealed.max(end);
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state: written by the orchestrator, read by the UI.
#[derive(Debug)]
pub struct AppState {
    pub pipeline: PipelineState,

    /// Reply of the current or most recent exchange.
    pub reply: Option<Reply>,

    /// Set to [`FIELD_DISTURBED`] when the last exchange failed.
    pub notice: Option<&'static str>,

    pub listen: ListenState,

    /// Final dictation result waiting to be placed in the input field.
    pub transcript: Option<String>,

    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            pipeline: PipelineState::Idle,
            reply: None,
            notice: None,
            listen: ListenState::Idle,
            transcript: None,
            config,
        }
    }

    /// Text for the response panel: the failure notice if there is one,
    /// otherwise the revealed part of the reply.
    pub fn displayed_text(&self) -> &str {
        match (self.notice, &self.reply) {
            (Some(notice), _) => notice,
            (None, Some(reply)) => reply.revealed(),
            (None, None) => "",
        }
    }

    /// Start a new exchange: a request is now outstanding and the previous
    /// reply or notice is cleared.
    pub fn begin_exchange(&mut self) {
        self.pipeline = PipelineState::AwaitingReply;
        self.reply = None;
        self.notice = None;
    }

    pub fn fail_exchange(&mut self) {
        self.pipeline = PipelineState::Failed;
        self.notice = Some(FIELD_DISTURBED);
    }

    pub fn take_transcript(&mut self) -> Option<String> {
        self.transcript.take()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].  Never hold the guard across `.await`.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

/// Lock the shared state, recovering the data if a previous holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
