//! Transcription parameter types.
//!
//! [`TranscribeParams`] carries the decoder settings fixed at model load
//! time; the language is chosen per call because dictation follows the
//! locale passed to each listening session.

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Mirrors `whisper_rs::SamplingStrategy` but is owned and `Clone`.
///
/// Greedy decoding is plenty for short dictated questions; beam search trades
/// latency for accuracy on noisier microphones.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Greedy (single-pass) decoding.
    Greedy {
        /// Number of candidate tokens evaluated per step.  1 is fastest.
        best_of: i32,
    },
    /// Beam-search decoding.
    BeamSearch {
        /// Number of beams to maintain in parallel.
        beam_size: i32,
        /// Beam-search patience factor (≥1.0 = standard beam search).
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

impl SamplingStrategy {
    /// Widest beam accepted from configuration.
    pub const MAX_BEAM: u32 = 8;

    /// Greedy for a beam of 0 or 1, otherwise standard beam search capped at
    /// [`Self::MAX_BEAM`].
    pub fn from_beam_size(beam_size: u32) -> Self {
        match beam_size {
            0 | 1 => Self::default(),
            n => Self::BeamSearch {
                beam_size: n.min(Self::MAX_BEAM) as i32,
                patience: 1.0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// Decoder settings for a loaded Whisper model.
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// Decoding strategy.
    pub strategy: SamplingStrategy,

    /// Number of CPU threads handed to Whisper, capped at 8.
    pub n_threads: i32,

    /// Suppress Whisper's progress output to stderr.
    pub suppress_progress: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            suppress_progress: true,
        }
    }
}

impl TranscribeParams {
    /// Decoder settings for dictation with the given `beam_size`.
    pub fn with_beam_size(beam_size: u32) -> Self {
        Self {
            strategy: SamplingStrategy::from_beam_size(beam_size),
            ..Self::default()
        }
    }
}

/// Number of CPU threads to use for inference, capped at 8.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}
