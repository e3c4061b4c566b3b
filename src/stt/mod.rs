//! Local speech-to-text for microphone dictation.
//!
//! ```text
//!  16 kHz mono f32 ──▶ SttEngine::transcribe(audio, "nl") ──▶ String
//!                          ▲
//!                          │ WhisperEngine::load(model.bin, TranscribeParams)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use resonance_oracle::stt::{SttEngine, TranscribeParams, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-base.bin", TranscribeParams::default())
//!     .expect("model file present");
//!
//! let audio: Vec<f32> = vec![0.0; 16_000]; // 1 s of silence
//! let text = engine.transcribe(&audio, "nl").unwrap();
//! println!("{text}");
//! ```

pub mod engine;
pub mod transcribe;

pub use engine::{SttEngine, SttError, WhisperEngine};
pub use transcribe::{SamplingStrategy, TranscribeParams};

#[cfg(test)]
pub use engine::MockSttEngine;
