//! Language-model collaborator for the oracle.
//!
//! This module provides:
//! * [`LanguageModel`] — async trait implemented by all service backends.
//! * [`GeminiClient`] — Google Generative Language API (default backend).
//! * [`OpenAiClient`] — any OpenAI-compatible chat-completions API.
//! * [`InstructionProfile`] — the fixed system instruction sent with every request.
//! * [`LlmError`] — error variants for service calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use resonance_oracle::config::AppConfig;
//! use resonance_oracle::llm::{self, InstructionProfile};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let model = llm::from_config(&config.service);
//!
//!     let reply = model
//!         .generate(InstructionProfile::resonance_writer(), "Wat is stilte?")
//!         .await
//!         .unwrap();
//!     println!("{reply}");
//! }
//! ```

pub mod client;
pub mod gemini;
pub mod openai;
pub mod profile;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{from_config, LanguageModel, LlmError};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use profile::InstructionProfile;
