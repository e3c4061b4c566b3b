//! Resonance Oracle: a desktop oracle that answers typed or dictated
//! questions through a hosted language model, reveals the reply one
//! character at a time and speaks it aloud.
//!
//! The binary wires the modules together in `main.rs`; the library exposes
//! them so every part can be exercised on its own.

pub mod app;
pub mod audio;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod speech;
pub mod stt;
