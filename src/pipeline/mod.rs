//! The oracle pipeline: one exchange at a time, observable by the UI.
//!
//! # Architecture
//!
//! ```text
//! OracleCommand (mpsc, from the UI)
//!        │
//!        ▼
//! OracleOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ Submit(text)   → AwaitingReply → Revealing → Speaking → Idle
//!        │                        └─ error / timeout → Failed (FIELD_DISTURBED)
//!        ├─ Listen         → spawned dictation session → AppState::transcript
//!        ├─ StopSpeaking   → SpeechSynthesizer::cancel
//!        └─ Cancel         → drop the running exchange → Idle
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by egui update() each frame
//! ```

pub mod reveal;
pub mod runner;
pub mod state;

pub use reveal::Reveal;
pub use runner::{
    OracleCommand, OracleEvent, OracleOrchestrator, PipelineError, PipelineSettings,
};
pub use state::{
    lock_state, new_shared_state, AppState, ListenState, PipelineState, Reply, SharedState,
    Utterance, FIELD_DISTURBED,
};
