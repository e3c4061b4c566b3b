//! Application entry point: the Resonance Oracle window.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (defaults on first run or a broken file).
//! 3. Create the [`tokio`] runtime.
//! 4. Build the collaborators: language model, speech synthesis, dictation.
//! 5. Spawn the [`OracleOrchestrator`] on the runtime.
//! 6. Run [`eframe::run_native`]; blocks until the window is closed.
//! 7. Shut the runtime down without waiting on a dictation still recording.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use eframe::egui;
use tokio::sync::mpsc;

use resonance_oracle::{
    app::OracleApp,
    config::{AppConfig, AppPaths},
    llm,
    pipeline::{new_shared_state, OracleCommand, OracleOrchestrator, PipelineSettings},
    speech::{
        EspeakSynthesizer, SilentSynthesizer, SpeechRecognizer, SpeechSynthesizer,
        UnavailableRecognizer, WhisperRecognizer,
    },
};

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Resonance Oracle")
        .with_inner_size([width, height])
        .with_min_inner_size([360.0, 220.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

/// How long a closing window waits for background work before leaving it.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}

/// Leaves a still-recording dictation session behind instead of joining it.
fn shutdown(rt: tokio::runtime::Runtime) {
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    log::info!("Resonance Oracle stopped");
}

fn synthesizer(config: &AppConfig) -> Arc<dyn SpeechSynthesizer> {
    if config.speech.enabled {
        Arc::new(EspeakSynthesizer::new(config.speech.program.clone()))
    } else {
        log::info!("speech output disabled in settings");
        Arc::new(SilentSynthesizer)
    }
}

fn recognizer(config: &AppConfig) -> Arc<dyn SpeechRecognizer> {
    if config.listen.enabled {
        let model = AppPaths::new().model_file(&config.listen.model);
        log::info!("dictation model: {}", model.display());
        Arc::new(WhisperRecognizer::new(model, config.listen.clone()))
    } else {
        log::info!("dictation disabled in settings");
        Arc::new(UnavailableRecognizer)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Resonance Oracle starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e:#}); using defaults");
        AppConfig::default()
    });

    let rt = runtime()?;

    if config.service.resolve_api_key().is_none() {
        log::warn!("no API key configured; every question will answer with the fallback notice");
    }

    let state = new_shared_state(config.clone());
    let (command_tx, command_rx) = mpsc::channel::<OracleCommand>(16);

    let orchestrator = OracleOrchestrator::new(
        Arc::clone(&state),
        llm::from_config(&config.service),
        synthesizer(&config),
        recognizer(&config),
        PipelineSettings::from_config(&config),
    );
    rt.spawn(orchestrator.run(command_rx));

    let app = OracleApp::new(state, command_tx, config.clone());
    let outcome = eframe::run_native(
        "Resonance Oracle",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    );

    shutdown(rt);
    outcome.map_err(|e| anyhow::anyhow!("window error: {e}"))
}
