//! Oracle window: egui/eframe front-end.
//!
//! # Architecture
//!
//! [`OracleApp`] is the top-level [`eframe::App`].  It reads the
//! [`SharedState`] written by the orchestrator once per frame and sends
//! [`OracleCommand`]s back over a bounded channel; it never talks to the
//! language model or the speech engines directly.
//!
//! | Control | Behaviour |
//! |---------|-----------|
//! | input field | Enter submits; disabled while a request is outstanding |
//! | mic button | one dictation session; the transcript replaces the input |
//! | send button | disabled (with spinner) while a request is outstanding |
//! | response panel | revealed reply, or the fallback notice after a failure |
//! | mute button | only while the reply is being spoken |
//! | theta toggle | starts / stops the 4 Hz drone |

use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::audio::{DroneHandle, ThetaDrone};
use crate::config::AppConfig;
use crate::pipeline::{lock_state, ListenState, OracleCommand, PipelineState, SharedState};

const TITLE: &str = "RESONANCE-WRITER-X";
const FOOTER: &str = "RESONANCE-WRITER-X: ONLINE";

const ACCENT: egui::Color32 = egui::Color32::from_rgb(120, 200, 255);
const DIM: egui::Color32 = egui::Color32::from_rgb(120, 120, 120);
const NOTICE: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);

/// Command for the current input, or `None` when there is nothing to send.
fn submit_command(input: &str) -> Option<OracleCommand> {
    let text = input.trim();
    (!text.is_empty()).then(|| OracleCommand::Submit(text.to_string()))
}

fn drone_label(on: bool) -> &'static str {
    if on {
        "THETA 4HZ: AAN"
    } else {
        "THETA 4HZ: UIT"
    }
}

// ---------------------------------------------------------------------------
// OracleApp
// ---------------------------------------------------------------------------

/// What one frame needs from the shared state, copied out under the lock.
struct Snapshot {
    pipeline: PipelineState,
    listen: ListenState,
    displayed: String,
    failed: bool,
    transcript: Option<String>,
}

pub struct OracleApp {
    state: SharedState,
    command_tx: mpsc::Sender<OracleCommand>,
    input: String,

    /// Output device, opened the first time the drone is switched on.
    drone: Option<ThetaDrone>,
    /// Sound plays while this is `Some`.
    drone_handle: Option<DroneHandle>,

    config: AppConfig,
}

impl OracleApp {
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<OracleCommand>,
        config: AppConfig,
    ) -> Self {
        Self {
            state,
            command_tx,
            input: String::new(),
            drone: None,
            drone_handle: None,
            config,
        }
    }

    fn snapshot(&self) -> Snapshot {
        let mut st = lock_state(&self.state);
        Snapshot {
            pipeline: st.pipeline,
            listen: st.listen,
            displayed: st.displayed_text().to_string(),
            failed: st.notice.is_some(),
            transcript: st.take_transcript(),
        }
    }

    fn send(&self, command: OracleCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: could not reach the orchestrator: {e}");
        }
    }

    /// Send the input text; blank input sends nothing and keeps the field.
    fn submit(&mut self) {
        if let Some(command) = submit_command(&self.input) {
            self.send(command);
            self.input.clear();
        }
    }

    fn toggle_drone(&mut self) {
        if self.drone_handle.take().is_some() {
            log::debug!("ui: theta drone off");
            return;
        }

        if self.drone.is_none() {
            match ThetaDrone::new(&self.config.drone) {
                Ok(drone) => self.drone = Some(drone),
                Err(e) => {
                    log::warn!("ui: theta drone unavailable: {e}");
                    return;
                }
            }
        }

        if let Some(drone) = &self.drone {
            match drone.start() {
                Ok(handle) => self.drone_handle = Some(handle),
                Err(e) => log::warn!("ui: theta drone failed to start: {e}"),
            }
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_response(&self, ui: &mut egui::Ui, snap: &Snapshot) {
        let color = if snap.failed { NOTICE } else { ACCENT };
        egui::ScrollArea::vertical()
            .max_height((ui.available_height() - 90.0).max(40.0))
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                if snap.displayed.is_empty() && snap.pipeline == PipelineState::Idle {
                    ui.label(egui::RichText::new("Stel je vraag aan het veld…").color(DIM));
                } else {
                    ui.label(egui::RichText::new(snap.displayed.as_str()).color(color).size(15.0));
                }
            });

        if snap.pipeline == PipelineState::Speaking
            && ui
                .button(egui::RichText::new("🔇 stil").size(11.0))
                .on_hover_text("Stop het spreken")
                .clicked()
        {
            self.send(OracleCommand::StopSpeaking);
        }
    }

    fn draw_input(&mut self, ui: &mut egui::Ui, snap: &Snapshot) {
        let outstanding = snap.pipeline.call_outstanding();

        ui.horizontal(|ui| {
            let listening = snap.listen == ListenState::Listening;
            let mic = egui::Button::new(if listening { "● luistert" } else { "🎤" });
            if ui
                .add_enabled(!listening && self.config.listen.enabled, mic)
                .on_hover_text("Spreek je vraag in")
                .clicked()
            {
                self.send(OracleCommand::Listen);
            }

            let field_width = (ui.available_width() - 70.0).max(80.0);
            let field = ui.add_enabled(
                !outstanding,
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("Vraag…")
                    .desired_width(field_width),
            );
            let entered =
                field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let send = ui.add_enabled(!outstanding, egui::Button::new("Zend"));
            if outstanding {
                ui.spinner();
            }

            if !outstanding && (entered || send.clicked()) {
                self.submit();
                field.request_focus();
            }
        });
    }

    fn draw_footer(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let on = self.drone_handle.is_some();
            if ui
                .selectable_label(on, egui::RichText::new(drone_label(on)).size(11.0))
                .clicked()
            {
                self.toggle_drone();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(FOOTER).color(DIM).size(10.0));
            });
        });
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for OracleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snap = self.snapshot();
        if let Some(text) = &snap.transcript {
            self.input = text.clone();
        }

        // Keep frames coming while the orchestrator is changing things.
        if snap.pipeline.is_busy() || snap.listen == ListenState::Listening {
            ctx.request_repaint_after(Duration::from_millis(16));
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgb(12, 12, 20))
            .inner_margin(egui::Margin::same(12));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            ui.label(egui::RichText::new(TITLE).color(ACCENT).strong().size(13.0));
            ui.separator();
            self.draw_response(ui, &snap);
            ui.separator();
            self.draw_input(ui, &snap);
            ui.add_space(6.0);
            self.draw_footer(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.drone_handle = None;
        self.send(OracleCommand::Cancel);
        log::info!("ui: oracle window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
