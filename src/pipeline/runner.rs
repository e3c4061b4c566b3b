//! Oracle orchestrator: drives submit → reply → reveal → speech.
//!
//! [`OracleOrchestrator`] owns the collaborators and mutates [`SharedState`]
//! in response to [`OracleCommand`]s received over a `tokio::sync::mpsc`
//! channel.
//!
//! # Exchange flow
//!
//! ```text
//! OracleCommand::Submit(text)
//!   └─▶ Utterance::new (blank → EmptyInput, nothing sent)
//!         └─▶ AwaitingReply  llm.generate(profile, text) under a timeout
//!               ├─ Err → warn + Failed, notice = FIELD_DISTURBED
//!               └─ Ok  → Revealing  one char per tick
//!                         └─▶ Speaking  synth.speak(reply)   (errors logged only)
//!                               └─▶ Idle
//! ```
//!
//! Commands keep flowing while an exchange runs.  A submit while a request
//! is outstanding is rejected; a submit during reveal or speech supersedes
//! the running exchange under [`SubmitPolicy::Interrupt`].  Superseding or
//! cancelling drops the exchange future, which abandons the in-flight
//! request, the pending reveal ticks and any playback.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{AppConfig, SubmitPolicy};
use crate::llm::{InstructionProfile, LanguageModel, LlmError};
use crate::speech::{SpeechRecognizer, SpeechSynthesizer, VoiceParams};

use super::reveal::Reveal;
use super::state::{lock_state, AppState, ListenState, PipelineState, Reply, SharedState, Utterance};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Why a submission was refused or an exchange failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("nothing to send: the input is blank")]
    EmptyInput,

    #[error("a request is already outstanding")]
    Busy,

    #[error("service error: {0}")]
    Service(#[from] LlmError),
}

// ---------------------------------------------------------------------------
// Commands and events
// ---------------------------------------------------------------------------

/// Requests from the UI to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleCommand {
    /// Ask the oracle; the raw input text is trimmed and validated here.
    Submit(String),
    /// Start one dictation session.
    Listen,
    /// Mute the reply currently being spoken.
    StopSpeaking,
    /// Abandon the running exchange and return to `Idle`.
    Cancel,
}

/// Notifications emitted by the orchestrator, mainly for observers and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleEvent {
    State(PipelineState),
    Rejected(PipelineError),
    Transcript(String),
}

// ---------------------------------------------------------------------------
// PipelineSettings
// ---------------------------------------------------------------------------

/// Everything the orchestrator needs from the configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub profile: InstructionProfile,
    pub request_timeout: Duration,
    pub reveal_interval: Duration,
    pub submit_policy: SubmitPolicy,
    pub voice: VoiceParams,
    pub listen_locale: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            profile: InstructionProfile::resonance_writer(),
            request_timeout: config.service.timeout(),
            reveal_interval: config.reveal.interval(),
            submit_policy: config.reveal.submit_policy,
            voice: VoiceParams::from(&config.speech),
            listen_locale: config.listen.locale.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// OracleOrchestrator
// ---------------------------------------------------------------------------

/// Runs oracle exchanges one at a time.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use resonance_oracle::config::AppConfig;
/// use resonance_oracle::llm;
/// use resonance_oracle::pipeline::{
///     new_shared_state, OracleCommand, OracleOrchestrator, PipelineSettings,
/// };
/// use resonance_oracle::speech::{SilentSynthesizer, UnavailableRecognizer};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let state = new_shared_state(config.clone());
/// let orchestrator = OracleOrchestrator::new(
///     state,
///     llm::from_config(&config.service),
///     Arc::new(SilentSynthesizer),
///     Arc::new(UnavailableRecognizer),
///     PipelineSettings::from_config(&config),
/// );
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// tokio::spawn(orchestrator.run(rx));
/// tx.send(OracleCommand::Submit("Wat is stilte?".into())).await.unwrap();
/// # }
/// ```
pub struct OracleOrchestrator {
    state: SharedState,
    llm: Arc<dyn LanguageModel>,
    synth: Arc<dyn SpeechSynthesizer>,
    recognizer: Arc<dyn SpeechRecognizer>,
    settings: PipelineSettings,
    events: Option<mpsc::UnboundedSender<OracleEvent>>,
}

impl OracleOrchestrator {
    pub fn new(
        state: SharedState,
        llm: Arc<dyn LanguageModel>,
        synth: Arc<dyn SpeechSynthesizer>,
        recognizer: Arc<dyn SpeechRecognizer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            state,
            llm,
            synth,
            recognizer,
            settings,
            events: None,
        }
    }

    /// Attach an event stream.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<OracleEvent>) -> Self {
        self.events = Some(events);
        self
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Process commands until the channel closes.
    ///
    /// An exchange already running when the channel closes is played out to
    /// the end, and a running dictation session is awaited.
    pub async fn run(self, mut commands: mpsc::Receiver<OracleCommand>) {
        let mut listener: Option<JoinHandle<()>> = None;
        let mut queued: Option<Utterance> = None;
        let mut open = true;

        loop {
            let utterance = match queued.take() {
                Some(utterance) => utterance,
                None => {
                    if !open {
                        break;
                    }
                    let Some(command) = commands.recv().await else {
                        break;
                    };
                    match command {
                        OracleCommand::Submit(raw) => match Utterance::new(&raw) {
                            Ok(utterance) => utterance,
                            Err(e) => {
                                self.reject(e);
                                continue;
                            }
                        },
                        OracleCommand::Listen => {
                            self.start_listening(&mut listener);
                            continue;
                        }
                        OracleCommand::StopSpeaking => {
                            self.synth.cancel();
                            continue;
                        }
                        OracleCommand::Cancel => continue,
                    }
                }
            };

            self.transition(AppState::begin_exchange);

            let exchange = self.exchange(utterance);
            tokio::pin!(exchange);

            loop {
                tokio::select! {
                    () = &mut exchange => break,
                    command = commands.recv(), if open => match command {
                        None => open = false,
                        Some(OracleCommand::Submit(raw)) => match self.accept_while_busy(&raw) {
                            Ok(next) => {
                                log::debug!("pipeline: superseding the running exchange");
                                self.synth.cancel();
                                queued = Some(next);
                                break;
                            }
                            Err(e) => self.reject(e),
                        },
                        Some(OracleCommand::Listen) => self.start_listening(&mut listener),
                        Some(OracleCommand::StopSpeaking) => self.synth.cancel(),
                        Some(OracleCommand::Cancel) => {
                            log::debug!("pipeline: exchange cancelled");
                            self.synth.cancel();
                            self.transition(|st| st.pipeline = PipelineState::Idle);
                            break;
                        }
                    },
                }
            }
        }

        if let Some(task) = listener {
            let _ = task.await;
        }
        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Exchange
    // -----------------------------------------------------------------------

    async fn exchange(&self, utterance: Utterance) {
        let request = self.llm.generate(self.settings.profile, utterance.as_str());
        let result = match tokio::time::timeout(self.settings.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout),
        };

        let text = match result {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => return self.fail(LlmError::EmptyResponse),
            Err(e) => return self.fail(e),
        };

        self.transition(|st| {
            st.reply = Some(Reply::new(text.as_str()));
            st.pipeline = PipelineState::Revealing;
        });

        for frame in Reveal::new(&text) {
            self.update(|st| {
                if let Some(reply) = st.reply.as_mut() {
                    reply.advance_to(frame.len());
                }
            });
            tokio::time::sleep(self.settings.reveal_interval).await;
        }

        self.transition(|st| st.pipeline = PipelineState::Speaking);
        match self.synth.speak(&text, &self.settings.voice).await {
            Ok(()) => {}
            Err(e) if e.is_unavailable() => log::debug!("pipeline: not speaking reply: {e}"),
            Err(e) => log::warn!("pipeline: speaking reply failed: {e}"),
        }

        self.transition(|st| st.pipeline = PipelineState::Idle);
    }

    fn fail(&self, cause: LlmError) {
        log::warn!("pipeline: exchange failed: {}", PipelineError::from(cause));
        self.transition(AppState::fail_exchange);
    }

    /// Validate a submission that arrives while an exchange is running.
    fn accept_while_busy(&self, raw: &str) -> Result<Utterance, PipelineError> {
        let utterance = Utterance::new(raw)?;
        let current = lock_state(&self.state).pipeline;
        if current.call_outstanding() || self.settings.submit_policy == SubmitPolicy::WhenIdle {
            return Err(PipelineError::Busy);
        }
        Ok(utterance)
    }

    fn reject(&self, e: PipelineError) {
        log::debug!("pipeline: submission rejected: {e}");
        self.emit(OracleEvent::Rejected(e));
    }

    // -----------------------------------------------------------------------
    // Dictation
    // -----------------------------------------------------------------------

    fn start_listening(&self, listener: &mut Option<JoinHandle<()>>) {
        if listener.as_ref().is_some_and(|task| !task.is_finished()) {
            log::debug!("pipeline: already listening");
            return;
        }

        self.update(|st| st.listen = ListenState::Listening);

        let recognizer = Arc::clone(&self.recognizer);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let locale = self.settings.listen_locale.clone();

        *listener = Some(tokio::spawn(async move {
            let outcome = recognizer.listen(&locale).await;

            let mut st = lock_state(&state);
            st.listen = ListenState::Idle;
            match outcome {
                Ok(Some(text)) => {
                    log::debug!("pipeline: transcript {text:?}");
                    st.transcript = Some(text.clone());
                    if let Some(events) = &events {
                        let _ = events.send(OracleEvent::Transcript(text));
                    }
                }
                Ok(None) => log::debug!("pipeline: nothing heard"),
                Err(e) if e.is_unavailable() => log::debug!("pipeline: dictation {e}"),
                Err(e) => log::warn!("pipeline: dictation failed: {e}"),
            }
        }));
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn update(&self, f: impl FnOnce(&mut AppState)) {
        f(&mut lock_state(&self.state));
    }

    /// Apply `f` and report the resulting pipeline state.
    fn transition(&self, f: impl FnOnce(&mut AppState)) {
        let next = {
            let mut st = lock_state(&self.state);
            f(&mut st);
            st.pipeline
        };
        log::debug!("pipeline: → {}", next.label());
        self.emit(OracleEvent::State(next));
    }

    fn emit(&self, event: OracleEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio::time::Instant;

    use super::*;
    use crate::pipeline::state::{new_shared_state, FIELD_DISTURBED};
    use crate::speech::SpeechError;

    const DUTCH_REPLY: &str = "Een leegte die luistert.";

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Answers from a script after a fixed delay and records every request.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(delay: Duration, replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                delay,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn replying(text: &str) -> Arc<Self> {
            Self::new(Duration::from_millis(10), vec![Ok(text.to_string())])
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(
            &self,
            _profile: InstructionProfile,
            utterance: &str,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(utterance.to_string());
            tokio::time::sleep(self.delay).await;
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }

    /// Pretends to speak for `duration`; `cancel` ends playback early.
    struct RecordingSynth {
        spoken: Mutex<Vec<String>>,
        duration: Duration,
        available: bool,
        stop: Notify,
        cancels: AtomicUsize,
    }

    impl RecordingSynth {
        fn build(duration: Duration, available: bool) -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
                duration,
                available,
                stop: Notify::new(),
                cancels: AtomicUsize::new(0),
            })
        }

        fn new(duration: Duration) -> Arc<Self> {
            Self::build(duration, true)
        }

        fn unavailable() -> Arc<Self> {
            Self::build(Duration::ZERO, false)
        }

        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynth {
        async fn speak(&self, text: &str, _voice: &VoiceParams) -> Result<(), SpeechError> {
            if !self.available {
                return Err(SpeechError::Unavailable("no voice".into()));
            }
            self.spoken.lock().unwrap().push(text.to_string());
            tokio::select! {
                () = tokio::time::sleep(self.duration) => {}
                () = self.stop.notified() => {}
            }
            Ok(())
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            self.stop.notify_waiters();
        }
    }

    struct ScriptedRecognizer(Option<String>);

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        async fn listen(&self, _locale: &str) -> Result<Option<String>, SpeechError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(self.0.clone())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    struct Harness {
        orchestrator: OracleOrchestrator,
        state: SharedState,
        events: mpsc::UnboundedReceiver<OracleEvent>,
    }

    fn harness(
        model: Arc<ScriptedModel>,
        synth: Arc<RecordingSynth>,
        recognizer: ScriptedRecognizer,
        settings: PipelineSettings,
    ) -> Harness {
        let state = new_shared_state(AppConfig::default());
        let (tx, events) = mpsc::unbounded_channel();
        let orchestrator = OracleOrchestrator::new(
            Arc::clone(&state),
            model,
            synth,
            Arc::new(recognizer),
            settings,
        )
        .with_events(tx);
        Harness {
            orchestrator,
            state,
            events,
        }
    }

    fn simple(model: Arc<ScriptedModel>, synth: Arc<RecordingSynth>) -> Harness {
        harness(model, synth, ScriptedRecognizer(None), PipelineSettings::default())
    }

    /// Send `(delay_ms, command)` pairs from a separate task, each delay
    /// measured from the previous send, then close the channel.
    fn script(commands: Vec<(u64, OracleCommand)>) -> mpsc::Receiver<OracleCommand> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for (delay, command) in commands {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if tx.send(command).await.is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn submit(text: &str) -> OracleCommand {
        OracleCommand::Submit(text.to_string())
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<OracleEvent>) -> Vec<OracleEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    fn states(events: &[OracleEvent]) -> Vec<PipelineState> {
        events
            .iter()
            .filter_map(|e| match e {
                OracleEvent::State(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    fn displayed(state: &SharedState) -> String {
        lock_state(state).displayed_text().to_string()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn dutch_question_walks_the_full_cycle() {
        let model = ScriptedModel::replying(DUTCH_REPLY);
        let synth = RecordingSynth::new(Duration::from_secs(2));
        let mut h = simple(Arc::clone(&model), Arc::clone(&synth));

        h.orchestrator.run(script(vec![(0, submit("Wat is stilte?"))])).await;

        let events = drain(&mut h.events);
        assert_eq!(
            states(&events),
            [
                PipelineState::AwaitingReply,
                PipelineState::Revealing,
                PipelineState::Speaking,
                PipelineState::Idle,
            ]
        );
        assert_eq!(model.calls(), ["Wat is stilte?"]);
        assert_eq!(displayed(&h.state), DUTCH_REPLY);
        assert_eq!(synth.spoken(), [DUTCH_REPLY]);
        assert_eq!(lock_state(&h.state).pipeline, PipelineState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_sends_nothing() {
        let model = ScriptedModel::replying(DUTCH_REPLY);
        let mut h = simple(Arc::clone(&model), RecordingSynth::new(Duration::ZERO));

        h.orchestrator
            .run(script(vec![(0, submit("")), (0, submit("   \n\t"))]))
            .await;

        let events = drain(&mut h.events);
        assert_eq!(
            events,
            [
                OracleEvent::Rejected(PipelineError::EmptyInput),
                OracleEvent::Rejected(PipelineError::EmptyInput),
            ]
        );
        assert!(model.calls().is_empty());
        assert_eq!(lock_state(&h.state).pipeline, PipelineState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn utterance_is_sent_trimmed() {
        let model = ScriptedModel::replying(DUTCH_REPLY);
        let h = simple(Arc::clone(&model), RecordingSynth::new(Duration::ZERO));

        h.orchestrator.run(script(vec![(0, submit("  Wie ben ik?  "))])).await;

        assert_eq!(model.calls(), ["Wie ben ik?"]);
    }

    #[tokio::test(start_paused = true)]
    async fn service_failure_shows_fallback_notice() {
        let model = ScriptedModel::new(
            Duration::from_millis(10),
            vec![Err(LlmError::Status {
                code: 500,
                body: "internal".into(),
            })],
        );
        let synth = RecordingSynth::new(Duration::ZERO);
        let mut h = simple(model, Arc::clone(&synth));

        h.orchestrator.run(script(vec![(0, submit("Wat is stilte?"))])).await;

        assert_eq!(
            states(&drain(&mut h.events)),
            [PipelineState::AwaitingReply, PipelineState::Failed]
        );
        assert_eq!(displayed(&h.state), FIELD_DISTURBED);
        assert!(synth.spoken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_reply_is_a_failure() {
        let model = ScriptedModel::new(Duration::ZERO, vec![Ok("  \n ".into())]);
        let h = simple(model, RecordingSynth::new(Duration::ZERO));

        h.orchestrator.run(script(vec![(0, submit("Hallo"))])).await;

        let st = lock_state(&h.state);
        assert_eq!(st.pipeline, PipelineState::Failed);
        assert_eq!(st.displayed_text(), FIELD_DISTURBED);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_state_accepts_a_new_submission() {
        let model = ScriptedModel::new(
            Duration::from_millis(10),
            vec![Err(LlmError::MissingCredential), Ok(DUTCH_REPLY.into())],
        );
        let h = simple(Arc::clone(&model), RecordingSynth::new(Duration::ZERO));

        h.orchestrator
            .run(script(vec![(0, submit("eerste")), (1_000, submit("tweede"))]))
            .await;

        assert_eq!(model.calls(), ["eerste", "tweede"]);
        let st = lock_state(&h.state);
        assert_eq!(st.pipeline, PipelineState::Idle);
        assert_eq!(st.displayed_text(), DUTCH_REPLY);
        assert!(st.notice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out() {
        let model = ScriptedModel::new(Duration::from_secs(60), vec![Ok(DUTCH_REPLY.into())]);
        let h = simple(Arc::clone(&model), RecordingSynth::new(Duration::ZERO));
        let started = Instant::now();

        h.orchestrator.run(script(vec![(0, submit("Wat is stilte?"))])).await;

        assert_eq!(model.calls().len(), 1);
        assert_eq!(displayed(&h.state), FIELD_DISTURBED);
        let waited = started.elapsed();
        assert!(
            waited >= Duration::from_secs(30) && waited < Duration::from_secs(60),
            "waited {waited:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_awaiting_reply_is_rejected() {
        let model = ScriptedModel::new(Duration::from_secs(1), vec![Ok(DUTCH_REPLY.into())]);
        let mut h = simple(Arc::clone(&model), RecordingSynth::new(Duration::ZERO));

        h.orchestrator
            .run(script(vec![(0, submit("A")), (0, submit("B"))]))
            .await;

        assert_eq!(model.calls(), ["A"]);
        assert!(drain(&mut h.events).contains(&OracleEvent::Rejected(PipelineError::Busy)));
        assert_eq!(displayed(&h.state), DUTCH_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_is_spoken_once_after_reveal_completes() {
        let model = ScriptedModel::replying(DUTCH_REPLY);
        let synth = RecordingSynth::new(Duration::from_millis(100));
        let state_seen_by_synth = Arc::new(Mutex::new(None::<String>));

        struct Peek {
            inner: Arc<RecordingSynth>,
            state: SharedState,
            seen: Arc<Mutex<Option<String>>>,
        }

        #[async_trait]
        impl SpeechSynthesizer for Peek {
            async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<(), SpeechError> {
                *self.seen.lock().unwrap() = Some(lock_state(&self.state).displayed_text().into());
                self.inner.speak(text, voice).await
            }

            fn cancel(&self) {
                self.inner.cancel();
            }
        }

        let state = new_shared_state(AppConfig::default());
        let orchestrator = OracleOrchestrator::new(
            Arc::clone(&state),
            model,
            Arc::new(Peek {
                inner: Arc::clone(&synth),
                state: Arc::clone(&state),
                seen: Arc::clone(&state_seen_by_synth),
            }),
            Arc::new(ScriptedRecognizer(None)),
            PipelineSettings::default(),
        );

        orchestrator.run(script(vec![(0, submit("Wat is stilte?"))])).await;

        assert_eq!(synth.spoken(), [DUTCH_REPLY]);
        assert_eq!(
            state_seen_by_synth.lock().unwrap().as_deref(),
            Some(DUTCH_REPLY),
            "speech must start only once the whole reply is visible"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_advances_one_character_per_interval() {
        let model = ScriptedModel::new(Duration::ZERO, vec![Ok("abcdef".into())]);
        let synth = RecordingSynth::new(Duration::from_secs(5));
        let h = simple(model, synth);
        let state = Arc::clone(&h.state);

        let (tx, rx) = mpsc::channel(16);
        let run = tokio::spawn(h.orchestrator.run(rx));
        tx.send(submit("x")).await.unwrap();

        // Frames land at t = 0, 30, 60 … ms; sample between ticks.
        tokio::time::sleep(Duration::from_millis(45)).await;
        assert_eq!(displayed(&state), "ab");
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(displayed(&state), "abcd");

        drop(tx);
        run.await.unwrap();
        assert_eq!(displayed(&state), "abcdef");
    }

    #[tokio::test(start_paused = true)]
    async fn submit_during_reveal_supersedes_the_exchange() {
        let long_reply = "De stilte spreekt in golven van licht.";
        let model = ScriptedModel::new(
            Duration::from_millis(10),
            vec![Ok(long_reply.into()), Ok(DUTCH_REPLY.into())],
        );
        let synth = RecordingSynth::new(Duration::from_millis(200));
        let h = simple(Arc::clone(&model), Arc::clone(&synth));

        h.orchestrator
            .run(script(vec![(0, submit("eerste")), (200, submit("tweede"))]))
            .await;

        assert_eq!(model.calls(), ["eerste", "tweede"]);
        assert_eq!(synth.spoken(), [DUTCH_REPLY]);
        assert_eq!(displayed(&h.state), DUTCH_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_while_speaking_cuts_the_voice_and_starts_over() {
        let model = ScriptedModel::new(
            Duration::from_millis(10),
            vec![Ok("Ja.".into()), Ok(DUTCH_REPLY.into())],
        );
        let synth = RecordingSynth::new(Duration::from_secs(10));
        let mut h = simple(Arc::clone(&model), Arc::clone(&synth));
        let state = Arc::clone(&h.state);

        let (tx, rx) = mpsc::channel(16);
        let run = tokio::spawn(h.orchestrator.run(rx));
        tx.send(submit("eerste")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(lock_state(&state).pipeline, PipelineState::Speaking);
        assert_eq!(synth.spoken(), ["Ja."]);

        tx.send(submit("tweede")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(synth.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(lock_state(&state).pipeline, PipelineState::AwaitingReply);
        assert_eq!(displayed(&state), "");

        drop(tx);
        run.await.unwrap();

        assert_eq!(model.calls(), ["eerste", "tweede"]);
        assert_eq!(synth.spoken(), ["Ja.", DUTCH_REPLY]);
        assert_eq!(
            states(&drain(&mut h.events)),
            [
                PipelineState::AwaitingReply,
                PipelineState::Revealing,
                PipelineState::Speaking,
                PipelineState::AwaitingReply,
                PipelineState::Revealing,
                PipelineState::Speaking,
                PipelineState::Idle,
            ]
        );
        assert_eq!(displayed(&state), DUTCH_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_awaiting_reply_drops_the_request() {
        let model = ScriptedModel::new(Duration::from_secs(5), vec![Ok(DUTCH_REPLY.into())]);
        let synth = RecordingSynth::new(Duration::ZERO);
        let h = simple(Arc::clone(&model), Arc::clone(&synth));
        let state = Arc::clone(&h.state);

        let (tx, rx) = mpsc::channel(16);
        let run = tokio::spawn(h.orchestrator.run(rx));
        tx.send(submit("eerste")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(lock_state(&state).pipeline, PipelineState::AwaitingReply);
        tx.send(OracleCommand::Cancel).await.unwrap();

        // Well past the moment the dropped request would have answered.
        tokio::time::sleep(Duration::from_secs(6)).await;
        {
            let st = lock_state(&state);
            assert_eq!(st.pipeline, PipelineState::Idle);
            assert!(st.reply.is_none());
            assert!(st.notice.is_none());
        }
        assert!(synth.spoken().is_empty());

        tx.send(submit("tweede")).await.unwrap();
        drop(tx);
        run.await.unwrap();

        // The cancelled call never consumed its scripted reply.
        assert_eq!(model.calls(), ["eerste", "tweede"]);
        assert_eq!(synth.spoken(), [DUTCH_REPLY]);
        assert_eq!(displayed(&state), DUTCH_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn when_idle_policy_rejects_submit_during_reveal() {
        let long_reply = "De stilte spreekt in golven van licht.";
        let model = ScriptedModel::replying(long_reply);
        let synth = RecordingSynth::new(Duration::ZERO);
        let settings = PipelineSettings {
            submit_policy: SubmitPolicy::WhenIdle,
            ..PipelineSettings::default()
        };
        let mut h = harness(
            Arc::clone(&model),
            Arc::clone(&synth),
            ScriptedRecognizer(None),
            settings,
        );

        h.orchestrator
            .run(script(vec![(0, submit("eerste")), (200, submit("tweede"))]))
            .await;

        assert_eq!(model.calls(), ["eerste"]);
        assert!(drain(&mut h.events).contains(&OracleEvent::Rejected(PipelineError::Busy)));
        assert_eq!(synth.spoken(), [long_reply]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_reveal_and_keeps_prefix() {
        let long_reply = "De stilte spreekt in golven van licht.";
        let model = ScriptedModel::new(Duration::ZERO, vec![Ok(long_reply.into())]);
        let synth = RecordingSynth::new(Duration::from_secs(1));
        let h = simple(model, Arc::clone(&synth));

        h.orchestrator
            .run(script(vec![(0, submit("eerste")), (100, OracleCommand::Cancel)]))
            .await;

        let st = lock_state(&h.state);
        assert_eq!(st.pipeline, PipelineState::Idle);
        let shown = st.displayed_text();
        assert!(!shown.is_empty() && shown.len() < long_reply.len(), "{shown:?}");
        assert!(long_reply.starts_with(shown));
        assert!(synth.spoken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_speaking_mutes_the_reply() {
        let model = ScriptedModel::new(Duration::ZERO, vec![Ok("Ja.".into())]);
        let synth = RecordingSynth::new(Duration::from_secs(10));
        let h = simple(model, Arc::clone(&synth));
        let started = Instant::now();

        h.orchestrator
            .run(script(vec![(0, submit("Hoor je mij?")), (500, OracleCommand::StopSpeaking)]))
            .await;

        assert_eq!(synth.spoken(), ["Ja."]);
        assert_eq!(synth.cancels.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(lock_state(&h.state).pipeline, PipelineState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_speech_still_finishes_idle() {
        let model = ScriptedModel::replying(DUTCH_REPLY);
        let mut h = simple(model, RecordingSynth::unavailable());

        h.orchestrator.run(script(vec![(0, submit("Wat is stilte?"))])).await;

        assert_eq!(states(&drain(&mut h.events)).last(), Some(&PipelineState::Idle));
        assert_eq!(displayed(&h.state), DUTCH_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn transcript_populates_without_submitting() {
        let model = ScriptedModel::replying(DUTCH_REPLY);
        let mut h = harness(
            Arc::clone(&model),
            RecordingSynth::new(Duration::ZERO),
            ScriptedRecognizer(Some("Wat is stilte?".into())),
            PipelineSettings::default(),
        );
        let state = Arc::clone(&h.state);

        let (tx, rx) = mpsc::channel(16);
        let run = tokio::spawn(h.orchestrator.run(rx));
        tx.send(OracleCommand::Listen).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(lock_state(&state).listen, ListenState::Listening);

        drop(tx);
        run.await.unwrap();

        let mut st = lock_state(&state);
        assert_eq!(st.listen, ListenState::Idle);
        assert_eq!(st.take_transcript().as_deref(), Some("Wat is stilte?"));
        assert_eq!(st.pipeline, PipelineState::Idle);
        assert!(model.calls().is_empty());
        assert_eq!(
            drain(&mut h.events),
            [OracleEvent::Transcript("Wat is stilte?".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_listen_while_listening_is_ignored() {
        struct CountingRecognizer(AtomicUsize);

        #[async_trait]
        impl SpeechRecognizer for CountingRecognizer {
            async fn listen(&self, _locale: &str) -> Result<Option<String>, SpeechError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(None)
            }
        }

        let recognizer = Arc::new(CountingRecognizer(AtomicUsize::new(0)));
        let orchestrator = OracleOrchestrator::new(
            new_shared_state(AppConfig::default()),
            ScriptedModel::replying(DUTCH_REPLY),
            RecordingSynth::new(Duration::ZERO),
            Arc::clone(&recognizer) as Arc<dyn SpeechRecognizer>,
            PipelineSettings::default(),
        );

        orchestrator
            .run(script(vec![
                (0, OracleCommand::Listen),
                (100, OracleCommand::Listen),
                (1_000, OracleCommand::Listen),
            ]))
            .await;

        assert_eq!(recognizer.0.load(Ordering::SeqCst), 2);
    }
}
