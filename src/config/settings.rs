//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every struct is `#[serde(default)]`, so a hand-edited `settings.toml` only
//! needs the keys it wants to override.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variables consulted (in order) when `service.api_key` is unset.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

// ---------------------------------------------------------------------------
// ServiceProvider
// ---------------------------------------------------------------------------

/// Selects which hosted text-generation API answers the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ServiceProvider {
    /// Google Generative Language API (`generateContent`).
    Gemini,
    /// Any OpenAI-compatible REST API (OpenAI, Groq, Ollama, LM Studio …).
    OpenAiCompatible,
}

impl Default for ServiceProvider {
    fn default() -> Self {
        Self::Gemini
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Connection settings for the generative-language service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Which backend to use.
    pub provider: ServiceProvider,
    /// Base URL of the API endpoint, without a trailing slash.
    ///
    /// - Gemini: `https://generativelanguage.googleapis.com`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key. `None` falls back to [`API_KEY_ENV_VARS`].
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature; `None` leaves the provider default in place.
    pub temperature: Option<f32>,
    /// Maximum seconds to wait for a reply before the exchange fails.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            provider: ServiceProvider::default(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            model: "gemini-2.5-flash".into(),
            temperature: None,
            timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// The credential to send: the configured key if non-empty, otherwise
    /// the first non-empty variable from [`API_KEY_ENV_VARS`].
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|k| !k.trim().is_empty())
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// SubmitPolicy / RevealConfig
// ---------------------------------------------------------------------------

/// What happens to a submission that arrives while a reply is being revealed
/// or spoken.  A submission while the service call is still outstanding is
/// always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SubmitPolicy {
    /// The new submission replaces the current exchange; its reveal and
    /// speech are dropped.
    Interrupt,
    /// Only `Idle` / `Failed` accept a submission.
    WhenIdle,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self::Interrupt
    }
}

/// Type-in effect settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Delay between two revealed characters, in milliseconds.
    pub interval_ms: u64,
    /// Submission handling while revealing / speaking.
    pub submit_policy: SubmitPolicy,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30,
            submit_policy: SubmitPolicy::default(),
        }
    }
}

impl RevealConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak every reply once it is fully revealed.
    pub enabled: bool,
    /// BCP-47 locale of the voice (e.g. `"nl-NL"`).
    pub locale: String,
    /// Voice pitch, `1.0` = normal.  Lower is deeper.
    pub pitch: f32,
    /// Speaking rate, `1.0` = normal.  Lower is slower.
    pub rate: f32,
    /// Synthesizer executable.
    pub program: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: "nl-NL".into(),
            pitch: 0.8,
            rate: 0.9,
            program: "espeak-ng".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ListenConfig
// ---------------------------------------------------------------------------

/// Microphone dictation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Whether the microphone control does anything at all.
    pub enabled: bool,
    /// BCP-47 locale passed to the recognizer (e.g. `"nl-NL"`).
    pub locale: String,
    /// GGML model file stem under the models directory.
    pub model: String,
    /// RMS threshold above which a 30 ms frame counts as voice.
    pub vad_threshold: f32,
    /// Silence after speech that ends the utterance, in milliseconds.
    pub silence_ms: u64,
    /// Hard cap on one listening session, in seconds.
    pub max_listen_secs: f32,
    /// Whisper beam width; 0 or 1 decodes greedily.
    pub beam_size: u32,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: "nl-NL".into(),
            model: "ggml-base".into(),
            vad_threshold: 0.01,
            silence_ms: 1_200,
            max_listen_secs: 15.0,
            beam_size: 0,
        }
    }
}

impl ListenConfig {
    pub fn silence(&self) -> Duration {
        Duration::from_millis(self.silence_ms)
    }

    /// Session cap, clamped to the 0.5–60 s window the STT engine accepts.
    pub fn max_length(&self) -> Duration {
        let secs = if self.max_listen_secs.is_finite() {
            self.max_listen_secs.clamp(0.5, 60.0)
        } else {
            15.0
        };
        Duration::from_secs_f32(secs)
    }
}

// ---------------------------------------------------------------------------
// DroneConfig
// ---------------------------------------------------------------------------

/// Theta drone synthesis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    /// Carrier frequency in Hz.
    pub carrier_hz: f32,
    /// Amplitude-modulation frequency in Hz.
    pub lfo_hz: f32,
    /// Constant part of the modulated gain; the LFO swings ±1 around it.
    pub am_base: f32,
    /// Output volume.
    pub master_gain: f32,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            carrier_hz: 136.1,
            lfo_hz: 4.0,
            am_base: 0.5,
            master_gain: 0.15,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial inner window size `(width, height)` in points.
    pub window_size: (f32, f32),
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (560.0, 360.0),
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use resonance_oracle::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generative-language service connection.
    pub service: ServiceConfig,
    /// Type-in effect and submission policy.
    pub reveal: RevealConfig,
    /// Text-to-speech.
    pub speech: SpeechConfig,
    /// Microphone dictation.
    pub listen: ListenConfig,
    /// Background theta drone.
    pub drone: DroneConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
