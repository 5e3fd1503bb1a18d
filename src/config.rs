use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::browser::AgenticBrowser;
use crate::error::{Error, Result};
use crate::knowledge::{KnowledgeEntry, Value};

pub struct BrowserConfig {
    pub headless: bool,
    pub stealth: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
    /// Persistent Chrome profile. Sign in once by hand with the same profile
    /// and every later run starts authenticated.
    pub user_data_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            stealth: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chrome_path: None,
            user_data_dir: None,
        }
    }
}

pub struct BrowserBuilder {
    config: BrowserConfig,
}

impl BrowserBuilder {
    pub fn new() -> Self {
        Self {
            config: BrowserConfig::default(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn stealth(mut self, stealth: bool) -> Self {
        self.config.stealth = stealth;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn user_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.user_data_dir = Some(path.into());
        self
    }

    pub fn build_config(self) -> BrowserConfig {
        self.config
    }

    pub async fn build(self) -> Result<AgenticBrowser> {
        AgenticBrowser::launch(self.build_config()).await
    }
}

impl Default for BrowserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Apply configuration ─────────────────────────────────────────────

/// Everything a session needs to fill forms: the operator identity, the
/// knowledge base, default policies and pacing.
///
/// Loaded once at session start and never mutated afterwards.
///
/// ```toml
/// identity = "jane@example.com"
///
/// [[knowledge]]
/// question = "years of experience"
/// answer = "2"
///
/// [steps]
/// max_steps = 8
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Login identity; answers "email" text fields nothing else matched.
    pub identity: String,
    /// Ordered question fragment → answer pairs. First match wins.
    pub knowledge: Vec<KnowledgeEntry>,
    pub defaults: DefaultPolicy,
    pub typing: TypingConfig,
    pub steps: StepConfig,
    /// Upper bound for a single wait on an element (apply button, dismiss).
    pub wait_timeout_ms: u64,
    /// How long to look for the confirmation overlay after a flow ends.
    pub dismiss_timeout_ms: u64,
    /// Pause after opening a job before looking for its apply button.
    pub job_settle_ms: u64,
    /// Option or dropdown texts that mean "nothing chosen yet".
    pub placeholders: Vec<String>,
    pub semantic: Option<SemanticConfig>,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            knowledge: Vec::new(),
            defaults: DefaultPolicy::default(),
            typing: TypingConfig::default(),
            steps: StepConfig::default(),
            wait_timeout_ms: 15_000,
            dismiss_timeout_ms: 5_000,
            job_settle_ms: 1_500,
            placeholders: vec![
                "select an option".into(),
                "please make a selection".into(),
                "please enter a valid answer".into(),
            ],
            semantic: None,
        }
    }
}

impl ApplyConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps.max_steps == 0 {
            return Err(Error::ConfigError("steps.max_steps must be at least 1".into()));
        }
        if self.typing.min_delay_ms > self.typing.max_delay_ms {
            return Err(Error::ConfigError(format!(
                "typing.min_delay_ms ({}) exceeds typing.max_delay_ms ({})",
                self.typing.min_delay_ms, self.typing.max_delay_ms
            )));
        }
        if let Some(semantic) = &self.semantic {
            if !(0.0..=1.0).contains(&semantic.threshold) {
                return Err(Error::ConfigError(format!(
                    "semantic.threshold must be within 0.0..=1.0, got {}",
                    semantic.threshold
                )));
            }
        }
        if self.knowledge.iter().any(|e| e.question.trim().is_empty()) {
            return Err(Error::ConfigError("knowledge entries need a non-empty question".into()));
        }
        Ok(())
    }

    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Append a knowledge base entry. Earlier entries take priority.
    pub fn answer(mut self, question: impl Into<String>, answer: impl Into<Value>) -> Self {
        self.knowledge.push(KnowledgeEntry {
            question: question.into(),
            answer: answer.into(),
        });
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.steps.max_steps = max_steps;
        self
    }

    /// Keystroke delay range. `(0, 0)` types without pausing.
    pub fn typing_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.typing.min_delay_ms = min_ms;
        self.typing.max_delay_ms = max_ms;
        self
    }

    /// Drop every pause: keystrokes, step settling, job settling.
    pub fn without_delays(mut self) -> Self {
        self.typing.min_delay_ms = 0;
        self.typing.max_delay_ms = 0;
        self.steps.settle_ms = 0;
        self.job_settle_ms = 0;
        self
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn dismiss_timeout(&self) -> Duration {
        Duration::from_millis(self.dismiss_timeout_ms)
    }

    pub fn job_settle(&self) -> Duration {
        Duration::from_millis(self.job_settle_ms)
    }

    /// Case-insensitive placeholder check on a trimmed option text.
    pub fn is_placeholder(&self, text: &str) -> bool {
        let text = text.trim();
        text.is_empty() || self.placeholders.iter().any(|p| p.eq_ignore_ascii_case(text))
    }
}

/// Answers used when neither the knowledge base nor the semantic matcher
/// had anything for a field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultPolicy {
    /// Tick unmatched, enabled checkboxes (opt-in).
    pub check_unmatched_checkboxes: bool,
    /// Answer for unmatched radio groups asking about visa or sponsorship.
    /// `None` leaves those groups alone.
    pub sponsorship_answer: Option<String>,
    pub phone: String,
    pub years_experience: String,
    pub country_code: String,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            check_unmatched_checkboxes: true,
            sponsorship_answer: Some("No".into()),
            phone: "1234567890".into(),
            years_experience: "3".into(),
            country_code: "US".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 50,
            max_delay_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Hard cap on fill passes per application.
    pub max_steps: usize,
    /// Pause after clicking a navigation control.
    pub settle_ms: u64,
    pub next_label: String,
    pub review_label: String,
    pub submit_label: String,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            settle_ms: 1_000,
            next_label: "Next".into(),
            review_label: "Review".into(),
            submit_label: "Submit application".into(),
        }
    }
}

impl StepConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Similarity fallback consulted when no knowledge base fragment matches.
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticConfig {
    /// Minimum confidence for a similarity match to be used.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub entries: Vec<KnowledgeEntry>,
}

fn default_threshold() -> f64 {
    0.5
}
