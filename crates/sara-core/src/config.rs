use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SaraError};
use crate::types::PermissionLevel;

/// Top-level configuration for the Sara assistant.
///
/// Loaded from `~/.sara/config.toml` by default. Every section falls back to
/// its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaraConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

impl SaraConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SaraConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SaraError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Absolute location of the durable audit log.
    pub fn audit_path(&self) -> PathBuf {
        let file = Path::new(&self.audit.file_name);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            expand_home(&self.general.data_dir).join(file)
        }
    }
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&path[2..])
    } else {
        PathBuf::from(path)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the audit log and other durable state.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.sara/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Command pipeline settings: confirmation gate and security policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seconds to wait for a yes/no reply before cancelling a high-risk plan.
    pub confirmation_timeout_secs: u64,
    /// Words that approve a confirmation prompt.
    pub affirmative_words: Vec<String>,
    /// Words that reject a confirmation prompt. They win over affirmative words.
    pub negative_words: Vec<String>,
    /// Highest tier the security gate permits. Actions above it are denied.
    pub max_permission_level: PermissionLevel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 5,
            affirmative_words: ["yes", "yeah", "yep", "sure", "confirm", "ok", "okay"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            negative_words: ["no", "nope", "cancel", "stop", "don't", "dont"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
            max_permission_level: PermissionLevel::High,
        }
    }
}

/// Conversation context settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum number of history entries kept per session.
    pub max_history: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { max_history: 50 }
    }
}

/// On-disk layout of the audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFormat {
    /// One JSON object per line, appended per entry.
    #[default]
    JsonLines,
    /// A single JSON array rewritten in full on every entry.
    JsonArray,
}

/// Audit trail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Audit file name, relative to `general.data_dir` unless absolute.
    pub file_name: String,
    /// Storage format.
    pub format: AuditFormat,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            file_name: "sara_audit.jsonl".to_string(),
            format: AuditFormat::JsonLines,
        }
    }
}

/// Which capability set backs the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationMode {
    /// Record every capability call without touching the operating system.
    #[default]
    Simulated,
    /// Drive the real desktop.
    Desktop,
}

/// Desktop automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub mode: AutomationMode,
    /// Directory where file and folder commands operate.
    pub workspace_dir: String,
    /// Search URL template; `{query}` is replaced by the encoded query.
    pub search_url: String,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            mode: AutomationMode::Simulated,
            workspace_dir: "~/Desktop".to_string(),
            search_url: "https://www.google.com/search?q={query}".to_string(),
        }
    }
}
