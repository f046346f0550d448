//! Configuration loading for agent-memos.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The config file lives at ~/.config/agent-memos/config.toml.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MemosError;

/// Upper bound on generated tokens per backend call.
pub const MAX_GENERATED_TOKENS: u32 = 1000;

/// Backend providers understood by the generator.
pub const KNOWN_PROVIDERS: &[&str] = &["anthropic", "openai"];

/// Text generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Provider name ("anthropic" or "openai")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// API token (from LLM_TOKEN or MEMOS_GENERATOR__API_KEY, not the config file)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL; the provider default is used when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Generated token budget per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model() -> String {
    "claude-3-7-sonnet-20250219".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    MAX_GENERATED_TOKENS
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GeneratorSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), MemosError> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(MemosError::InvalidInput(format!(
                "unknown generator provider '{}', expected one of {:?}",
                self.provider, KNOWN_PROVIDERS
            )));
        }
        if self.max_tokens == 0 || self.max_tokens > MAX_GENERATED_TOKENS {
            return Err(MemosError::InvalidInput(format!(
                "max_tokens must be 1-{}, got {}",
                MAX_GENERATED_TOKENS, self.max_tokens
            )));
        }
        if self.timeout_secs == 0 {
            return Err(MemosError::InvalidInput(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The API token, required before any backend call.
    pub fn require_api_key(&self) -> Result<&str, MemosError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| MemosError::Config("LLM token is not set (LLM_TOKEN)".to_string()))
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the memo file; relative paths sit next to the executable
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Text generator configuration
    #[serde(default)]
    pub generator: GeneratorSettings,
}

fn default_store_path() -> String {
    "memos.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_level: default_log_level(),
            generator: GeneratorSettings::default(),
        }
    }
}

/// Variables honored for compatibility with existing deployments.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("ANTHROPIC_MODEL", "generator.model"),
    ("LLM_TOKEN", "generator.api_key"),
    ("LLM_BASE_URL", "generator.base_url"),
];

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/agent-memos/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (MEMOS_*, nested keys joined by `__`)
    /// 5. ANTHROPIC_MODEL, LLM_TOKEN, LLM_BASE_URL
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, MemosError> {
        Self::load_with_env(cli_config_path, |name| std::env::var(name).ok())
    }

    /// Same as [`Settings::load`], reading the legacy variables through `lookup`.
    pub fn load_with_env<F>(cli_config_path: Option<&str>, lookup: F) -> Result<Self, MemosError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_dir = ProjectDirs::from("", "", "agent-memos")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("store_path", default_store_path())
            .map_err(|e| MemosError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| MemosError::Config(e.to_string()))?
            .set_default("generator.provider", default_provider())
            .map_err(|e| MemosError::Config(e.to_string()))?
            .set_default("generator.model", default_model())
            .map_err(|e| MemosError::Config(e.to_string()))?
            .set_default("generator.timeout_secs", default_timeout_secs() as i64)
            .map_err(|e| MemosError::Config(e.to_string()))?
            .set_default("generator.max_tokens", default_max_tokens() as i64)
            .map_err(|e| MemosError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: MEMOS_STORE_PATH, MEMOS_GENERATOR__MODEL, etc.
        builder = builder.add_source(
            Environment::with_prefix("MEMOS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_ENV_OVERRIDES {
            let value = lookup(var).filter(|v| !v.is_empty());
            builder = builder
                .set_override_option(*key, value)
                .map_err(|e| MemosError::Config(e.to_string()))?;
        }

        let settings: Settings = builder
            .build()
            .map_err(|e| MemosError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MemosError::Config(e.to_string()))?;

        settings.generator.validate()?;
        Ok(settings)
    }

    /// Resolve `store_path` to a concrete file location.
    ///
    /// `~/` expands to the home directory; other relative paths are taken
    /// relative to the directory holding the running executable.
    pub fn resolve_store_path(&self) -> Result<PathBuf, MemosError> {
        let exe = std::env::current_exe()
            .map_err(|e| MemosError::Config(format!("cannot locate executable: {e}")))?;
        let exe_dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(resolve_relative_to(&self.store_path, exe_dir))
    }
}

/// Resolve a configured path against `base`, expanding a leading `~/`.
pub fn resolve_relative_to(raw: &str, base: &Path) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
