//! Configuration file management for swimplan.
//!
//! Provides a TOML-based config file at `~/.config/swimplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.
//!
//! The Anthropic API key is only ever read from `ANTHROPIC_API_KEY`; it is
//! never written to the config file.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use swimplan_core::llm::anthropic::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use swimplan_core::llm::{AnthropicClient, ClaudeCliClient};
use swimplan_core::pipeline::DEFAULT_CALL_TIMEOUT;
use swimplan_core::{LlmClient, Planner};

pub const PROVIDER_VAR: &str = "SWIMPLAN_PROVIDER";
pub const MODEL_VAR: &str = "SWIMPLAN_MODEL";
pub const TIMEOUT_VAR: &str = "SWIMPLAN_TIMEOUT_SECS";
pub const BINARY_VAR: &str = "SWIMPLAN_CLAUDE_BINARY";

const DEFAULT_BINARY: &str = "claude";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_binary: Option<String>,
}

/// Which LLM realization to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    ClaudeCli,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::ClaudeCli => "claude-cli",
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "claude-cli" | "claude_cli" | "claude" => Ok(Self::ClaudeCli),
            other => bail!("unknown provider {other:?} (expected \"anthropic\" or \"claude-cli\")"),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the swimplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/swimplan` or `~/.config/swimplan`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("swimplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("swimplan")
}

/// Return the path to the swimplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// LLM settings given on the command line.
#[derive(Debug, Default, Clone)]
pub struct LlmFlags {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub claude_binary: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwimplanConfig {
    pub provider: Provider,
    /// `None` lets the Claude CLI pick its own default model.
    pub model: Option<String>,
    pub call_timeout: Duration,
    pub max_tokens: u32,
    pub claude_binary: String,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl SwimplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// A config file that exists but cannot be parsed is an error; a missing
    /// one is not.
    pub fn resolve(flags: &LlmFlags) -> Result<Self> {
        let file = if config_path().exists() {
            load_config()?
        } else {
            ConfigFile::default()
        };
        let llm = file.llm;

        let provider = match flags
            .provider
            .clone()
            .or_else(|| env_var(PROVIDER_VAR))
            .or(llm.provider)
        {
            Some(p) => p.parse()?,
            None => Provider::Anthropic,
        };

        let model = flags.model.clone().or_else(|| env_var(MODEL_VAR)).or(llm.model);

        let timeout_secs = match flags.timeout_secs {
            Some(t) => Some(t),
            None => match env_var(TIMEOUT_VAR) {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{TIMEOUT_VAR} is not a whole number of seconds: {raw:?}"))?,
                ),
                None => llm.timeout_secs,
            },
        };
        let call_timeout = match timeout_secs {
            Some(0) => bail!("timeout must be at least 1 second"),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_CALL_TIMEOUT,
        };

        let claude_binary = flags
            .claude_binary
            .clone()
            .or_else(|| env_var(BINARY_VAR))
            .or(llm.claude_binary)
            .unwrap_or_else(|| DEFAULT_BINARY.to_string());

        Ok(Self {
            provider,
            model,
            call_timeout,
            max_tokens: llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            claude_binary,
        })
    }

    /// Build the configured LLM client.
    pub fn client(&self) -> Arc<dyn LlmClient> {
        match self.provider {
            Provider::Anthropic => {
                let model = self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());
                Arc::new(AnthropicClient::from_env(model).with_max_tokens(self.max_tokens))
            }
            Provider::ClaudeCli => {
                let client = ClaudeCliClient::with_binary(&self.claude_binary);
                match &self.model {
                    Some(model) => Arc::new(client.with_model(model)),
                    None => Arc::new(client),
                }
            }
        }
    }

    /// Build a planner around the configured client.
    pub fn planner(&self) -> Planner {
        Planner::new(self.client()).with_call_timeout(self.call_timeout)
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{ScopedEnv, lock_env};

    const ALL_VARS: [&str; 4] = [PROVIDER_VAR, MODEL_VAR, TIMEOUT_VAR, BINARY_VAR];

    /// Point XDG_CONFIG_HOME at a temp dir and clear every swimplan variable.
    fn isolated(tmp: &tempfile::TempDir) -> ScopedEnv {
        let mut env = ScopedEnv::new();
        env.set("XDG_CONFIG_HOME", tmp.path().to_str().unwrap());
        for var in ALL_VARS {
            env.remove(var);
        }
        env
    }

    fn write_file(tmp: &tempfile::TempDir, contents: &str) {
        let dir = tmp.path().join("swimplan");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), contents).unwrap();
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = isolated(&tmp);

        let config = SwimplanConfig::resolve(&LlmFlags::default()).unwrap();
        assert_eq!(config.provider, Provider::Anthropic);
        assert_eq!(config.model, None);
        assert_eq!(config.call_timeout, Duration::from_secs(60));
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.claude_binary, "claude");
    }

    #[test]
    fn config_file_is_read() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = isolated(&tmp);
        write_file(
            &tmp,
            "[llm]\nprovider = \"claude-cli\"\nmodel = \"sonnet\"\ntimeout_secs = 30\nmax_tokens = 2048\n",
        );

        let config = SwimplanConfig::resolve(&LlmFlags::default()).unwrap();
        assert_eq!(config.provider, Provider::ClaudeCli);
        assert_eq!(config.model.as_deref(), Some("sonnet"));
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.max_tokens, 2048);
    }

    #[test]
    fn env_var_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let mut env = isolated(&tmp);
        write_file(&tmp, "[llm]\nprovider = \"claude-cli\"\ntimeout_secs = 30\n");
        env.set(PROVIDER_VAR, "anthropic");
        env.set(TIMEOUT_VAR, "90");

        let config = SwimplanConfig::resolve(&LlmFlags::default()).unwrap();
        assert_eq!(config.provider, Provider::Anthropic);
        assert_eq!(config.call_timeout, Duration::from_secs(90));
    }

    #[test]
    fn cli_flag_overrides_all() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let mut env = isolated(&tmp);
        write_file(&tmp, "[llm]\nmodel = \"file-model\"\n");
        env.set(MODEL_VAR, "env-model");
        env.set(BINARY_VAR, "/opt/env/claude");

        let flags = LlmFlags {
            model: Some("flag-model".to_string()),
            claude_binary: Some("/opt/flag/claude".to_string()),
            ..LlmFlags::default()
        };
        let config = SwimplanConfig::resolve(&flags).unwrap();
        assert_eq!(config.model.as_deref(), Some("flag-model"));
        assert_eq!(config.claude_binary, "/opt/flag/claude");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = isolated(&tmp);
        write_file(&tmp, "[llm\nprovider = ");

        let err = SwimplanConfig::resolve(&LlmFlags::default()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"), "unexpected error: {err}");
    }

    #[test]
    fn bad_timeout_env_is_an_error() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let mut env = isolated(&tmp);
        env.set(TIMEOUT_VAR, "soon");

        let err = SwimplanConfig::resolve(&LlmFlags::default()).unwrap_err();
        assert!(err.to_string().contains(TIMEOUT_VAR), "unexpected error: {err}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = isolated(&tmp);

        let flags = LlmFlags {
            timeout_secs: Some(0),
            ..LlmFlags::default()
        };
        assert!(SwimplanConfig::resolve(&flags).is_err());
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let err = "openai".parse::<Provider>().unwrap_err();
        assert!(err.to_string().contains("unknown provider"), "unexpected error: {err}");
        assert_eq!("Claude_CLI".parse::<Provider>().unwrap(), Provider::ClaudeCli);
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _env = isolated(&tmp);

        let original = ConfigFile {
            llm: LlmSection {
                provider: Some("claude-cli".to_string()),
                model: Some("haiku".to_string()),
                timeout_secs: Some(45),
                max_tokens: None,
                claude_binary: None,
            },
        };
        save_config(&original).unwrap();

        let written = std::fs::read_to_string(config_path()).unwrap();
        assert!(!written.contains("max_tokens"));
        let loaded = load_config().unwrap();
        assert_eq!(loaded.llm.provider, original.llm.provider);
        assert_eq!(loaded.llm.timeout_secs, Some(45));
    }

    #[test]
    fn client_matches_provider() {
        let config = SwimplanConfig {
            provider: Provider::ClaudeCli,
            model: None,
            call_timeout: Duration::from_secs(5),
            max_tokens: 100,
            claude_binary: "claude".to_string(),
        };
        assert_eq!(config.client().name(), "claude-cli");
        assert_eq!(config.planner().client_name(), "claude-cli");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("swimplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
