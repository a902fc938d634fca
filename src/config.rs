use std::path::{Path, PathBuf};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;

/// Config file name looked up in the working directory.
pub const CONFIG_TOML: &str = "tagrelease.toml";

/// Environment variables that override secrets from the file.
pub const ENV_BOT_TOKEN: &str = "TAGRELEASE_BOT_TOKEN";
pub const ENV_PROVIDER_TOKEN: &str = "TAGRELEASE_PROVIDER_TOKEN";

/// Find the config file.
///
/// Priority order (highest first):
/// 1. `dir/tagrelease.toml`
/// 2. `<user config dir>/tagrelease/config.toml`
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let local = dir.join(CONFIG_TOML);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("tagrelease").join("config.toml");
    user.exists().then_some(user)
}

/// Resolve an explicit `--config` path or fall back to [`find_config`].
pub fn locate(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    find_config(&cwd).ok_or_else(|| {
        ExitError::Config(format!(
            "no {CONFIG_TOML} found in {} or the user config directory",
            cwd.display()
        ))
        .into()
    })
}

/// Top-level tagrelease.toml config.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    pub bot: BotConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BotConfig {
    /// Bot username, informational.
    #[serde(default)]
    pub name: String,
    /// Bot API token. `TAGRELEASE_BOT_TOKEN` takes precedence.
    #[serde(default)]
    pub token: String,
    /// Telegram user ids allowed to run commands.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Chat ids the bot answers in. Empty means any chat.
    #[serde(default)]
    pub chats: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Long-poll window in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProviderConfig {
    /// GitLab base URL, e.g. `https://gitlab.example.com`.
    pub host: String,
    /// API token. `TAGRELEASE_PROVIDER_TOKEN` takes precedence.
    #[serde(default)]
    pub token: String,
    /// Group whose projects are the services.
    pub group: String,
    /// Project whose branches are the stands.
    pub release: String,
    /// Branch tags are built from when a request names none.
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Directories and projects starting with this are not services.
    #[serde(default = "default_hidden_prefix")]
    pub hidden_prefix: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout: u64,
}

fn default_api_base() -> String { "https://api.telegram.org".into() }
fn default_poll_timeout() -> u64 { 30 }
fn default_branch() -> String { "develop".into() }
fn default_hidden_prefix() -> String { crate::domain::service::HIDDEN_PREFIX.into() }
fn default_request_timeout() -> u64 { 30 }

impl Config {
    /// Load config from a file and apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ExitError::Config(format!("reading {}: {e}", path.display())))?;
        let mut config = Self::parse_toml(&contents)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).map_err(|e| {
            ExitError::Config(format!("invalid {CONFIG_TOML}: {e}")).into()
        })
    }

    /// Override secrets from the environment. `lookup` is injectable so tests
    /// don't touch the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(ENV_BOT_TOKEN).filter(|t| !t.is_empty()) {
            self.bot.token = token;
        }
        if let Some(token) = lookup(ENV_PROVIDER_TOKEN).filter(|t| !t.is_empty()) {
            self.provider.token = token;
        }
    }

    /// Problems that would stop the bot from working. Empty when runnable.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.bot.token.is_empty() {
            issues.push(format!("bot.token is empty (set it or {ENV_BOT_TOKEN})"));
        }
        if self.provider.token.is_empty() {
            issues.push(format!("provider.token is empty (set it or {ENV_PROVIDER_TOKEN})"));
        }
        if self.bot.admins.is_empty() {
            issues.push("bot.admins is empty; nobody can run commands".to_string());
        }
        if !self.provider.host.starts_with("http://") && !self.provider.host.starts_with("https://") {
            issues.push(format!("provider.host '{}' is not an http(s) URL", self.provider.host));
        }
        issues
    }

    /// Fail with a config error if [`Config::issues`] reports anything.
    pub fn validate(&self) -> anyhow::Result<()> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ExitError::Config(issues.join("; ")).into())
        }
    }
}
