mod api;
mod defaults;
mod validation;

use crate::cli::Args;
use crate::error::{ChatError, Result};
use crate::session::SessionOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use api::ApiConfig;
pub use defaults::{
    default_base_url, default_context_window, default_history_capacity, default_stream_timeout,
};
pub use validation::{expand_env_var_in_string, normalize_base_url, parse_flag, require_positive};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub window: Option<usize>,
}

/// Contents of an `agentchat.yaml` / `agentchat.json` file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub stream_timeout: u64,
    pub history_capacity: usize,
    pub context_window: usize,
    pub verbose: bool,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        let file_config = FileConfig::load().map_err(|e| ChatError::Config(format!("{:#}", e)))?;
        Self::resolve(args, &file_config, |key| env::var(key).ok())
    }

    /// Merge the layers: CLI args > environment > config file > defaults.
    pub fn resolve<F>(args: &Args, file_config: &FileConfig, env_lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base_url = args
            .base_url
            .clone()
            .or_else(|| env_lookup("AGENTCHAT_BASE_URL"))
            .or_else(|| file_config.api.base_url.clone())
            .unwrap_or_else(default_base_url);
        let base_url = normalize_base_url(&expand_env_var_in_string(&raw_base_url, &env_lookup))?;

        let stream_timeout = args
            .stream_timeout
            .or_else(|| parse_env(&env_lookup, "AGENTCHAT_STREAM_TIMEOUT"))
            .or(file_config.api.stream_timeout)
            .unwrap_or_else(default_stream_timeout);
        if stream_timeout == 0 {
            return Err(ChatError::Config(
                "stream timeout must be at least 1 second".to_string(),
            ));
        }

        let history_capacity = args
            .history_capacity
            .or_else(|| parse_env(&env_lookup, "AGENTCHAT_HISTORY_CAPACITY"))
            .or(file_config.history.capacity)
            .unwrap_or_else(default_history_capacity);

        let context_window = args
            .context_window
            .or_else(|| parse_env(&env_lookup, "AGENTCHAT_CONTEXT_WINDOW"))
            .or(file_config.history.window)
            .unwrap_or_else(default_context_window);

        // --verbose can only turn logging on; the env var may also turn it off.
        let verbose = args.verbose
            || env_lookup("AGENTCHAT_VERBOSE")
                .map(|v| parse_flag(&v))
                .or(file_config.session.verbose)
                .unwrap_or(false);

        Ok(Config {
            base_url,
            stream_timeout,
            history_capacity: require_positive("history capacity", history_capacity)?,
            context_window: require_positive("context window", context_window)?,
            verbose,
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            history_capacity: self.history_capacity,
            context_window: self.context_window,
            stream_timeout: Duration::from_secs(self.stream_timeout),
        }
    }
}

fn parse_env<F, T>(env_lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    env_lookup(key).and_then(|v| v.trim().parse::<T>().ok())
}

impl FileConfig {
    /// Load the first config file found, or defaults when there is none.
    pub fn load() -> anyhow::Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(FileConfig::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let config = if is_yaml {
            serde_yaml::from_str(&contents).with_context(|| {
                format!("Failed to parse YAML config file: {}", path.display())
            })?
        } else {
            serde_json::from_str(&contents).with_context(|| {
                format!("Failed to parse JSON config file: {}", path.display())
            })?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".agentchat.yaml"),
            PathBuf::from(".agentchat.yml"),
            PathBuf::from(".agentchat.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("agentchat");
            paths.push(config_dir.join("agentchat.yaml"));
            paths.push(config_dir.join("agentchat.yml"));
            paths.push(config_dir.join("agentchat.json"));
        }

        paths
    }
}
