use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::DEFAULT_FILTER;

pub const ENV_API_URL: &str = "BUDGETPULSE_API_URL";
pub const ENV_DB: &str = "BUDGETPULSE_DB";
pub const ENV_LOG: &str = "BUDGETPULSE_LOG";
pub const ENV_TOKEN: &str = "BUDGETPULSE_TOKEN";

const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "budgetpulse.db";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "budgetpulse", "BudgetPulse")
}

/// Runtime settings. Sources, later wins: defaults, `config.json` in the
/// project config dir, `BUDGETPULSE_*` environment variables, command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Remote API base URL. When unset the local SQLite store is used.
    pub api_url: Option<String>,
    /// Bearer token for the remote API.
    pub api_token: Option<String>,
    pub database_path: PathBuf,
    pub log_filter: String,
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        let database_path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DB_FILE))
            .unwrap_or_else(|| PathBuf::from(DB_FILE));
        Self {
            api_url: None,
            api_token: None,
            database_path,
            log_filter: DEFAULT_FILTER.to_string(),
            currency_symbol: "$".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the config file if there is one, then the environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Read `path`; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Override from environment variables. Empty values are ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = var(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(path) = var(ENV_DB) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(filter) = var(ENV_LOG) {
            self.log_filter = filter;
        }
        if let Some(token) = var(ENV_TOKEN) {
            self.api_token = Some(token);
        }
    }

    /// Strip `--api <url>` and `--db <path>` from `args`, applying them.
    /// Returns the remaining arguments in order.
    pub fn apply_args(&mut self, args: &[String]) -> Result<Vec<String>> {
        let mut rest = Vec::with_capacity(args.len());
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--api" => {
                    let url = iter.next().context("--api needs a URL")?;
                    self.api_url = Some(url.clone());
                }
                "--db" => {
                    let path = iter.next().context("--db needs a path")?;
                    self.database_path = PathBuf::from(path);
                }
                _ => rest.push(arg.clone()),
            }
        }
        Ok(rest)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
