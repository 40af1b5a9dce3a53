//! Copr client configuration.
//!
//! Credentials come from the environment when `COPR_URL`, `COPR_LOGIN`,
//! `COPR_TOKEN` and `COPR_USERNAME` are all set, otherwise from the
//! `~/.config/copr` file that `copr-cli` uses. Everything this crate does is
//! read-only, so a missing config falls back to anonymous access to the
//! public Copr instance.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoprError;
use crate::Result;

/// Public Fedora Copr instance
pub const DEFAULT_COPR_URL: &str = "https://copr.fedorainfracloud.org";

const ENV_VARS: [&str; 4] = ["COPR_URL", "COPR_LOGIN", "COPR_TOKEN", "COPR_USERNAME"];
const CONFIG_SECTION: &str = "copr-cli";

/// Copr connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoprConfig {
    /// Base URL of the Copr frontend
    pub copr_url: String,
    /// API login (paired with `token` for authenticated requests)
    pub login: Option<String>,
    /// API token
    pub token: Option<String>,
    /// Copr user name
    pub username: Option<String>,
}

impl Default for CoprConfig {
    fn default() -> Self {
        Self::anonymous(DEFAULT_COPR_URL)
    }
}

impl CoprConfig {
    /// Config without credentials
    pub fn anonymous(copr_url: &str) -> Self {
        CoprConfig {
            copr_url: copr_url.trim_end_matches('/').to_string(),
            login: None,
            token: None,
            username: None,
        }
    }

    /// Config from `COPR_*` environment variables, if all of them are set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let values: Vec<String> = ENV_VARS
            .iter()
            .map(|key| lookup(*key))
            .collect::<Option<_>>()?;
        let [copr_url, login, token, username]: [String; 4] = values.try_into().ok()?;
        Some(CoprConfig {
            copr_url: copr_url.trim_end_matches('/').to_string(),
            login: Some(login),
            token: Some(token),
            username: Some(username),
        })
    }

    /// Location of the `copr-cli` config file (`~/.config/copr`).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("copr"))
    }

    /// Parse a `copr-cli` config file.
    ///
    /// The file is INI-style with a `[copr-cli]` section holding `login`,
    /// `username`, `token` and optionally `copr_url`.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_config(&content).map_err(|e| match e {
            CoprError::Config(msg) => CoprError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    fn parse_config(content: &str) -> Result<Self> {
        let mut in_section = false;
        let mut seen_section = false;
        let mut config = CoprConfig::default();

        for (lineno, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = section.trim() == CONFIG_SECTION;
                seen_section |= in_section;
                continue;
            }
            if !in_section {
                continue;
            }
            // Split at whichever delimiter comes first; values may contain both.
            let (key, value) = line
                .split_once(|c: char| c == '=' || c == ':')
                .ok_or_else(|| {
                    CoprError::Config(format!("line {}: expected key = value", lineno + 1))
                })?;
            let value = value.trim().to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "copr_url" => config.copr_url = value.trim_end_matches('/').to_string(),
                "login" => config.login = Some(value),
                "token" => config.token = Some(value),
                "username" => config.username = Some(value),
                _ => {}
            }
        }

        if !seen_section {
            return Err(CoprError::Config(format!(
                "missing [{}] section",
                CONFIG_SECTION
            )));
        }
        Ok(config)
    }

    /// Environment first, then the config file, then anonymous access.
    pub fn load() -> Result<Self> {
        if let Some(config) = Self::from_env() {
            debug!("create copr client config from environment variables");
            return Ok(config);
        }
        match Self::default_config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "create copr client config from file");
                Self::from_config_file(&path)
            }
            _ => {
                debug!("no copr credentials found, using anonymous access");
                Ok(Self::default())
            }
        }
    }

    /// Override the frontend URL (e.g. from a CLI flag).
    pub fn with_url(mut self, copr_url: &str) -> Self {
        self.copr_url = copr_url.trim_end_matches('/').to_string();
        self
    }

    /// Login/token pair for HTTP basic auth, when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.login, &self.token) {
            (Some(login), Some(token)) => Some((login.as_str(), token.as_str())),
            _ => None,
        }
    }

    /// `<copr_url>/api_3/<endpoint>`
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api_3/{}", self.copr_url, endpoint.trim_start_matches('/'))
    }
}
