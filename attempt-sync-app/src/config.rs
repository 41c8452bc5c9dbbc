use anyhow::{bail, Context, Result};
use attempt_sync_core::ProfileVariant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BASE_URL_ENV: &str = "ATTEMPT_SYNC_BASE_URL";
pub const POLL_SECS_ENV: &str = "ATTEMPT_SYNC_POLL_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root. Discovered through the port file when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Local `profiles.json`; the backend's catalog is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_path: Option<PathBuf>,
    /// Profile for follow-ups when the attempt declares none. Falls back to
    /// the profile configured in the backend when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<ProfileVariant>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            poll_interval_secs: 5,
            request_timeout_secs: 30,
            profiles_path: None,
            default_profile: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `path` if given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Apply `ATTEMPT_SYNC_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            self.base_url = Some(base_url);
        }
        if let Some(secs) = lookup(POLL_SECS_ENV) {
            self.poll_interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", POLL_SECS_ENV))?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                bail!("base_url must start with http:// or https://, got {}", base_url);
            }
        }
        if let Some(profile) = &self.default_profile {
            if profile.profile.trim().is_empty() {
                bail!("default_profile.profile cannot be empty");
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
