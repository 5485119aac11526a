use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub polling: PollingSettings,
    pub notifications: NotificationSettings,
    pub http: HttpSettings,
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub duration_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_secs: 10,
        }
    }
}

impl NotificationSettings {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    File(PathBuf),
    Defaults(PathBuf),
}

impl SettingsSource {
    pub fn log(&self) {
        match self {
            SettingsSource::File(path) => tracing::debug!(?path, "Loaded config"),
            SettingsSource::Defaults(path) => {
                tracing::debug!(?path, "Config file not found, using defaults")
            }
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ticket-watch").join("config.toml"))
    }

    /// Runs before logging is installed, so it reports where the settings
    /// came from instead of logging it.
    pub fn load() -> Result<(Self, SettingsSource)> {
        let path = Self::config_path().context("Could not determine config directory")?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<(Self, SettingsSource)> {
        if !path.exists() {
            return Ok((Self::default(), SettingsSource::Defaults(path.to_path_buf())));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok((settings, SettingsSource::File(path.to_path_buf())))
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            anyhow::bail!("polling.interval_secs must be greater than 0");
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than 0");
        }
        if self.notifications.enabled && self.notifications.duration_secs == 0 {
            anyhow::bail!("notifications.duration_secs must be greater than 0");
        }
        Ok(())
    }
}
