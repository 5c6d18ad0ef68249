use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "/etc/restore-wizard/config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub general: GeneralConfig,
    pub server: ServerConfig,
    pub polling: PollingConfig,
}

impl WizardConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: WizardConfig = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    /// Demo mode - talks to an in-process simulated restore service instead
    /// of the real one. Nothing is written to any disk.
    pub demo: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "Image Restore".to_string(),
            demo: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the restore-control HTTP service
    pub url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:11080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Status polls before server search / connection wait give up
    pub connection_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            connection_attempts: 60,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WizardConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.polling.connection_attempts, 60);
        assert_eq!(config.polling.interval(), Duration::from_secs(1));
        assert!(!config.general.demo);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nurl = \"http://10.0.0.5:11080\"\n\n[general]\ndemo = true").unwrap();

        let config = WizardConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.url, "http://10.0.0.5:11080");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert!(config.general.demo);
        assert_eq!(config.general.title, "Image Restore");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[polling\ninterval_ms = ").unwrap();
        assert!(WizardConfig::load_from(file.path()).is_err());
    }
}
