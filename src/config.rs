/// Config - JSON file with defaults for rate and link targets
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rate_ms: u64,
    /// Blink page that phones open; `key` and `rate` are appended.
    pub base_url: String,
    /// Verification endpoint used in SMS and email links.
    pub verify_url: String,
    pub sms_body: String,
    pub fullscreen: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_ms: 200,
            base_url: "https://localhost/blink/index.html".to_string(),
            verify_url: "https://localhost/verify".to_string(),
            sms_body: "Open this link to verify your session:".to_string(),
            fullscreen: false,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_ms == 0 {
            return Err(ConfigError::ZeroRate);
        }
        Url::parse(&self.base_url)?;
        Url::parse(&self.verify_url)?;
        Ok(())
    }

    pub fn rate(&self) -> Duration {
        Duration::from_millis(self.rate_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(r#"{ "rate_ms": 120, "fullscreen": true }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.rate(), Duration::from_millis(120));
        assert!(config.fullscreen);
        assert_eq!(config.base_url, Config::default().base_url);
    }

    #[test]
    fn test_zero_rate_rejected() {
        let file = write_config(r#"{ "rate_ms": 0 }"#);
        assert!(matches!(Config::load(file.path()), Err(ConfigError::ZeroRate)));
    }

    #[test]
    fn test_bad_url_rejected() {
        let file = write_config(r#"{ "base_url": "nowhere" }"#);
        assert!(matches!(Config::load(file.path()), Err(ConfigError::BaseUrl(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let file = write_config("rate_ms = 3");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }
}
