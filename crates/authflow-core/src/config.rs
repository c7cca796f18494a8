//! Process configuration.
//!
//! Loaded once at startup from `config.toml` under the application data dir;
//! nothing in the flow engine mutates it. Every field has a default so a
//! missing or partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserSettings,
    pub flow: FlowSettings,
    pub endpoints: Endpoints,
}

/// Chrome launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Pause after each navigation or click, in milliseconds.
    pub slow_down_ms: u64,
    /// Explicit Chrome binary path. None probes well-known locations.
    pub chrome_executable: Option<String>,
    /// Navigation timeout, in seconds.
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            slow_down_ms: 500,
            chrome_executable: None,
            navigation_timeout_secs: 60,
        }
    }
}

/// Timing budget for the flow driver and related flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Iteration budget for the callback-capture loop.
    pub max_attempts: u32,
    /// Delay between classification polls, in seconds.
    pub poll_delay_secs: u64,
    /// Delay after a dispatched action, in seconds.
    pub settle_delay_secs: u64,
    /// Longer wait after form submissions during sign-in, in seconds.
    pub post_action_delay_secs: u64,
    /// Bound on waiting for sign-in to land on an authenticated page.
    pub login_timeout_secs: u64,
    /// URL prefixes recognized as the local OAuth callback.
    pub callback_prefixes: Vec<String>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            poll_delay_secs: 3,
            settle_delay_secs: 5,
            post_action_delay_secs: 10,
            login_timeout_secs: 40,
            callback_prefixes: vec![
                "http://localhost".to_string(),
                "https://localhost".to_string(),
            ],
        }
    }
}

impl FlowSettings {
    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn post_action_delay(&self) -> Duration {
        Duration::from_secs(self.post_action_delay_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    /// Whether a URL matches one of the configured callback prefixes.
    pub fn is_callback_url(&self, url: &str) -> bool {
        self.callback_prefixes.iter().any(|p| url.starts_with(p))
    }
}

/// The three external endpoints the flows drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub signin_url: String,
    pub activation_url: String,
    pub inbox_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            signin_url: "https://accounts.google.com/signin".to_string(),
            activation_url: "https://gemini.google.com/gems/create?hl=en-US&pli=1".to_string(),
            inbox_url: "https://mail.google.com/".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the current configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.browser.headless);
        assert_eq!(config.flow.max_attempts, 20);
        assert_eq!(config.flow.poll_delay_secs, 3);
        assert!(config.flow.is_callback_url("http://localhost:3217/cb?x=1"));
        assert!(!config.flow.is_callback_url("https://example.com/"));
        assert!(config.endpoints.signin_url.contains("accounts.google.com"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.flow.max_attempts, 20);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_rest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[flow]\nmax_attempts = 5\n\n[browser]\nheadless = false\n",
        )
        .unwrap();

        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.flow.max_attempts, 5);
        assert!(!config.browser.headless);
        // Untouched sections keep defaults
        assert_eq!(config.flow.poll_delay_secs, 3);
        assert!(config.endpoints.inbox_url.contains("mail.google.com"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.browser.slow_down_ms = 1200;
        config.save(&path).unwrap();

        let reloaded = Config::load_or_default(&path).unwrap();
        assert_eq!(reloaded.browser.slow_down_ms, 1200);
    }
}
