use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Endpoint used when nothing else is configured
pub const DEFAULT_WEBHOOK_URL: &str = "https://anythingman.app.n8n.cloud/webhook/chatbot";

/// Environment variable that overrides the webhook URL from the config file
pub const WEBHOOK_URL_ENV: &str = "HOOKCHAT_WEBHOOK_URL";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Webhook receiving every user message
    pub webhook_url: String,

    /// How outstanding submissions are scheduled
    pub delivery: DeliveryPolicy,

    /// UI preferences
    pub ui: UiConfig,

    /// Hookchat home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// Whether submissions may overlap on the network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryPolicy {
    /// One task per submission; replies land in completion order
    #[default]
    Concurrent,
    /// A single worker handles one submission at a time; replies land in submission order
    Serialized,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub greeting: String,
    pub placeholder: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            title: "Chat Assistant".to_string(),
            greeting: "Hello! I'm your chatbot assistant. How can I help you today?".to_string(),
            placeholder: "Type your message here...".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            delivery: DeliveryPolicy::default(),
            ui: UiConfig::default(),
            home: home.join(".hookchat"),
        }
    }
}

impl Config {
    /// Load configuration from `~/.hookchat/config.toml` and apply the env override
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let mut config = Self::load_from(&home.join(".hookchat"))?;

        if let Ok(url) = std::env::var(WEBHOOK_URL_ENV) {
            if !url.trim().is_empty() {
                config.webhook_url = url;
            }
        }

        Ok(config)
    }

    /// Load configuration rooted at `home`; a missing file yields defaults
    pub fn load_from(home: &Path) -> Result<Self> {
        fs::create_dir_all(home).context("Failed to create .hookchat directory")?;

        let config_path = home.join("config.toml");
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(self.config_path(), content)
            .context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join("hookchat.log")
    }

    /// Apply command-line overrides on top of file and environment values
    pub fn apply_overrides(&mut self, webhook_url: Option<String>, serialized: bool) {
        if let Some(url) = webhook_url {
            self.webhook_url = url;
        }
        if serialized {
            self.delivery = DeliveryPolicy::Serialized;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.webhook_url, DEFAULT_WEBHOOK_URL);
        assert_eq!(config.delivery, DeliveryPolicy::Concurrent);
        assert_eq!(config.ui, UiConfig::default());
        assert_eq!(config.home, dir.path());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(dir.path()).unwrap();
        config.webhook_url = "http://127.0.0.1:9/hook".into();
        config.delivery = DeliveryPolicy::Serialized;
        config.ui.title = "Support".into();
        config.save().unwrap();

        let loaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "delivery = \"serialized\"\n[ui]\ntitle = \"Desk\"\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.webhook_url, DEFAULT_WEBHOOK_URL);
        assert_eq!(config.delivery, DeliveryPolicy::Serialized);
        assert_eq!(config.ui.title, "Desk");
        assert_eq!(config.ui.placeholder, "Type your message here...");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "delivery = [").unwrap();

        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://localhost/x".into()), true);
        assert_eq!(config.webhook_url, "http://localhost/x");
        assert_eq!(config.delivery, DeliveryPolicy::Serialized);

        config.apply_overrides(None, false);
        assert_eq!(config.webhook_url, "http://localhost/x");
        assert_eq!(config.delivery, DeliveryPolicy::Serialized);
    }
}
