use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `site.base_url`.
pub const BASE_URL_ENV: &str = "PORTFOLIO_BASE_URL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Where the site lives and how to talk to it
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Terminal pane settings
    #[serde(default)]
    pub terminal: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,

    /// Page loaded into the content region at startup
    pub start_page: String,

    pub search_path: String,

    /// Header marking a request as fragment-only
    pub fragment_header: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds. Unset means the transport default.
    pub timeout_seconds: Option<u64>,

    pub connect_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Set to false to always start without the terminal
    pub enabled: bool,

    /// Narrower terminals start without the terminal pane
    pub min_columns: u16,

    pub prompt: String,

    pub welcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,

    /// Log file; defaults to a dated file under the config directory
    pub file: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            start_page: "home".to_string(),
            search_path: "/search".to_string(),
            fragment_header: "HX-Request".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_columns: 80,
            prompt: "visitor@portfolio:~$".to_string(),
            welcome: "Welcome to the portfolio terminal. Type \"help\" for available commands."
                .to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            http: HttpConfig::default(),
            terminal: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_seconds.map(Duration::from_secs)
    }
}

impl TerminalConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.load_env_vars();

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// `~/.portfolio-terminal`
    pub fn config_dir() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".portfolio-terminal"))
    }

    /// Get the default configuration path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    fn load_env_vars(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.site.base_url = url;
            }
        }
    }

    /// Merge with command-line overrides
    pub fn merge_overrides(&mut self, overrides: Vec<(String, String)>) -> Result<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "base_url" => self.site.base_url = value,
                "start_page" => self.site.start_page = value,
                "search_path" => self.site.search_path = value,
                "fragment_header" => self.site.fragment_header = value,
                "timeout" => {
                    self.http.timeout_seconds = Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid timeout: {}", value))?,
                    )
                }
                "enabled" => {
                    self.terminal.enabled = value
                        .parse()
                        .with_context(|| format!("Invalid value for enabled: {}", value))?
                }
                "min_columns" => {
                    self.terminal.min_columns = value
                        .parse()
                        .with_context(|| format!("Invalid value for min_columns: {}", value))?
                }
                "prompt" => self.terminal.prompt = value,
                "log_level" => self.logging.level = value,
                _ => bail!("Unknown config key: {}", key),
            }
        }
        Ok(())
    }
}

/// Load or create configuration
pub fn load_or_create_config(path: Option<&Path>) -> Result<TerminalConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => TerminalConfig::default_path()?,
    };

    if config_path.exists() {
        TerminalConfig::load(&config_path)
    } else {
        let mut config = TerminalConfig::default();
        config.save(&config_path)?;
        config.load_env_vars();
        Ok(config)
    }
}
