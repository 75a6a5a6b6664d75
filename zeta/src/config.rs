//! Configuration management for zeta
//!
//! Configuration is loaded from `./config/zeta.toml` or an explicit path.
//! No hardcoded defaults exist in source code - all defaults are in the config template,
//! which is embedded and used when the default file is absent.

use scraper::Selector;
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/zeta.toml";

/// Default configuration file content - this is the ONLY place defaults exist
pub const DEFAULT_CONFIG: &str = include_str!("../config/zeta.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Invalid CSS selector in '{field}': {selector}")]
    InvalidSelector { field: String, selector: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub cert_log: CertLogConfig,
    pub web_scan: WebScanConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Certificate transparency search (crt.sh)
#[derive(Debug, Clone, Deserialize)]
pub struct CertLogConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub base_url: String,
}

/// Browser-driven enumeration tool (subdomainfinder.c99.nl)
#[derive(Debug, Clone, Deserialize)]
pub struct WebScanConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub url: String,
    pub domain_input_selector: String,
    pub scan_button_selector: String,
    /// Appears once the tool has finished scanning
    pub results_selector: String,
    pub wait_timeout_secs: u64,
}

impl WebScanConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Headless Chrome launch options
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub chrome_path: Option<String>,
    #[serde(default = "default_enabled")]
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportConfig {
    /// Dedupe the merged subdomain list across sources before export
    #[serde(default)]
    pub dedupe: bool,
}

fn default_enabled() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `path` if given (it must exist), otherwise from the default
    /// path, falling back to the embedded template when that file is absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => match Self::load() {
                Err(ConfigError::FileNotFound(_)) => Self::from_toml(DEFAULT_CONFIG),
                other => other,
            },
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "http.request_timeout_secs".to_string(),
            });
        }

        validate_url("cert_log.base_url", &self.cert_log.base_url)?;
        validate_url("web_scan.url", &self.web_scan.url)?;

        let selectors = [
            ("web_scan.domain_input_selector", &self.web_scan.domain_input_selector),
            ("web_scan.scan_button_selector", &self.web_scan.scan_button_selector),
            ("web_scan.results_selector", &self.web_scan.results_selector),
        ];
        for (field, value) in selectors {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyRequired {
                    field: field.to_string(),
                });
            }
        }
        // Also parsed locally to find the results table in the rendered page
        if Selector::parse(&self.web_scan.results_selector).is_err() {
            return Err(ConfigError::InvalidSelector {
                field: "web_scan.results_selector".to_string(),
                selector: self.web_scan.results_selector.clone(),
            });
        }
        if self.web_scan.wait_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "web_scan.wait_timeout_secs".to_string(),
            });
        }

        Ok(())
    }

    /// Write the default configuration file to `path` (creating parent
    /// directories) and return the written path.
    pub fn create_default_config(path: &Path) -> Result<PathBuf, ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        field: field.to_string(),
        url: value.to_string(),
    };
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(())
}
