//! CLI configuration management
//!
//! Settings are resolved through a priority chain, lowest to highest:
//! defaults, the TOML config file, `BAREMETAL_*` environment variables, then
//! command-line flags. The config file is optional and never written.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_URL: &str = "BAREMETAL_URL";
const ENV_API_VERSION: &str = "BAREMETAL_API_VERSION";
const ENV_TOKEN: &str = "BAREMETAL_TOKEN";
const ENV_FORMAT: &str = "BAREMETAL_FORMAT";
const ENV_VERBOSE: &str = "BAREMETAL_VERBOSE";
const ENV_TIMEOUT: &str = "BAREMETAL_TIMEOUT";
const ENV_MAX_RETRIES: &str = "BAREMETAL_MAX_RETRIES";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Service endpoint
    pub url: String,

    /// API microversion sent with every request
    pub api_version: String,

    /// Auth token, if the service requires one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Default output format
    pub output_format: String,

    /// Enable verbose logging by default
    pub verbose: bool,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Retries on connection failures
    pub max_retries: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6385".to_string(),
            api_version: "1.latest".to_string(),
            token: None,
            output_format: "table".to_string(),
            verbose: false,
            timeout: 30,
            max_retries: 0,
        }
    }
}

impl CliConfig {
    /// Read a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLI config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse CLI config file {}", path.display()))
    }

    /// Default config file location, `<config dir>/baremetal/cli.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("baremetal").join("cli.toml"))
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// The token with all but its last four characters hidden.
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_ref().map(|t| {
            let chars: Vec<char> = t.chars().collect();
            let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
            format!("****{}", tail)
        })
    }
}

/// Builder for CLI configuration with validation and priority chain support.
///
/// Each `with_*` layer overrides what earlier layers set, so apply them in
/// priority order: config file, environment, then CLI arguments.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    url: Option<String>,
    api_version: Option<String>,
    token: Option<String>,
    output_format: Option<String>,
    verbose: Option<bool>,
    timeout: Option<u64>,
    max_retries: Option<u32>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set service URL (with validation)
    pub fn with_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Self::validate_url(&url)?;
        self.url = Some(url);
        Ok(self)
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        Self::validate_api_version(&version)?;
        self.api_version = Some(version);
        Ok(self)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: u64) -> Result<Self> {
        Self::validate_timeout(timeout)?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Result<Self> {
        Self::validate_max_retries(max_retries)?;
        self.max_retries = Some(max_retries);
        Ok(self)
    }

    /// Layer in the config file.
    ///
    /// With `path` set the file must exist and parse. Without it the default
    /// location is tried and silently skipped when absent.
    pub fn with_config_file(self, path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => CliConfig::load_from(path)?,
            None => match CliConfig::default_path().filter(|p| p.exists()) {
                Some(path) => CliConfig::load_from(&path)?,
                None => return Ok(self),
            },
        };
        self.with_file_config(config)
    }

    fn with_file_config(mut self, config: CliConfig) -> Result<Self> {
        self = self
            .with_url(config.url)?
            .with_api_version(config.api_version)?
            .with_output_format(config.output_format)?
            .with_verbose(config.verbose)
            .with_timeout(config.timeout)?
            .with_max_retries(config.max_retries)?;
        if let Some(token) = config.token {
            self = self.with_token(token);
        }
        Ok(self)
    }

    /// Apply environment variable overrides.
    ///
    /// Values that fail validation are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_URL) {
            if Self::validate_url(&url).is_ok() {
                self.url = Some(url);
            }
        }

        if let Ok(version) = std::env::var(ENV_API_VERSION) {
            if Self::validate_api_version(&version).is_ok() {
                self.api_version = Some(version);
            }
        }

        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.is_empty() {
                self.token = Some(token);
            }
        }

        if let Ok(format) = std::env::var(ENV_FORMAT) {
            if Self::validate_output_format(&format).is_ok() {
                self.output_format = Some(format);
            }
        }

        if let Ok(verbose) = std::env::var(ENV_VERBOSE) {
            self.verbose = Some(verbose.to_lowercase() == "true" || verbose == "1");
        }

        if let Ok(timeout) = std::env::var(ENV_TIMEOUT) {
            if let Ok(timeout) = timeout.parse() {
                if Self::validate_timeout(timeout).is_ok() {
                    self.timeout = Some(timeout);
                }
            }
        }

        if let Ok(retries) = std::env::var(ENV_MAX_RETRIES) {
            if let Ok(retries) = retries.parse() {
                if Self::validate_max_retries(retries).is_ok() {
                    self.max_retries = Some(retries);
                }
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let defaults = CliConfig::default();

        let url = self.url.unwrap_or(defaults.url);
        let api_version = self.api_version.unwrap_or(defaults.api_version);
        let output_format = self.output_format.unwrap_or(defaults.output_format);
        let timeout = self.timeout.unwrap_or(defaults.timeout);
        let max_retries = self.max_retries.unwrap_or(defaults.max_retries);

        Self::validate_url(&url)?;
        Self::validate_api_version(&api_version)?;
        Self::validate_output_format(&output_format)?;
        Self::validate_timeout(timeout)?;
        Self::validate_max_retries(max_retries)?;

        Ok(CliConfig {
            url,
            api_version,
            token: self.token.or(defaults.token),
            output_format,
            verbose: self.verbose.unwrap_or(defaults.verbose),
            timeout,
            max_retries,
        })
    }

    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(anyhow::anyhow!("Service URL cannot be empty"));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "Service URL must start with http:// or https://"
            ));
        }

        Ok(())
    }

    /// `latest`, `1.latest` or `<major>.<minor>`
    fn validate_api_version(version: &str) -> Result<()> {
        if version == "latest" || version == "1.latest" {
            return Ok(());
        }
        let valid = version
            .split_once('.')
            .map(|(major, minor)| major.parse::<u32>().is_ok() && minor.parse::<u32>().is_ok())
            .unwrap_or(false);
        if valid {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Invalid API version '{}'. Must be 'latest', '1.latest' or '<major>.<minor>'",
                version
            ))
        }
    }

    fn validate_output_format(format: &str) -> Result<()> {
        match format {
            "table" | "json" => Ok(()),
            _ => Err(anyhow::anyhow!(
                "Invalid output format '{}'. Must be 'table' or 'json'",
                format
            )),
        }
    }

    fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0"));
        }

        if timeout > 300 {
            return Err(anyhow::anyhow!(
                "Timeout must be less than or equal to 300 seconds"
            ));
        }

        Ok(())
    }

    fn validate_max_retries(max_retries: u32) -> Result<()> {
        if max_retries > 10 {
            return Err(anyhow::anyhow!("Max retries must be at most 10"));
        }
        Ok(())
    }
}
