use crate::smtp::{ConfigValidator, MailHandlerConfig, SmtpError, SmtpResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    /// Parse configuration text into an untyped record
    pub fn parse(&self, content: &str) -> SmtpResult<Value> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| SmtpError::ConfigParse(format!("invalid JSON: {}", e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| SmtpError::ConfigParse(format!("invalid TOML: {}", e))),
        }
    }
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("alertmail").join("config.toml"))
}

/// Parse and validate configuration text
pub fn parse_config(content: &str, format: ConfigFormat) -> SmtpResult<MailHandlerConfig> {
    let record = format.parse(content)?;
    ConfigValidator::validate(&record)
}

/// Load and validate the configuration file at `path`
pub async fn load_config(path: &Path) -> SmtpResult<MailHandlerConfig> {
    let content = fs::read_to_string(path).await?;
    let format = ConfigFormat::from_path(path);

    tracing::debug!("Loading {:?} configuration from {}", format, path.display());

    parse_config(&content, format)
}
