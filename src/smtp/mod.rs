pub mod client;
pub mod config;
pub mod handler;
pub mod message;
pub mod report;
pub mod transport;
pub mod validator;

pub use client::LettreTransport;
pub use config::{Credentials, MailHandlerConfig, Recipients};
pub use handler::MailHandler;
pub use message::{compose_message, ContentKind};
pub use report::ExceptionReport;
pub use transport::{MailTransport, MemoryTransport, SentMessage};
pub use validator::ConfigValidator;

use thiserror::Error;

/// SMTP-related errors
#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("{field} must be of type {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Invalid email address in {field}: {source}")]
    InvalidAddress {
        field: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Message build error: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Message rejected: {0}")]
    Rejected(String),
}

impl SmtpError {
    /// Name of the configuration field this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            SmtpError::TypeMismatch { field, .. }
            | SmtpError::InvalidConfig { field, .. }
            | SmtpError::InvalidAddress { field, .. } => Some(field.as_str()),
            SmtpError::MissingField(field) => Some(*field),
            _ => None,
        }
    }

    /// Whether the error was raised while building or validating configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SmtpError::TypeMismatch { .. }
                | SmtpError::MissingField(_)
                | SmtpError::InvalidConfig { .. }
                | SmtpError::InvalidAddress { .. }
                | SmtpError::ConfigParse(_)
        )
    }
}

pub type SmtpResult<T> = Result<T, SmtpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field() {
        let err = SmtpError::TypeMismatch {
            field: "port".to_string(),
            expected: "integer",
            actual: "string",
        };
        assert_eq!(err.field(), Some("port"));
        assert!(err.is_config_error());
        assert_eq!(err.to_string(), "port must be of type integer, got string");

        let err = SmtpError::MissingField("sender");
        assert_eq!(err.field(), Some("sender"));

        let err = SmtpError::Rejected("relay denied".to_string());
        assert_eq!(err.field(), None);
        assert!(!err.is_config_error());
    }
}
