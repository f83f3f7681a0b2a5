//! Field-by-field validation of a dynamically typed configuration record.
//!
//! Configuration loaded from JSON or TOML arrives as a [`serde_json::Value`].
//! Each field is checked against its expected type in a fixed order
//! (recipients, port, use_tls, sender, server, credentials) and the first
//! mismatch is reported with the field name and the expected/actual types.

use crate::smtp::{Credentials, MailHandlerConfig, Recipients, SmtpError, SmtpResult};
use serde_json::{Map, Value};

/// Accepted keys for each field; the second name is the legacy spelling
const SENDER_KEYS: &[&str] = &["sender"];
const RECIPIENTS_KEYS: &[&str] = &["recipients"];
const SERVER_KEYS: &[&str] = &["server", "smtp_server"];
const PORT_KEYS: &[&str] = &["port", "smtp_port"];
const USE_TLS_KEYS: &[&str] = &["use_tls"];
const CREDENTIALS_KEYS: &[&str] = &["credentials"];

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration record and build the handler configuration
    pub fn validate(record: &Value) -> SmtpResult<MailHandlerConfig> {
        let fields = record.as_object().ok_or_else(|| SmtpError::TypeMismatch {
            field: "config".to_string(),
            expected: "object",
            actual: type_name(record),
        })?;

        let recipients = Self::recipients(fields)?;
        let port = Self::port(fields)?;
        let use_tls = Self::use_tls(fields)?;
        let sender = expect_string("sender", required(fields, SENDER_KEYS, "sender")?)?;
        let server = expect_string("server", required(fields, SERVER_KEYS, "server")?)?;
        let credentials = Self::credentials(fields)?;

        tracing::debug!(
            "Configuration record passed type checks: {} recipient(s), server {}:{}",
            recipients.len(),
            server,
            port
        );

        let mut config = MailHandlerConfig::new(sender, recipients, server, port)?.with_tls(use_tls);
        if let Some(credentials) = credentials {
            config = config.with_credentials(credentials);
        }
        Ok(config)
    }

    fn recipients(fields: &Map<String, Value>) -> SmtpResult<Recipients> {
        match required(fields, RECIPIENTS_KEYS, "recipients")? {
            Value::String(address) => Ok(Recipients::Single(address.clone())),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| expect_string(&format!("recipients[{}]", i), item))
                .collect::<SmtpResult<Vec<_>>>()
                .map(Recipients::List),
            other => Err(SmtpError::TypeMismatch {
                field: "recipients".to_string(),
                expected: "string or array of strings",
                actual: type_name(other),
            }),
        }
    }

    fn port(fields: &Map<String, Value>) -> SmtpResult<u16> {
        let value = required(fields, PORT_KEYS, "port")?;
        let number = match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => n,
            other => {
                return Err(SmtpError::TypeMismatch {
                    field: "port".to_string(),
                    expected: "integer",
                    actual: type_name(other),
                })
            }
        };

        number
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| SmtpError::InvalidConfig {
                field: "port".to_string(),
                reason: format!("{} is outside the range 0-65535", number),
            })
    }

    fn use_tls(fields: &Map<String, Value>) -> SmtpResult<bool> {
        match lookup(fields, USE_TLS_KEYS) {
            None => Ok(true),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(other) => Err(SmtpError::TypeMismatch {
                field: "use_tls".to_string(),
                expected: "boolean",
                actual: type_name(other),
            }),
        }
    }

    fn credentials(fields: &Map<String, Value>) -> SmtpResult<Option<Credentials>> {
        let inner = match lookup(fields, CREDENTIALS_KEYS) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                return Err(SmtpError::TypeMismatch {
                    field: "credentials".to_string(),
                    expected: "object",
                    actual: type_name(other),
                })
            }
        };

        let username = expect_string(
            "credentials.username",
            required(inner, &["username"], "credentials.username")?,
        )?;
        let password = expect_string(
            "credentials.password",
            required(inner, &["password"], "credentials.password")?,
        )?;

        Ok(Some(Credentials::new(username, password)))
    }
}

/// First present key among `keys`
fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key))
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    keys: &[&str],
    field: &'static str,
) -> SmtpResult<&'a Value> {
    lookup(fields, keys).ok_or(SmtpError::MissingField(field))
}

fn expect_string(field: &str, value: &Value) -> SmtpResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SmtpError::TypeMismatch {
            field: field.to_string(),
            expected: "string",
            actual: type_name(value),
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
