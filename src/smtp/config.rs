use crate::smtp::{SmtpError, SmtpResult};
use lettre::message::Mailbox;
use std::fmt;

/// Username/password pair used for SMTP AUTH
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// One recipient address or an ordered list of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    Single(String),
    List(Vec<String>),
}

impl Recipients {
    /// Recipient addresses in the order they were given
    pub fn as_slice(&self) -> &[String] {
        match self {
            Recipients::Single(address) => std::slice::from_ref(address),
            Recipients::List(addresses) => addresses,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Recipients::Single(address.to_string())
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Recipients::Single(address)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Recipients::List(addresses)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(addresses: Vec<&str>) -> Self {
        Recipients::List(addresses.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(addresses: [&str; N]) -> Self {
        Recipients::List(addresses.iter().map(|a| a.to_string()).collect())
    }
}

/// Connection, sender and recipient settings shared by every send of a handler.
///
/// Field shapes are enforced by the type system; `new` only runs the semantic
/// checks (non-empty recipients, parsable addresses, non-blank server, non-zero
/// port). Once built the configuration cannot be changed.
#[derive(Debug, Clone)]
pub struct MailHandlerConfig {
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    server: String,
    port: u16,
    use_tls: bool,
    credentials: Option<Credentials>,
}

impl MailHandlerConfig {
    /// Create a configuration with STARTTLS enabled and no credentials
    pub fn new(
        sender: impl Into<String>,
        recipients: impl Into<Recipients>,
        server: impl Into<String>,
        port: u16,
    ) -> SmtpResult<Self> {
        let recipients = parse_recipients(&recipients.into())?;

        if port == 0 {
            return Err(SmtpError::InvalidConfig {
                field: "port".to_string(),
                reason: "port cannot be zero".to_string(),
            });
        }

        let sender = parse_address("sender", &sender.into())?;

        let server = server.into().trim().to_string();
        if server.is_empty() {
            return Err(SmtpError::InvalidConfig {
                field: "server".to_string(),
                reason: "server cannot be empty".to_string(),
            });
        }

        Ok(Self {
            sender,
            recipients,
            server,
            port,
            use_tls: true,
            credentials: None,
        })
    }

    /// Enable or disable the STARTTLS upgrade
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Authenticate with the given credentials after connecting
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    pub fn recipients(&self) -> &[Mailbox] {
        &self.recipients
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Recipients rendered the way they appear in the To header
    pub fn recipients_header(&self) -> String {
        self.recipients
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn parse_recipients(recipients: &Recipients) -> SmtpResult<Vec<Mailbox>> {
    if recipients.is_empty() {
        return Err(SmtpError::InvalidConfig {
            field: "recipients".to_string(),
            reason: "at least one recipient is required".to_string(),
        });
    }

    match recipients {
        Recipients::Single(address) => Ok(vec![parse_address("recipients", address)?]),
        Recipients::List(addresses) => addresses
            .iter()
            .enumerate()
            .map(|(i, address)| parse_address(&format!("recipients[{}]", i), address))
            .collect(),
    }
}

fn parse_address(field: &str, address: &str) -> SmtpResult<Mailbox> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| SmtpError::InvalidAddress {
            field: field.to_string(),
            source,
        })
}
