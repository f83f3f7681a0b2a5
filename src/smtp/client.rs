use crate::smtp::{Credentials, MailHandlerConfig, MailTransport, SmtpError, SmtpResult};
use async_trait::async_trait;
use lettre::{
    address::Envelope,
    transport::smtp::{
        authentication,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use std::time::Duration;

/// SMTP transport backed by lettre.
///
/// A fresh connection is opened for every submission and dropped once the
/// relay has answered, so no session outlives a send.
#[derive(Debug, Clone)]
pub struct LettreTransport {
    server: String,
    port: u16,
    use_tls: bool,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl LettreTransport {
    pub fn new(config: &MailHandlerConfig) -> Self {
        Self {
            server: config.server().to_string(),
            port: config.port(),
            use_tls: config.use_tls(),
            credentials: config.credentials().cloned(),
            timeout: None,
        }
    }

    /// Limit how long connecting and each command may take
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the lettre transport for one session
    fn build_transport(&self) -> SmtpResult<AsyncSmtpTransport<Tokio1Executor>> {
        let tls = if self.use_tls {
            let tls_parameters = TlsParameters::builder(self.server.clone())
                .dangerous_accept_invalid_certs(false)
                .dangerous_accept_invalid_hostnames(false)
                .build()?;
            // Required means STARTTLS must succeed before anything else is sent
            Tls::Required(tls_parameters)
        } else {
            Tls::None
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.server)
            .port(self.port)
            .tls(tls);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(Some(timeout));
        }

        if let Some(credentials) = &self.credentials {
            builder = builder.credentials(authentication::Credentials::new(
                credentials.username().to_string(),
                credentials.password().to_string(),
            ));
        }

        Ok(builder.build())
    }

    /// Connect, greet, upgrade and authenticate as configured, then disconnect
    pub async fn test_connection(&self) -> SmtpResult<bool> {
        let transport = self.build_transport()?;

        match transport.test_connection().await {
            Ok(success) => {
                tracing::info!(
                    "SMTP connection test for {}:{} returned {}",
                    self.server,
                    self.port,
                    success
                );
                Ok(success)
            }
            Err(e) => {
                tracing::error!("SMTP connection test failed: {}", e);
                Err(SmtpError::Transport(e))
            }
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl MailTransport for LettreTransport {
    async fn submit(&self, envelope: &Envelope, raw: &[u8]) -> SmtpResult<()> {
        let transport = self.build_transport()?;

        tracing::debug!(
            "Opening SMTP session to {}:{} (tls: {}, auth: {})",
            self.server,
            self.port,
            self.use_tls,
            self.credentials.is_some()
        );

        match transport.send_raw(envelope, raw).await {
            Ok(_response) => {
                tracing::info!(
                    "Message accepted by {}:{} for {} recipient(s)",
                    self.server,
                    self.port,
                    envelope.to().len()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send email via {}:{}: {}", self.server, self.port, e);
                Err(SmtpError::Transport(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_config() {
        let config = MailHandlerConfig::new("a@x.com", "b@x.com", "smtp.example.com", 587)
            .unwrap()
            .with_credentials(Credentials::new("user", "pass"));

        let transport = LettreTransport::new(&config).with_timeout(Duration::from_secs(5));

        assert_eq!(transport.server(), "smtp.example.com");
        assert_eq!(transport.port(), 587);
        assert!(transport.use_tls);
        assert_eq!(transport.timeout, Some(Duration::from_secs(5)));
        assert!(transport.credentials.is_some());
    }

    #[tokio::test]
    async fn test_build_transport_with_and_without_tls() {
        let config = MailHandlerConfig::new("a@x.com", "b@x.com", "smtp.example.com", 587).unwrap();
        assert!(LettreTransport::new(&config).build_transport().is_ok());

        let plain = config.with_tls(false);
        assert!(LettreTransport::new(&plain).build_transport().is_ok());
    }
}
