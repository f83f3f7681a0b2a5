use crate::smtp::{
    compose_message, ContentKind, ExceptionReport, LettreTransport, MailHandlerConfig,
    MailTransport, SmtpResult,
};
use lettre::Message;

/// Composes plain, HTML and exception-report mails and submits them.
///
/// The handler holds only its immutable configuration and the transport, so a
/// single instance can be reused for any number of sends and shared between
/// tasks. Every send uses its own transport session.
pub struct MailHandler<T = LettreTransport> {
    config: MailHandlerConfig,
    transport: T,
}

impl MailHandler<LettreTransport> {
    /// Create a handler that relays through the configured SMTP server
    pub fn new(config: MailHandlerConfig) -> Self {
        let transport = LettreTransport::new(&config);
        Self { config, transport }
    }
}

impl<T: MailTransport> MailHandler<T> {
    /// Create a handler with a custom transport
    pub fn with_transport(config: MailHandlerConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &MailHandlerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the message `send_mail` would submit, without sending it
    pub fn compose(&self, body: &str, subject: &str, kind: ContentKind) -> SmtpResult<Message> {
        compose_message(&self.config, body, subject, kind)
    }

    /// Send `body` as a single plain-text or HTML part to every recipient
    pub async fn send_mail(&self, body: &str, subject: &str, is_html: bool) -> SmtpResult<()> {
        let message = self.compose(body, subject, ContentKind::from_html_flag(is_html))?;

        self.transport
            .submit(message.envelope(), &message.formatted())
            .await
    }

    /// Send an HTML exception report.
    ///
    /// `post_traceback_html_body` is appended after the traceback block as-is.
    pub async fn send_exception_email(
        &self,
        report: &ExceptionReport,
        subject: &str,
        post_traceback_html_body: Option<&str>,
    ) -> SmtpResult<()> {
        if report.traceback().is_empty() {
            tracing::warn!("Sending exception report '{}' without a traceback", subject);
        }

        let body = report.to_html(post_traceback_html_body);
        self.send_mail(&body, subject, true).await
    }
}
