use crate::smtp::{MailHandlerConfig, SmtpResult};
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    Message,
};

/// MIME subtype of the single text part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    #[default]
    Plain,
    Html,
}

impl ContentKind {
    pub fn from_html_flag(is_html: bool) -> Self {
        if is_html {
            ContentKind::Html
        } else {
            ContentKind::Plain
        }
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            ContentKind::Plain => "plain",
            ContentKind::Html => "html",
        }
    }

    fn content_type(&self) -> ContentType {
        match self {
            ContentKind::Plain => ContentType::TEXT_PLAIN,
            ContentKind::Html => ContentType::TEXT_HTML,
        }
    }
}

/// Build a multipart message holding exactly one text part.
///
/// From and To come from the configuration; To lists every recipient in
/// order, rendered as one comma-separated header.
pub fn compose_message(
    config: &MailHandlerConfig,
    body: &str,
    subject: &str,
    kind: ContentKind,
) -> SmtpResult<Message> {
    let mut builder = Message::builder()
        .from(config.sender().clone())
        .subject(subject);

    for recipient in config.recipients() {
        builder = builder.to(recipient.clone());
    }

    let text_part = SinglePart::builder()
        .header(kind.content_type())
        .body(body.to_string());

    let message = builder.multipart(MultiPart::mixed().singlepart(text_part))?;

    tracing::debug!(
        "Composed text/{} message '{}' for {} recipient(s)",
        kind.subtype(),
        subject,
        config.recipients().len()
    );

    Ok(message)
}
