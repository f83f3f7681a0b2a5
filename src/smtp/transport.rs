use crate::smtp::{SmtpError, SmtpResult};
use async_trait::async_trait;
use lettre::address::Envelope;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mail submission collaborator.
///
/// An implementation opens its own session for each call, optionally upgrades
/// it to TLS and authenticates, submits the envelope and closes the session
/// before returning. Errors are returned as-is; callers never retry.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit a fully formatted message to the relay
    async fn submit(&self, envelope: &Envelope, raw: &[u8]) -> SmtpResult<()>;
}

/// A message captured by [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub envelope: Envelope,
    pub raw: Vec<u8>,
}

impl SentMessage {
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// Transport that keeps submitted messages in memory instead of relaying them.
///
/// Used for dry runs. A failing instance rejects every submission with the
/// configured reason while still counting the attempt.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    messages: Mutex<Vec<SentMessage>>,
    attempts: AtomicUsize,
    failure: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects every message
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Messages accepted so far, oldest first
    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of submissions attempted, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn submit(&self, envelope: &Envelope, raw: &[u8]) -> SmtpResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            tracing::error!("Memory transport rejected message: {}", reason);
            return Err(SmtpError::Rejected(reason.clone()));
        }

        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentMessage {
                envelope: envelope.clone(),
                raw: raw.to_vec(),
            });

        tracing::debug!(
            "Memory transport stored message for {} recipient(s)",
            envelope.to().len()
        );
        Ok(())
    }
}
