//! SMTP session behaviour against a scripted local server

use alertmail::smtp::{Credentials, LettreTransport, MailHandler, MailHandlerConfig, SmtpError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, answer like a relay without STARTTLS support and
/// return every command line the client sent (DATA payload excluded)
async fn spawn_relay() -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let task = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = socket.into_split();
        let mut lines = BufReader::new(reader).lines();
        let mut seen = Vec::new();
        let mut in_data = false;

        if writer.write_all(b"220 relay.test ESMTP\r\n").await.is_err() {
            return seen;
        }

        while let Ok(Some(line)) = lines.next_line().await {
            if in_data {
                if line == "." {
                    in_data = false;
                    if writer.write_all(b"250 2.0.0 Queued\r\n").await.is_err() {
                        break;
                    }
                }
                continue;
            }

            let command = line.to_ascii_uppercase();
            seen.push(line);

            let reply: &[u8] = if command.starts_with("EHLO") {
                b"250-relay.test\r\n250 AUTH PLAIN LOGIN\r\n"
            } else if command.starts_with("AUTH") {
                b"235 2.7.0 Authentication successful\r\n"
            } else if command.starts_with("DATA") {
                in_data = true;
                b"354 End data with <CR><LF>.<CR><LF>\r\n"
            } else if command.starts_with("QUIT") {
                let _ = writer.write_all(b"221 2.0.0 Bye\r\n").await;
                break;
            } else {
                b"250 2.0.0 OK\r\n"
            };

            if writer.write_all(reply).await.is_err() {
                break;
            }
        }

        seen
    });

    (port, task)
}

fn handler(config: MailHandlerConfig) -> MailHandler<LettreTransport> {
    let transport = LettreTransport::new(&config).with_timeout(Duration::from_secs(5));
    MailHandler::with_transport(config, transport)
}

fn position(seen: &[String], prefix: &str) -> Option<usize> {
    seen.iter()
        .position(|line| line.to_ascii_uppercase().starts_with(prefix))
}

#[tokio::test]
async fn test_tls_required_aborts_without_starttls() {
    let (port, relay) = spawn_relay().await;
    let config = MailHandlerConfig::new("alerts@example.com", "ops@example.com", "127.0.0.1", port)
        .unwrap()
        .with_credentials(Credentials::new("user", "pass"));
    assert!(config.use_tls());

    let err = handler(config)
        .send_mail("body", "Subject", false)
        .await
        .unwrap_err();
    assert!(matches!(err, SmtpError::Transport(_)));

    let seen = tokio::time::timeout(Duration::from_secs(5), relay)
        .await
        .unwrap()
        .unwrap();
    assert!(position(&seen, "EHLO").is_some());
    assert_eq!(position(&seen, "AUTH"), None);
    assert_eq!(position(&seen, "MAIL"), None);
}

#[tokio::test]
async fn test_credentials_authenticate_before_mail_from() {
    let (port, relay) = spawn_relay().await;
    let config = MailHandlerConfig::new("alerts@example.com", "ops@example.com", "127.0.0.1", port)
        .unwrap()
        .with_tls(false)
        .with_credentials(Credentials::new("user", "pass"));

    handler(config)
        .send_mail("body", "Subject", false)
        .await
        .unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(5), relay)
        .await
        .unwrap()
        .unwrap();
    let auth = position(&seen, "AUTH").expect("client never authenticated");
    let mail = position(&seen, "MAIL FROM").expect("client never sent MAIL FROM");
    assert!(auth < mail);
    assert!(position(&seen, "RCPT TO").is_some());
    assert!(position(&seen, "DATA").is_some());
}

#[tokio::test]
async fn test_no_credentials_skips_auth() {
    let (port, relay) = spawn_relay().await;
    let config = MailHandlerConfig::new("alerts@example.com", "ops@example.com", "127.0.0.1", port)
        .unwrap()
        .with_tls(false);

    handler(config)
        .send_mail("body", "Subject", false)
        .await
        .unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(5), relay)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(position(&seen, "AUTH"), None);
    assert!(position(&seen, "MAIL FROM").is_some());
}
