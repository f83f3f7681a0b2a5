use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use crate::config::{default_config_path, load_config};
use crate::smtp::{
    ExceptionReport, LettreTransport, MailHandler, MailHandlerConfig, MailTransport,
    MemoryTransport,
};

/// alertmail - send plain, HTML and exception-report emails over SMTP
#[derive(Parser)]
#[command(name = "alertmail")]
#[command(about = "Send notification and exception-report emails over SMTP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Configuration file (JSON or TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Compose messages and print them instead of sending
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// SMTP connection timeout (seconds)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a plain-text or HTML email
    Send(SendArgs),

    /// Send an HTML exception report
    Report(ReportArgs),

    /// Test the connection to the SMTP server
    Check,

    /// Show the loaded configuration
    Config,

    /// Send a plain mail, an HTML mail and an exception report
    Selftest,
}

#[derive(Args)]
pub struct SendArgs {
    /// Subject line
    #[arg(short, long)]
    pub subject: String,

    /// Message body (read from stdin when neither --body nor --body-file is given)
    #[arg(short, long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the message body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Send the body as HTML
    #[arg(long)]
    pub html: bool,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Subject line
    #[arg(short, long)]
    pub subject: String,

    /// Error message shown in the report heading
    #[arg(short, long)]
    pub message: String,

    /// File holding the formatted traceback (omit it to send an empty traceback block)
    #[arg(long)]
    pub traceback_file: Option<PathBuf>,

    /// HTML fragment appended after the traceback
    #[arg(long)]
    pub footer: Option<String>,
}

/// Command-line interface handler
pub struct CliHandler {
    config: MailHandlerConfig,
    timeout: Option<Duration>,
}

impl CliHandler {
    /// Load the configuration and create a CLI handler
    pub async fn new(config_path: Option<PathBuf>, timeout: Option<Duration>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path,
            None => default_config_path().ok_or_else(|| anyhow!("Cannot find config directory"))?,
        };

        let config = load_config(&path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        Ok(Self { config, timeout })
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands, dry_run: bool) -> Result<()> {
        match command {
            Commands::Check => self.handle_check(dry_run).await,
            Commands::Config => self.handle_config(),
            Commands::Send(args) => self.handle_mail(MailCommand::Send(args), dry_run).await,
            Commands::Report(args) => self.handle_mail(MailCommand::Report(args), dry_run).await,
            Commands::Selftest => self.handle_mail(MailCommand::Selftest, dry_run).await,
        }
    }

    /// Run a sending command against the real relay, or in memory for dry runs
    async fn handle_mail(&self, command: MailCommand, dry_run: bool) -> Result<()> {
        if dry_run {
            let handler = MailHandler::with_transport(self.config.clone(), MemoryTransport::new());
            run_mail_command(&handler, command).await?;
            print_dry_run(handler.transport());
            Ok(())
        } else {
            let handler =
                MailHandler::with_transport(self.config.clone(), self.lettre_transport());
            run_mail_command(&handler, command).await
        }
    }

    fn lettre_transport(&self) -> LettreTransport {
        let transport = LettreTransport::new(&self.config);
        match self.timeout {
            Some(timeout) => transport.with_timeout(timeout),
            None => transport,
        }
    }

    /// Handle the connection check
    async fn handle_check(&self, dry_run: bool) -> Result<()> {
        println!(
            "🔌 Checking SMTP server {}:{}",
            self.config.server(),
            self.config.port()
        );

        if dry_run {
            println!("   Dry run: no connection attempted");
            return Ok(());
        }

        if self.lettre_transport().test_connection().await? {
            println!("✅ Connection successful");
            Ok(())
        } else {
            Err(anyhow!("SMTP server did not accept the connection test"))
        }
    }

    /// Print the configuration with the password masked
    fn handle_config(&self) -> Result<()> {
        let view = ConfigView::from(&self.config);
        print!("{}", toml::to_string_pretty(&view)?);
        Ok(())
    }
}

/// Commands that compose and submit mail
enum MailCommand {
    Send(SendArgs),
    Report(ReportArgs),
    Selftest,
}

async fn run_mail_command<T: MailTransport>(
    handler: &MailHandler<T>,
    command: MailCommand,
) -> Result<()> {
    match command {
        MailCommand::Send(args) => {
            let body = read_body(&args).await?;
            handler.send_mail(&body, &args.subject, args.html).await?;
            println!("✅ Sent '{}' to {}", args.subject, handler.config().recipients_header());
        }
        MailCommand::Report(args) => {
            if args.traceback_file.is_none() {
                println!("   No --traceback-file given: sending an empty traceback block");
            }
            let traceback = match &args.traceback_file {
                Some(path) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => String::new(),
            };
            let report = ExceptionReport::new(args.message, traceback);
            handler
                .send_exception_email(&report, &args.subject, args.footer.as_deref())
                .await?;
            println!("✅ Sent exception report '{}'", args.subject);
        }
        MailCommand::Selftest => run_selftest(handler).await?,
    }
    Ok(())
}

/// Plain mail, HTML mail and an exception report for a caught error
async fn run_selftest<T: MailTransport>(handler: &MailHandler<T>) -> Result<()> {
    println!("Send simple mail...");
    handler
        .send_mail("Test message", "Simple test subject", false)
        .await?;

    println!("Send simple HTML mail...");
    let html_body = r#"
<html>
    <body>
        <h1>Test HTML message</h1>
        <p>This is a test HTML message.</p>
    </body>
</html>
"#;
    handler
        .send_mail(html_body, "Simple html test subject", true)
        .await?;

    if let Err(e) = checked_divide(1, 0) {
        println!("Send exception mail...");
        let report = ExceptionReport::capture(&e);
        handler
            .send_exception_email(&report, "Exception test subject", None)
            .await?;
    }

    println!("✅ Self-test messages sent");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
struct DivisionByZero;

fn checked_divide(a: i64, b: i64) -> Result<i64, DivisionByZero> {
    a.checked_div(b).ok_or(DivisionByZero)
}

async fn read_body(args: &SendArgs) -> Result<String> {
    if let Some(body) = &args.body {
        return Ok(body.clone());
    }

    if let Some(path) = &args.body_file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("Failed to read message body from stdin")?;
    Ok(body)
}

fn print_dry_run(transport: &MemoryTransport) {
    for (i, message) in transport.messages().iter().enumerate() {
        println!("\n--- Message {} (dry run) ---", i + 1);
        println!("{}", message.as_string());
    }
}

#[derive(Serialize)]
struct ConfigView {
    sender: String,
    recipients: Vec<String>,
    server: String,
    port: u16,
    use_tls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<CredentialsView>,
}

#[derive(Serialize)]
struct CredentialsView {
    username: String,
    password: &'static str,
}

impl From<&MailHandlerConfig> for ConfigView {
    fn from(config: &MailHandlerConfig) -> Self {
        Self {
            sender: config.sender().to_string(),
            recipients: config.recipients().iter().map(|r| r.to_string()).collect(),
            server: config.server().to_string(),
            port: config.port(),
            use_tls: config.use_tls(),
            credentials: config.credentials().map(|c| CredentialsView {
                username: c.username().to_string(),
                password: "********",
            }),
        }
    }
}
