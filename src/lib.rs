pub mod cli;
pub mod config;
pub mod smtp;

pub use smtp::{
    Credentials, ExceptionReport, MailHandler, MailHandlerConfig, Recipients, SmtpError,
    SmtpResult,
};
