//! Email delivery.
//!
//! The pipeline hands back file paths; this module turns them into a
//! multipart message with the right MIME types and pushes it through SMTP
//! over implicit TLS, matching the original deployment (port 465).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;

/// Sends a document to a registered address.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str, attachments: &[PathBuf]) -> Result<()>;
}

/// SMTP implementation over implicit TLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport from config. Fails fast when the sender
    /// address is unparseable or no password is configured.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let password = config.resolve_password()?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.hostname)?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), password))
            .build();

        let from: Mailbox = config
            .username
            .parse()
            .with_context(|| format!("invalid sender address: {}", config.username))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str, attachments: &[PathBuf]) -> Result<()> {
        let to_mailbox: Mailbox = to.parse().with_context(|| format!("invalid recipient address: {to}"))?;

        let mut multipart = MultiPart::mixed().singlepart(SinglePart::html(html_body.to_string()));

        for path in attachments {
            multipart = multipart.singlepart(attachment_part(path)?);
        }

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .multipart(multipart)
            .context("failed to build message")?;

        self.transport.send(message).await.context("SMTP delivery failed")?;
        info!(to, subject, "mail sent");

        Ok(())
    }
}

fn attachment_part(path: &Path) -> Result<SinglePart> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read attachment {}", path.display()))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    let content_type = ContentType::parse(mime_for(path)).expect("static MIME type");

    Ok(Attachment::new(filename).body(bytes, content_type))
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("epub") => "application/epub+zip",
        Some("md") => "text/markdown",
        Some("html") => "text/html",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_extensions() {
        assert_eq!(mime_for(Path::new("a/Hi_There.epub")), "application/epub+zip");
        assert_eq!(mime_for(Path::new("a/Hi_There.md")), "text/markdown");
        assert_eq!(mime_for(Path::new("a/blob")), "application/octet-stream");
    }

    #[test]
    fn test_attachment_part_missing_file() {
        let result = attachment_part(Path::new("/nonexistent/file.epub"));
        assert!(result.is_err());
    }
}
