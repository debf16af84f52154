//! The conversation flow.
//!
//! Two states per chat user, derived from the store: no email on file
//! means the next message is treated as their address; with an email on
//! file, a message is either a URL (full fetch/convert/package run, EPUB
//! mailed) or raw text (written to Markdown and mailed as-is). Pipeline
//! and delivery failures become replies, never crashes, and every run's
//! cache files are purged after the attempt.

use paperboy_core::{CacheLedger, PaperboyError, Pipeline, parse_http_url};
use tracing::{error, warn};

use crate::mailer::Mailer;
use crate::storage::DataStore;

/// Filename stem for raw text messages, kept from the original bot.
const TEXT_STEM: &str = "from_chat";

/// Subject line for every delivery.
const MAIL_SUBJECT: &str = "From Paperboy";

/// Drives one conversation turn per incoming message.
pub struct BotService<S, M> {
    store: S,
    mailer: M,
    pipeline: Pipeline,
}

impl<S: DataStore, M: Mailer> BotService<S, M> {
    pub fn new(store: S, mailer: M, pipeline: Pipeline) -> Self {
        Self { store, mailer, pipeline }
    }

    /// Handles one message from `user_id` and returns the reply text.
    pub async fn handle_message(&self, user_id: &str, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return "Send me a URL or some text.".to_string();
        }

        let email = match self.store.get(user_id).await {
            Ok(email) => email,
            Err(e) => {
                error!(user_id, error = %e, "storage lookup failed");
                return "Storage is unavailable right now, please try again later.".to_string();
            }
        };

        if text == "/start" {
            return match email {
                Some(_) => "Send me a URL or some text.".to_string(),
                None => "Please send me your email address first.".to_string(),
            };
        }

        match email {
            None => self.save_email(user_id, text).await,
            Some(email) => self.deliver(&email, text).await,
        }
    }

    /// First state: the message is the user's email address.
    async fn save_email(&self, user_id: &str, text: &str) -> String {
        if !looks_like_email(text) {
            return "That does not look like an email address. Please try again.".to_string();
        }

        match self.store.set(user_id, text).await {
            Ok(()) => "Email saved. Send me a URL or some text.".to_string(),
            Err(e) => {
                error!(user_id, error = %e, "storage write failed");
                "Could not save your email, please try again later.".to_string()
            }
        }
    }

    /// Second state: fetch or wrap the message, mail it, purge the run.
    async fn deliver(&self, email: &str, text: &str) -> String {
        let mut ledger = CacheLedger::new();

        let result = self.convert(text, &mut ledger).await;

        let reply = match result {
            Ok(attachment) => match self.mailer.send(email, MAIL_SUBJECT, "", &[attachment]).await {
                Ok(()) => format!("Sent to {email}."),
                Err(e) => {
                    error!(error = %e, "delivery failed");
                    "Converted the document but could not send the email. Please try again later.".to_string()
                }
            },
            Err(e) => {
                warn!(error = %e, "pipeline run failed");
                pipeline_reply(&e)
            }
        };

        // Cleanup failures are logged by the ledger itself; the user
        // already has their answer.
        if let Err(e) = ledger.purge() {
            warn!(error = %e, "cache purge incomplete");
        }

        reply
    }

    /// Runs the pipeline for one message: URLs get the full EPUB
    /// treatment, anything else is mailed as a Markdown note.
    async fn convert(
        &self, text: &str, ledger: &mut CacheLedger,
    ) -> Result<std::path::PathBuf, PaperboyError> {
        if parse_http_url(text).is_ok() {
            let run = self.pipeline.fetch_and_convert(text, ledger).await?;
            Ok(run.epub_path)
        } else {
            self.pipeline.convert_text(TEXT_STEM, text, ledger)
        }
    }
}

/// Just enough validation to catch a user answering the email prompt with
/// something else entirely.
fn looks_like_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };

    !local.is_empty() && domain.contains('.') && !text.contains(char::is_whitespace)
}

/// Maps a pipeline failure to a user-visible reply.
fn pipeline_reply(error: &PaperboyError) -> String {
    match error {
        PaperboyError::Timeout { timeout } => {
            format!("The page took longer than {timeout} seconds to load. Please try again.")
        }
        PaperboyError::BadStatus { status, .. } => {
            format!("The site answered with HTTP {status} instead of an article.")
        }
        PaperboyError::Http(_) | PaperboyError::InvalidUrl(_) => {
            "I could not fetch that page.".to_string()
        }
        PaperboyError::Extraction(_) | PaperboyError::NoContent => {
            "I could not find any readable content on that page.".to_string()
        }
        PaperboyError::Conversion { .. } | PaperboyError::ConversionTimeout { .. } => {
            "Converting the article to EPUB failed.".to_string()
        }
        PaperboyError::Io(_) | PaperboyError::Cleanup { .. } => {
            "Something went wrong while preparing your document. Please try again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::storage::InMemoryStore;

    #[derive(Debug, Clone)]
    struct SentMail {
        to: String,
        subject: String,
        attachments: Vec<PathBuf>,
    }

    /// Records sends instead of talking SMTP.
    #[derive(Default)]
    struct FakeMailer {
        sent: Mutex<Vec<SentMail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, to: &str, subject: &str, _html_body: &str, attachments: &[PathBuf]) -> Result<()> {
            if self.fail {
                anyhow::bail!("smtp down");
            }
            self.sent.lock().unwrap().push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                attachments: attachments.to_vec(),
            });
            Ok(())
        }
    }

    fn service_in(dir: &std::path::Path) -> BotService<InMemoryStore, FakeMailer> {
        BotService::new(InMemoryStore::new(), FakeMailer::default(), Pipeline::new(dir))
    }

    #[tokio::test]
    async fn test_first_contact_asks_for_email() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());

        let reply = service.handle_message("42", "/start").await;
        assert!(reply.contains("email"));
    }

    #[tokio::test]
    async fn test_email_collection_then_ready() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());

        let reply = service.handle_message("42", "reader@example.com").await;
        assert_eq!(reply, "Email saved. Send me a URL or some text.");

        let reply = service.handle_message("42", "/start").await;
        assert_eq!(reply, "Send me a URL or some text.");
    }

    #[tokio::test]
    async fn test_rejects_implausible_email() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());

        let reply = service.handle_message("42", "just some words").await;
        assert!(reply.contains("does not look like an email"));

        // Still in the collect-email state.
        let reply = service.handle_message("42", "/start").await;
        assert!(reply.contains("email"));
    }

    #[tokio::test]
    async fn test_text_message_is_mailed_as_markdown_and_purged() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());

        service.handle_message("42", "reader@example.com").await;
        let reply = service.handle_message("42", "remember to water the plants").await;
        assert_eq!(reply, "Sent to reader@example.com.");

        let sent = service.mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "reader@example.com");
        assert_eq!(sent[0].subject, "From Paperboy");
        assert_eq!(sent[0].attachments[0].file_name().unwrap(), "from_chat.md");

        // The cache file was purged after the send.
        assert!(!sent[0].attachments[0].exists());
    }

    #[tokio::test]
    async fn test_mailer_failure_becomes_a_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = service_in(dir.path());
        service.mailer.fail = true;

        service.handle_message("42", "reader@example.com").await;
        let reply = service.handle_message("42", "some note").await;
        assert!(reply.contains("could not send the email"));
    }

    #[tokio::test]
    async fn test_unreachable_url_becomes_a_reply() {
        let dir = tempfile::tempdir().unwrap();

        // Nothing listens on this port; connection is refused immediately.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/article", listener.local_addr().unwrap());
        drop(listener);

        let service = service_in(dir.path());
        service.handle_message("42", "reader@example.com").await;

        let reply = service.handle_message("42", &url).await;
        assert_eq!(reply, "I could not fetch that page.");
        assert!(service.mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("reader@example.com"));
        assert!(!looks_like_email("readerexample.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("two words@example.com"));
        assert!(!looks_like_email("reader@localhost"));
    }
}
