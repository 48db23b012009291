use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db;
use crate::settings::SmtpSettings;

pub const SUBJECT: &str = "Portfolio Contact";

#[derive(Debug, Clone, PartialEq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    /// Trims every field; all three must be non-empty.
    pub fn new(name: &str, email: &str, message: &str) -> Result<Self> {
        let (name, email, message) = (name.trim(), email.trim(), message.trim());
        if name.is_empty() || email.is_empty() || message.is_empty() {
            bail!("Missing fields");
        }
        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        })
    }

    pub fn body(&self) -> String {
        format!(
            "New portfolio contact:\n\nName: {}\nEmail: {}\n\nMessage:\n{}",
            self.name, self.email, self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Stored,
}

/// Outbound notification channel. Reports success; never fails.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool;
}

pub struct SmtpNotifier {
    settings: SmtpSettings,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }
}

fn send_blocking(
    settings: &SmtpSettings,
    user: &str,
    password: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<()> {
    let email = Message::builder()
        .from(user.parse::<Mailbox>().context("Invalid sender address")?)
        .to(to.parse::<Mailbox>().context("Invalid recipient address")?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .context("Failed to build message")?;

    // relay() speaks implicit TLS
    let mailer = SmtpTransport::relay(&settings.host)
        .with_context(|| format!("Failed to configure SMTP relay {}", settings.host))?
        .port(settings.port)
        .credentials(Credentials::new(user.to_string(), password.to_string()))
        .build();

    mailer.send(&email).context("SMTP send failed")?;
    Ok(())
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        let (Some(user), Some(password)) = (self.settings.user.clone(), self.settings.password.clone()) else {
            info!("SMTP credentials not configured");
            return false;
        };
        if to.is_empty() {
            return false;
        }

        let settings = self.settings.clone();
        let (to, subject, body) = (to.to_string(), subject.to_string(), body.to_string());
        let result = tokio::task::spawn_blocking(move || {
            send_blocking(&settings, &user, &password, &to, &subject, &body)
        })
        .await;

        match result {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Mail delivery failed: {:#}", e);
                false
            }
            Err(e) => {
                warn!("Mail task failed: {}", e);
                false
            }
        }
    }
}

/// Mails the form to `recipient`; when that fails the message is logged and
/// kept in the local store instead.
pub async fn deliver(
    conn: &Connection,
    notifier: &dyn Notifier,
    form: &ContactForm,
    recipient: &str,
) -> Result<Delivery> {
    let body = form.body();
    if notifier.send(recipient, SUBJECT, &body).await {
        info!(to = recipient, "Contact message sent");
        return Ok(Delivery::Sent);
    }

    info!(
        "EMAIL SIMULATION\nTo: {}\nSubject: {}\nBody:\n{}",
        recipient, SUBJECT, body
    );
    let id = db::store_message(conn, form, recipient).context("Failed to store contact message")?;
    info!(id, "Contact message stored");
    Ok(Delivery::Stored)
}
