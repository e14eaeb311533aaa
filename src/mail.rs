use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::{SmtpConfig, SmtpTls};
use crate::forms::ShareForm;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers a single plain-text message, returning once the transport has
/// accepted or rejected it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = match config.tls {
            SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };
        let builder = builder.port(config.port);

        let transport = match (&config.username, &config.password) {
            (Some(username), Some(password)) => builder
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build(),
            _ => builder.build(),
        };
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(mail.from.parse::<Mailbox>()?)
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Compose the "recommend a post" message sent by the share form.
pub fn share_message(form: &ShareForm, title: &str, post_url: &str, from: &str) -> OutgoingMail {
    let name = form.name.trim();
    OutgoingMail {
        from: from.to_string(),
        to: form.to_whom.trim().to_string(),
        subject: format!("{name} recommends you read \"{title}\""),
        body: format!(
            "Read \"{title}\" at {post_url}\n\n{name}'s ({}) comments: {}",
            form.your_email.trim(),
            form.comments.trim()
        ),
    }
}
