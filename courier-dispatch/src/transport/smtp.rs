use std::time::Duration;

use async_trait::async_trait;
use courier_common::outgoing;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::{
    accounts::SenderCredential,
    error::{PermanentError, SendError},
    message::OutboundMessage,
    transport::Transport,
};

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum TlsMode {
    /// TLS from the first byte (usually port 465).
    #[default]
    Wrapper,
    /// Plain connection upgraded with `STARTTLS` (usually port 587).
    StartTls,
    /// No encryption. Only for local test servers.
    None,
}

/// SMTP submission settings, shared by every sender account.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// Default: `smtp.gmail.com`
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 465
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub tls: TlsMode,

    /// Timeout for each SMTP command, in seconds.
    ///
    /// Default: 30 seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: TlsMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "smtp.gmail.com".to_string()
}

const fn default_port() -> u16 {
    465
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Sends through an SMTP relay, logging in as the sender account.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    config: SmtpConfig,
}

impl SmtpTransport {
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn connect(
        &self,
        sender: &SenderCredential,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, SendError> {
        let builder = match self.config.tls {
            TlsMode::Wrapper => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?,
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
            }
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host),
        };

        Ok(builder
            .port(self.config.port)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .credentials(Credentials::new(
                sender.login().to_string(),
                sender.secret().expose_secret().to_string(),
            ))
            .build())
    }
}

/// Assemble the MIME message: a plain-text body followed by the attachments.
fn to_mime(message: &OutboundMessage) -> Result<Message, SendError> {
    let mailbox = |address: &str| {
        address
            .parse::<Mailbox>()
            .map_err(|_| SendError::from(PermanentError::InvalidAddress(address.to_string())))
    };

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
    for attachment in &message.attachments {
        let content_type = ContentType::parse(attachment.content_type)
            .map_err(|e| PermanentError::Client(format!("content type: {e}")))?;
        parts = parts.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type),
        );
    }

    Message::builder()
        .from(mailbox(&message.from)?)
        .to(mailbox(&message.to)?)
        .subject(message.subject.clone())
        .multipart(parts)
        .map_err(|e| PermanentError::Client(format!("cannot assemble message: {e}")).into())
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(
        &self,
        message: &OutboundMessage,
        sender: &SenderCredential,
    ) -> Result<(), SendError> {
        let mime = to_mime(message)?;
        let transport = self.connect(sender)?;

        outgoing!("Sending to {} via {}", message.to, self.config.host);
        let response = transport.send(mime).await?;
        outgoing!(
            level = DEBUG,
            "{} accepted message for {}: {}",
            self.config.host,
            message.to,
            response.code()
        );

        Ok(())
    }
}
