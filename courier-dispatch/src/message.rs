//! Turning a recipient into a transport-ready message.
//!
//! Rendering is delegated to a [`TemplateRenderer`]; [`CampaignTemplate`] is
//! the configured one, backed by `minijinja` with strict undefined handling
//! so a placeholder without a matching recipient field fails the render
//! instead of producing an empty gap.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use courier_common::{RecipientRecord, outgoing};
use minijinja::{Environment, UndefinedBehavior};
use serde::Deserialize;

use crate::error::BuildError;

const SUBJECT: &str = "subject";
const BODY: &str = "body";

/// Subject, body and attachment selection for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
    /// `(file path, display name)` pairs, in attachment order.
    pub attachments: Vec<(PathBuf, String)>,
}

/// Produces the personalised parts of a message.
pub trait TemplateRenderer: Send + Sync + fmt::Debug {
    /// Render the message for `recipient`.
    ///
    /// # Errors
    /// [`BuildError::Template`] when a placeholder cannot be filled.
    fn render(&self, recipient: &RecipientRecord) -> Result<RenderedMessage, BuildError>;
}

/// Template configuration
///
/// Placeholders use `{{ field }}` syntax and may name any recipient field:
/// `identifier`, `organization_name`, `contact_name`, `email`,
/// `primary_document_path`, `secondary_document_path`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    pub subject: String,
    pub body: String,

    /// File name the primary document is attached under.
    ///
    /// Default: `MCS-150 form.pdf`
    #[serde(default = "default_primary_attachment_name")]
    pub primary_attachment_name: String,

    /// File name the secondary document is attached under.
    ///
    /// Default: `Invoice.pdf`
    #[serde(default = "default_secondary_attachment_name")]
    pub secondary_attachment_name: String,
}

fn default_primary_attachment_name() -> String {
    "MCS-150 form.pdf".to_string()
}

fn default_secondary_attachment_name() -> String {
    "Invoice.pdf".to_string()
}

/// The configured campaign template.
pub struct CampaignTemplate {
    env: Environment<'static>,
    primary_attachment_name: String,
    secondary_attachment_name: String,
}

impl CampaignTemplate {
    /// Compile the subject and body templates.
    ///
    /// # Errors
    /// [`BuildError::Template`] if either template has a syntax error.
    pub fn new(config: &TemplateConfig) -> Result<Self, BuildError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_template_owned(SUBJECT, config.subject.clone())?;
        env.add_template_owned(BODY, config.body.clone())?;

        Ok(Self {
            env,
            primary_attachment_name: config.primary_attachment_name.clone(),
            secondary_attachment_name: config.secondary_attachment_name.clone(),
        })
    }
}

impl fmt::Debug for CampaignTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CampaignTemplate")
            .field("primary_attachment_name", &self.primary_attachment_name)
            .field("secondary_attachment_name", &self.secondary_attachment_name)
            .finish_non_exhaustive()
    }
}

impl TemplateRenderer for CampaignTemplate {
    fn render(&self, recipient: &RecipientRecord) -> Result<RenderedMessage, BuildError> {
        let subject = self.env.get_template(SUBJECT)?.render(recipient)?;
        let body = self.env.get_template(BODY)?.render(recipient)?;

        Ok(RenderedMessage {
            // Header values cannot span lines.
            subject: subject.lines().map(str::trim).collect::<Vec<_>>().join(" "),
            body,
            attachments: vec![
                (
                    PathBuf::from(recipient.primary_document_path.trim()),
                    self.primary_attachment_name.clone(),
                ),
                (
                    PathBuf::from(recipient.secondary_document_path.trim()),
                    self.secondary_attachment_name.clone(),
                ),
            ],
        })
    }
}

/// A file carried by an [`OutboundMessage`].
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.content.len())
            .finish()
    }
}

/// A finished message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Identifier of the recipient this message is for.
    pub identifier: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Builds [`OutboundMessage`]s from recipients.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    renderer: Arc<dyn TemplateRenderer>,
}

impl MessageBuilder {
    #[must_use]
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { renderer }
    }

    /// Render and assemble the message `sender_login` will send to `recipient`.
    ///
    /// # Errors
    /// - [`BuildError::InvalidAddress`] if either address is malformed
    /// - [`BuildError::Template`] if rendering fails
    /// - [`BuildError::Attachment`] if a document cannot be read
    pub async fn build(
        &self,
        sender_login: &str,
        recipient: &RecipientRecord,
    ) -> Result<OutboundMessage, BuildError> {
        let from = parse_address(sender_login)?;
        let to = parse_address(&recipient.email)?;

        outgoing!("Crafting message for {to}");
        let rendered = self.renderer.render(recipient)?;

        let mut attachments = Vec::with_capacity(rendered.attachments.len());
        for (path, filename) in rendered.attachments {
            attachments.push(Attachment {
                content: read_attachment(&path).await?,
                content_type: "application/pdf",
                filename,
            });
        }

        Ok(OutboundMessage {
            identifier: recipient.identifier.trim().to_string(),
            from,
            to,
            subject: rendered.subject,
            body: rendered.body,
            attachments,
        })
    }
}

fn parse_address(address: &str) -> Result<String, BuildError> {
    let address = address.trim();
    address
        .parse::<lettre::Address>()
        .map(|parsed| parsed.to_string())
        .map_err(|_| BuildError::InvalidAddress(address.to_string()))
}

async fn read_attachment(path: &Path) -> Result<Vec<u8>, BuildError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| BuildError::Attachment {
            path: path.to_path_buf(),
            source,
        })
}
