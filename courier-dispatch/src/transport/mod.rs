//! Transports carry a finished message to the outside world.
//!
//! - `smtp`: authenticated SMTP submission through `lettre` (production)
//! - `dry_run`: logs what would be sent and reports success

pub mod dry_run;
pub mod smtp;

use async_trait::async_trait;

pub use dry_run::DryRunTransport;
pub use smtp::{SmtpConfig, SmtpTransport, TlsMode};

use crate::{accounts::SenderCredential, error::SendError, message::OutboundMessage};

/// One delivery attempt.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Attempt to deliver `message`, authenticating as `sender`.
    ///
    /// # Errors
    /// A categorised [`SendError`] if the attempt failed.
    async fn send(&self, message: &OutboundMessage, sender: &SenderCredential)
    -> Result<(), SendError>;
}
