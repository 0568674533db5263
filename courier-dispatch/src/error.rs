//! Typed error handling for dispatch operations.
//!
//! Errors are split by how far they reach:
//! - [`SendError`]: one delivery attempt failed (permanent or temporary)
//! - [`BuildError`]: a message could not be assembled for one recipient
//! - [`DispatchError`]: the run cannot start at all

use std::path::PathBuf;

use thiserror::Error;

/// A single send attempt failed.
///
/// Per-recipient and recoverable: the dispatcher logs it and moves on to the
/// next recipient.
#[derive(Debug, Error)]
pub enum SendError {
    /// Failure that will not go away by trying again (5xx SMTP codes, bad credentials).
    #[error("Permanent failure: {0}")]
    Permanent(#[from] PermanentError),

    /// Failure that may succeed later (4xx SMTP codes, network trouble).
    #[error("Temporary failure: {0}")]
    Temporary(#[from] TemporaryError),
}

/// Permanent errors that should not be retried.
#[derive(Debug, Error)]
pub enum PermanentError {
    /// The sender credential was refused by the server.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server refused the recipient address.
    #[error("Recipient rejected: {0}")]
    RecipientRejected(String),

    /// The server refused the message itself (policy, size, content).
    #[error("Message rejected: {0}")]
    MessageRejected(String),

    /// An address could not be parsed into a mailbox.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The transport itself is misconfigured or misbehaved.
    #[error("Transport error: {0}")]
    Client(String),
}

/// Temporary errors that may succeed on a later attempt.
#[derive(Debug, Error)]
pub enum TemporaryError {
    /// No connection to the server could be established; nothing was transmitted.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The attempt did not finish in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The server is temporarily unable to accept mail.
    #[error("Server busy: {0}")]
    ServerBusy(String),

    /// The server returned a 4xx reply.
    #[error("Temporary SMTP error: {0}")]
    SmtpTemporary(String),
}

impl SendError {
    /// Returns `true` if this error is temporary.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// Returns `true` if this error is permanent.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    /// Returns `true` when the same attempt may be repeated without risking a
    /// duplicate delivery, i.e. nothing reached the server.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Temporary(TemporaryError::ConnectionFailed(_)))
    }

    /// Returns `true` if the sender credential was refused.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Permanent(PermanentError::AuthenticationFailed(_)))
    }
}

/// Convert from lettre's SMTP error to [`SendError`].
///
/// - **Timeouts** → Temporary
/// - **4xx replies** → Temporary (421 as server busy)
/// - **530/534/535** → Permanent authentication failure
/// - **550/551/553** → Permanent recipient rejection
/// - **Other 5xx** → Permanent message rejection
/// - **Client errors** → Permanent
/// - **Everything else** (connection, TLS, network) → Temporary connection failure
impl From<lettre::transport::smtp::Error> for SendError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        let code = error.status().map(|code| code.to_string());
        let detail = error.to_string();

        if error.is_timeout() {
            return Self::Temporary(TemporaryError::Timeout(detail));
        }

        if error.is_transient() {
            return match code.as_deref() {
                Some("421") => Self::Temporary(TemporaryError::ServerBusy(detail)),
                _ => Self::Temporary(TemporaryError::SmtpTemporary(detail)),
            };
        }

        if error.is_permanent() {
            return match code.as_deref() {
                Some("530" | "534" | "535") => {
                    Self::Permanent(PermanentError::AuthenticationFailed(detail))
                }
                Some("550" | "551" | "553") => {
                    Self::Permanent(PermanentError::RecipientRejected(detail))
                }
                _ => Self::Permanent(PermanentError::MessageRejected(detail)),
            };
        }

        if error.is_client() {
            return Self::Permanent(PermanentError::Client(detail));
        }

        Self::Temporary(TemporaryError::ConnectionFailed(detail))
    }
}

/// A message could not be assembled for one recipient.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The subject or body template refers to something the recipient lacks,
    /// or does not parse.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// An attachment could not be read.
    #[error("Cannot read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sender or recipient address is not a valid mailbox.
    #[error("Invalid address {0:?}")]
    InvalidAddress(String),
}

/// The run cannot start.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// None of the configured logins resolved to a credential.
    #[error("No sender account could be resolved from {requested} configured login(s)")]
    EmptyAccountPool { requested: usize },

    /// A run parameter is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
