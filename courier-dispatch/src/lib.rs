//! Outbound campaign dispatch
//!
//! This crate provides functionality to:
//! - Resolve sender accounts from a credential store
//! - Decide which recipients may be contacted
//! - Pace sends with a jittered delay
//! - Build attachment-bearing messages from a template
//! - Hand messages to a transport and record who was reached

mod accounts;
mod error;
mod message;
pub mod policy;
mod processor;
mod rate_limiter;
mod shutdown;
pub mod transport;
mod types;

pub use accounts::{AccountPool, CredentialStore, SenderCredential};
pub use error::{BuildError, DispatchError, PermanentError, SendError, TemporaryError};
pub use message::{
    Attachment, CampaignTemplate, MessageBuilder, OutboundMessage, RenderedMessage,
    TemplateConfig, TemplateRenderer,
};
pub use policy::{Eligibility, RetryPolicy, ValidityMap};
pub use processor::{
    AccountTally, DispatchConfig, Dispatcher, DispatcherBuilder, Failure, RunReport, SkipCounts,
};
pub use rate_limiter::{RateLimitConfig, RateLimiter, WaitOutcome};
pub use shutdown::ShutdownListener;
pub use transport::{DryRunTransport, SmtpConfig, SmtpTransport, TlsMode, Transport};
pub use types::{AccountCap, Phase};
