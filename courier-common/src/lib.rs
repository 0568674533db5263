//! Types shared by every courier crate: the recipient model, the shutdown
//! signal and the logging setup.

pub mod logging;
pub mod recipient;

pub use recipient::{RecipientRecord, RequiredField};
pub use tracing;

/// Broadcast to every long-running component when the operator asks the
/// process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}
