use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use courier_common::outgoing;

use crate::{
    accounts::SenderCredential, error::SendError, message::OutboundMessage, transport::Transport,
};

/// Accepts every message without sending it anywhere.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    fired: AtomicUsize,
}

impl DryRunTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many messages have been "sent".
    #[must_use]
    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for DryRunTransport {
    async fn send(
        &self,
        message: &OutboundMessage,
        sender: &SenderCredential,
    ) -> Result<(), SendError> {
        self.fired.fetch_add(1, Ordering::Relaxed);
        outgoing!(
            level = INFO,
            "[dry run] {} -> {} ({:?}, {} attachment(s))",
            sender.login(),
            message.to,
            message.subject,
            message.attachments.len()
        );
        Ok(())
    }
}
