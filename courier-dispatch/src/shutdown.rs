use std::future::pending;

use courier_common::Signal;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Watches the process-wide shutdown broadcast on behalf of one run.
///
/// Once a shutdown has been seen it stays seen. A listener built with
/// [`ShutdownListener::never`] is never signalled.
#[derive(Debug)]
pub struct ShutdownListener {
    receiver: Option<broadcast::Receiver<Signal>>,
    triggered: bool,
}

impl ShutdownListener {
    #[must_use]
    pub const fn new(receiver: broadcast::Receiver<Signal>) -> Self {
        Self {
            receiver: Some(receiver),
            triggered: false,
        }
    }

    #[must_use]
    pub const fn never() -> Self {
        Self {
            receiver: None,
            triggered: false,
        }
    }

    /// Non-blocking check, used before each send.
    pub fn is_triggered(&mut self) -> bool {
        if self.triggered {
            return true;
        }

        if let Some(receiver) = &mut self.receiver {
            match receiver.try_recv() {
                Ok(Signal::Shutdown) | Err(TryRecvError::Lagged(_)) => self.triggered = true,
                Err(TryRecvError::Closed) => self.receiver = None,
                Err(TryRecvError::Empty) => {}
            }
        }

        self.triggered
    }

    /// Resolves once a shutdown is signalled. Never resolves if the sending
    /// side has gone away without signalling.
    pub async fn triggered(&mut self) {
        if self.triggered {
            return;
        }

        if let Some(receiver) = &mut self.receiver {
            match receiver.recv().await {
                Ok(Signal::Shutdown) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    self.triggered = true;
                    return;
                }
                Err(broadcast::error::RecvError::Closed) => self.receiver = None,
            }
        }

        pending::<()>().await;
    }
}

impl From<broadcast::Receiver<Signal>> for ShutdownListener {
    fn from(receiver: broadcast::Receiver<Signal>) -> Self {
        Self::new(receiver)
    }
}
