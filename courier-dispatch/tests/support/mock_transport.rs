//! Scriptable transport for dispatcher tests
//!
//! Records every attempt and can be told to:
//! - fail sends to a given address a number of times
//! - reject every send from a login as an authentication failure
//! - hang on a given address until the dispatcher's timeout fires
//! - broadcast a shutdown after a number of attempts
#![allow(dead_code)] // Not every test uses every knob

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use courier_common::Signal;
use courier_dispatch::{
    OutboundMessage, PermanentError, SendError, SenderCredential, TemporaryError, Transport,
};
use tokio::sync::broadcast;

/// Failure injected for a recipient address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Nothing reached the server; retryable.
    ConnectionRefused,
    /// 550 from the server; permanent.
    Rejected,
}

impl MockFailure {
    fn to_error(self, to: &str) -> SendError {
        match self {
            Self::ConnectionRefused => {
                TemporaryError::ConnectionFailed(format!("connection refused for {to}")).into()
            }
            Self::Rejected => PermanentError::RecipientRejected(format!("550 {to}")).into(),
        }
    }
}

/// One call to [`Transport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub login: String,
    pub to: String,
    pub identifier: String,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct Script {
    failures: HashMap<String, (MockFailure, usize)>,
    rejected_logins: Vec<String>,
    hanging: Vec<String>,
    shutdown_after: Option<(usize, broadcast::Sender<Signal>)>,
    attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` sends to `email`.
    pub fn fail(&self, email: &str, failure: MockFailure, times: usize) -> &Self {
        self.script
            .lock()
            .unwrap()
            .failures
            .insert(email.to_string(), (failure, times));
        self
    }

    /// Every send from `login` fails authentication.
    pub fn reject_login(&self, login: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .rejected_logins
            .push(login.to_string());
        self
    }

    /// Sends to `email` never complete.
    pub fn hang(&self, email: &str) -> &Self {
        self.script.lock().unwrap().hanging.push(email.to_string());
        self
    }

    /// Broadcast a shutdown once `attempts` sends have been made.
    pub fn shutdown_after(&self, attempts: usize, sender: broadcast::Sender<Signal>) -> &Self {
        self.script.lock().unwrap().shutdown_after = Some((attempts, sender));
        self
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.script.lock().unwrap().attempts.clone()
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.attempts()
            .into_iter()
            .filter(|a| a.succeeded)
            .map(|a| (a.login, a.identifier))
            .collect()
    }

    fn outcome(&self, message: &OutboundMessage, login: &str) -> Result<(), SendError> {
        let mut script = self.script.lock().unwrap();

        let result = if script.rejected_logins.iter().any(|l| l == login) {
            Err(PermanentError::AuthenticationFailed(format!("535 {login}")).into())
        } else if let Some((failure, remaining)) = script.failures.get_mut(&message.to)
            && *remaining > 0
        {
            *remaining -= 1;
            Err(failure.to_error(&message.to))
        } else {
            Ok(())
        };

        script.attempts.push(Attempt {
            login: login.to_string(),
            to: message.to.clone(),
            identifier: message.identifier.clone(),
            succeeded: result.is_ok(),
        });

        let made = script.attempts.len();
        if let Some((after, sender)) = &script.shutdown_after
            && made >= *after
        {
            let _ = sender.send(Signal::Shutdown);
        }

        result
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        message: &OutboundMessage,
        sender: &SenderCredential,
    ) -> Result<(), SendError> {
        let hangs = self
            .script
            .lock()
            .unwrap()
            .hanging
            .iter()
            .any(|email| email == &message.to);
        if hangs {
            tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        }

        self.outcome(message, sender.login())
    }
}
