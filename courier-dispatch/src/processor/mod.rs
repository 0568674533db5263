//! Campaign dispatcher orchestration

mod report;
mod run;

use std::{sync::Arc, time::Duration};

use courier_common::internal;
use courier_state::{SentStateStore, WriteMode};
use serde::Deserialize;

pub use report::{AccountTally, Failure, RunReport, SkipCounts};

use crate::{
    accounts::CredentialStore,
    error::DispatchError,
    message::{MessageBuilder, TemplateRenderer},
    policy::{RetryPolicy, ValidityMap},
    rate_limiter::{RateLimitConfig, RateLimiter},
    transport::Transport,
    types::{AccountCap, Phase},
};

const fn default_max_per_account() -> u32 {
    20
}

const fn default_send_timeout() -> u64 {
    60
}

/// Run parameters for a campaign
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Successful sends allowed per account in one run. `0` means no cap.
    ///
    /// Default: 20
    #[serde(default = "default_max_per_account")]
    pub max_per_account: u32,

    /// Pacing between send attempts
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retries for sends that never reached the server
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Upper bound on a single send attempt (in seconds)
    ///
    /// Default: 60 seconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    /// Stop using an account for the rest of the run once the server rejects
    /// its credential.
    ///
    /// Default: `false` (every remaining recipient is attempted, each failing)
    #[serde(default)]
    pub abandon_account_on_auth_failure: bool,

    /// Sender logins, in rotation order
    #[serde(default)]
    pub logins: Vec<String>,

    /// Identifiers to treat as already sent, in addition to the persisted history.
    /// They are not written back to the sent-state.
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_per_account: default_max_per_account(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryPolicy::default(),
            send_timeout_secs: default_send_timeout(),
            abandon_account_on_auth_failure: false,
            logins: Vec::new(),
            ignore: Vec::new(),
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn cap(&self) -> AccountCap {
        AccountCap::from(self.max_per_account)
    }
}

/// Drives one campaign run: load history, resolve accounts, send, persist.
///
/// Sending is strictly sequential. Between send attempts the dispatcher
/// waits a jittered interval; it never waits before the first attempt or
/// after the last.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatchConfig,
    cap: AccountCap,
    send_timeout: Duration,
    rate_limiter: RateLimiter,
    builder: MessageBuilder,
    transport: Arc<dyn Transport>,
    state: Arc<dyn SentStateStore>,
    write_mode: WriteMode,
    credentials: CredentialStore,
    validity: ValidityMap,
    phase: Phase,
}

impl Dispatcher {
    /// Start building a dispatcher for `config`.
    #[must_use]
    pub fn builder(config: DispatchConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            config,
            renderer: None,
            transport: None,
            state: None,
            write_mode: WriteMode::default(),
            credentials: CredentialStore::new(),
            validity: ValidityMap::new(),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn enter(&mut self, phase: Phase) {
        internal!("Dispatcher phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder {
    config: DispatchConfig,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    transport: Option<Arc<dyn Transport>>,
    state: Option<Arc<dyn SentStateStore>>,
    write_mode: WriteMode,
    credentials: CredentialStore,
    validity: ValidityMap,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn state(mut self, state: Arc<dyn SentStateStore>, mode: WriteMode) -> Self {
        self.state = Some(state);
        self.write_mode = mode;
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn validity(mut self, validity: ValidityMap) -> Self {
        self.validity = validity;
        self
    }

    /// Validate the configuration and assemble the dispatcher.
    ///
    /// # Errors
    /// [`DispatchError::InvalidConfiguration`] if a collaborator is missing or
    /// a run parameter is out of range.
    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        let missing = |what: &str| DispatchError::InvalidConfiguration(format!("no {what} configured"));

        let renderer = self.renderer.ok_or_else(|| missing("template renderer"))?;
        let transport = self.transport.ok_or_else(|| missing("transport"))?;
        let state = self.state.ok_or_else(|| missing("sent-state store"))?;

        if self.config.send_timeout_secs == 0 {
            return Err(DispatchError::InvalidConfiguration(
                "send timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Dispatcher {
            cap: self.config.cap(),
            send_timeout: Duration::from_secs(self.config.send_timeout_secs),
            rate_limiter: RateLimiter::new(&self.config.rate_limit)?,
            builder: MessageBuilder::new(renderer),
            transport,
            state,
            write_mode: self.write_mode,
            credentials: self.credentials,
            validity: self.validity,
            phase: Phase::Idle,
            config: self.config,
        })
    }
}
