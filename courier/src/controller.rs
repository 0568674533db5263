use std::{
    fmt::{self, Display, Formatter},
    sync::{Arc, LazyLock},
};

use courier_common::{RecipientRecord, Signal, internal, tracing};
use courier_dispatch::{
    AccountPool, CampaignTemplate, CredentialStore, Dispatcher, DryRunTransport, Eligibility,
    RunReport, ShutdownListener, SkipCounts, SmtpTransport, Transport, ValidityMap,
};
use courier_state::{MemorySentStateStore, SentState, SentStateStore};
use tokio::sync::broadcast;

use crate::{
    config::Courier,
    credentials::{load_credentials, load_validity},
    source::load_recipients,
};

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// Wait for CTRL+C or SIGTERM and broadcast [`Signal::Shutdown`].
///
/// A second CTRL+C exits the process immediately.
async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!(level = WARN, "CTRL+C entered -- Enter it again to force shutdown");
        }
        _ = terminate.recv() => {
            internal!(level = WARN, "Terminate Signal received, shutting down");
        }
    };

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    tokio::signal::ctrl_c().await?;
    internal!(level = ERROR, "Forced shutdown, sent-state was not saved");
    std::process::exit(130);
}

/// Command line overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Build every message but hand it to a transport that sends nothing,
    /// and never write the sent-state.
    pub dry_run: bool,
    pub max_per_account: Option<u32>,
    pub delay_secs: Option<f64>,
    pub jitter: Option<f64>,
    /// Replace the configured logins
    pub logins: Vec<String>,
}

/// Eligibility breakdown of the recipient table, without sending anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub recipients: usize,
    pub eligible: usize,
    pub skipped: SkipCounts,
    pub history: usize,
    /// Logins that resolved to a credential, in rotation order
    pub accounts: Vec<String>,
    /// Configured logins with no usable credential
    pub missing_accounts: Vec<String>,
}

impl Display for CheckReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recipients: {}", self.recipients)?;
        writeln!(f, "  eligible: {}", self.eligible)?;
        writeln!(f, "  incomplete: {}", self.skipped.incomplete)?;
        writeln!(f, "  already sent: {}", self.skipped.already_sent)?;
        writeln!(f, "  invalid: {}", self.skipped.undeliverable)?;
        writeln!(f, "Sent-state: {} identifier(s)", self.history)?;
        writeln!(f, "Accounts: {}", self.accounts.join(", "))?;
        if !self.missing_accounts.is_empty() {
            writeln!(f, "Missing credentials: {}", self.missing_accounts.join(", "))?;
        }
        Ok(())
    }
}

impl Courier {
    fn apply(&mut self, options: &SendOptions) {
        if let Some(max) = options.max_per_account {
            self.campaign.max_per_account = max;
        }
        if let Some(delay) = options.delay_secs {
            self.campaign.rate_limit.base_delay_secs = delay;
        }
        if let Some(jitter) = options.jitter {
            self.campaign.rate_limit.jitter = jitter;
        }
        if !options.logins.is_empty() {
            self.campaign.logins.clone_from(&options.logins);
        }
    }

    async fn load_inputs(&self) -> anyhow::Result<(Vec<RecipientRecord>, CredentialStore, ValidityMap)> {
        let recipients = load_recipients(&self.recipients).await?;
        let credentials = load_credentials(&self.credentials).await?;
        let validity = load_validity(self.validity.as_deref()).await?;

        Ok((recipients, credentials, validity))
    }

    /// Run one campaign to completion, or until a shutdown signal.
    ///
    /// # Errors
    /// If the recipient table, credentials, template or state location are
    /// unusable, or no configured login has a credential.
    pub async fn send(mut self, options: SendOptions) -> anyhow::Result<RunReport> {
        self.apply(&options);

        let (recipients, credentials, validity) = self.load_inputs().await?;
        let template = Arc::new(CampaignTemplate::new(&self.template)?);

        let mode = self.state.mode();
        let mut store = self.state.into_store()?;
        let transport: Arc<dyn Transport> = if options.dry_run {
            let history = store.load_or_default().await;
            internal!(
                level = WARN,
                "Dry run: no email will be sent and {} will not be written",
                store.location()
            );
            store = Arc::new(MemorySentStateStore::with_identifiers(
                history.iter().map(str::to_string).collect::<Vec<_>>(),
            ));
            Arc::new(DryRunTransport::new())
        } else {
            Arc::new(SmtpTransport::new(self.smtp.clone()))
        };

        let mut dispatcher = Dispatcher::builder(self.campaign)
            .renderer(template)
            .transport(transport)
            .state(store, mode)
            .credentials(credentials)
            .validity(validity)
            .build()?;

        let listener = ShutdownListener::new(SHUTDOWN_BROADCAST.subscribe());
        let signals = tokio::spawn(async {
            if let Err(e) = shutdown().await {
                tracing::error!(error = %e, "Cannot listen for shutdown signals");
            }
        });

        let report = dispatcher.run(&recipients, listener).await;
        signals.abort();

        internal!(level = INFO, "Dispatcher finished in phase {}", dispatcher.phase());
        Ok(report?)
    }

    /// Report how the recipient table would be treated, without sending.
    ///
    /// # Errors
    /// If the recipient table, credentials or state location are unusable.
    pub async fn check(mut self, options: &SendOptions) -> anyhow::Result<CheckReport> {
        self.apply(options);

        let (recipients, credentials, validity) = self.load_inputs().await?;
        let history = self.state.into_store()?.load_or_default().await;
        let mut excluded = history.clone();
        excluded.extend(self.campaign.ignore.iter().map(|id| id.trim().to_string()));

        let mut report = CheckReport {
            recipients: recipients.len(),
            history: history.len(),
            ..CheckReport::default()
        };

        for record in &recipients {
            let eligibility = Eligibility::evaluate(record, &excluded, &validity);
            if eligibility.is_admitted() {
                excluded.insert(record.identifier.trim());
                report.eligible += 1;
            } else {
                report.skipped.record(&eligibility);
            }
        }

        match AccountPool::resolve(&self.campaign.logins, &credentials) {
            Ok(pool) => {
                report.accounts = pool.logins().into_iter().map(str::to_string).collect();
            }
            Err(e) => tracing::warn!(error = %e, "No usable sender account"),
        }
        report.missing_accounts = self
            .campaign
            .logins
            .iter()
            .filter(|login| credentials.credential(login).is_none())
            .cloned()
            .collect();

        Ok(report)
    }

    /// The identifiers currently held in the sent-state.
    ///
    /// # Errors
    /// If the state location is invalid or cannot be read.
    pub async fn sent_state(self) -> anyhow::Result<SentState> {
        let store: Arc<dyn SentStateStore> = self.state.into_store()?;
        Ok(store.load().await?)
    }
}
