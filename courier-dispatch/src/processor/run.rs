use courier_common::{RecipientRecord, internal, tracing};
use courier_state::SentState;

use super::{Dispatcher, report::{Failure, RunReport}};
use crate::{
    accounts::{AccountPool, SenderCredential},
    error::{DispatchError, SendError, TemporaryError},
    message::OutboundMessage,
    policy::Eligibility,
    rate_limiter::WaitOutcome,
    shutdown::ShutdownListener,
    types::Phase,
};

/// Why the inner loop over recipients stopped for an account.
enum AccountEnd {
    /// Cap reached or recipients exhausted; move on.
    Next,
    /// The account's credential was refused and it is being abandoned.
    Abandoned,
    /// Shutdown was signalled; stop the whole run.
    Cancelled,
}

/// Mutable bookkeeping for a single run, owned by the dispatch loop.
struct Progress<'r> {
    recipients: &'r [RecipientRecord],
    cursor: usize,
    /// History, the ignore list, and everything attempted this run.
    excluded: SentState,
    sent: SentState,
    /// A send attempt happened and its wait has not been served yet.
    owes_wait: bool,
    report: RunReport,
}

impl Dispatcher {
    /// Run the campaign over `recipients`.
    ///
    /// Per-recipient problems (incomplete data, build failures, send failures)
    /// are logged and counted but never stop the run. The sent-state is
    /// saved once at the end, including when the run is cancelled.
    ///
    /// # Errors
    /// [`DispatchError::EmptyAccountPool`] if no configured login has a
    /// credential. Nothing is sent or saved in that case.
    pub async fn run(
        &mut self,
        recipients: &[RecipientRecord],
        mut shutdown: ShutdownListener,
    ) -> Result<RunReport, DispatchError> {
        self.enter(Phase::LoadingState);
        let history = self.state.load_or_default().await;
        let mut excluded = history.clone();
        excluded.extend(self.config.ignore.iter().map(|id| id.trim().to_string()));
        internal!(
            level = INFO,
            "Loaded {} previously contacted identifier(s) from {}, {} ignored",
            history.len(),
            self.state.location(),
            self.config.ignore.len()
        );

        self.enter(Phase::ResolvingAccounts);
        let pool = match AccountPool::resolve(&self.config.logins, &self.credentials) {
            Ok(pool) => pool,
            Err(e) => {
                tracing::error!(error = %e, "Cannot start dispatch");
                return Err(e);
            }
        };

        self.enter(Phase::Dispatching);
        let mut progress = Progress {
            recipients,
            cursor: 0,
            excluded,
            sent: SentState::new(),
            owes_wait: false,
            report: RunReport::new(pool.logins()),
        };

        for account in &pool {
            if progress.cursor >= recipients.len() {
                break;
            }

            internal!(
                level = INFO,
                "Sending from {} (cap {})",
                account.login(),
                self.cap
            );

            match self.dispatch_account(account, &mut progress, &mut shutdown).await {
                AccountEnd::Next => {}
                AccountEnd::Abandoned => tracing::warn!(
                    login = %account.login(),
                    "Credential rejected, abandoning account for this run"
                ),
                AccountEnd::Cancelled => {
                    tracing::warn!("Shutdown requested, stopping dispatch");
                    progress.report.cancelled = true;
                    break;
                }
            }
        }

        progress.report.unattempted = recipients.len() - progress.cursor;

        self.enter(Phase::Persisting);
        let merged = history.union(&progress.sent);
        match self.state.save(&merged, self.write_mode).await {
            Ok(_) => progress.report.persisted = true,
            Err(e) => tracing::error!(
                location = %self.state.location(),
                error = %e,
                unsaved = progress.sent.len(),
                "Failed to save sent-state; these recipients may be contacted again next run"
            ),
        }
        progress.report.state = merged;

        self.enter(Phase::Done);
        internal!(
            level = INFO,
            "Dispatch finished: {} sent, {} failed, {} skipped",
            progress.report.total_sent(),
            progress.report.failures.len(),
            progress.report.skipped.total()
        );

        Ok(progress.report)
    }

    async fn dispatch_account(
        &self,
        account: &SenderCredential,
        progress: &mut Progress<'_>,
        shutdown: &mut ShutdownListener,
    ) -> AccountEnd {
        let mut account_sent = 0;

        while progress.cursor < progress.recipients.len() {
            if self.cap.is_reached(account_sent) {
                tracing::debug!(
                    login = %account.login(),
                    "Max emails limit of {} hit, moving to next account",
                    self.cap
                );
                return AccountEnd::Next;
            }

            let record = &progress.recipients[progress.cursor];
            let eligibility =
                Eligibility::evaluate(record, &progress.excluded, &self.validity);
            if !eligibility.is_admitted() {
                eligibility.log(record);
                progress.report.skipped.record(&eligibility);
                progress.cursor += 1;
                continue;
            }

            let identifier = record.identifier.trim();
            let message = match self.builder.build(account.login(), record).await {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!(
                        identifier = %identifier,
                        email = %record.email,
                        error = %e,
                        "Cannot build message"
                    );
                    progress.fail(record, account, e.to_string());
                    progress.cursor += 1;
                    continue;
                }
            };

            if progress.owes_wait {
                progress.owes_wait = false;
                if self.rate_limiter.wait(shutdown).await == WaitOutcome::Cancelled {
                    return AccountEnd::Cancelled;
                }
            }
            if shutdown.is_triggered() {
                return AccountEnd::Cancelled;
            }

            progress.cursor += 1;
            let result = self.send_with_retry(&message, account, shutdown).await;
            progress.owes_wait = true;

            match result {
                Ok(()) => {
                    tracing::info!(
                        identifier = %identifier,
                        login = %account.login(),
                        "Sent to {}",
                        message.to
                    );
                    progress.excluded.insert(identifier);
                    progress.sent.insert(identifier);
                    progress.report.record_sent(account.login(), identifier);
                    account_sent += 1;
                }
                Err(e) => {
                    tracing::error!(
                        identifier = %identifier,
                        login = %account.login(),
                        error = %e,
                        "Error sending email to '{}'",
                        record.email
                    );
                    let abandon = self.config.abandon_account_on_auth_failure && e.is_auth_failure();
                    progress.fail(record, account, e.to_string());

                    if abandon {
                        return AccountEnd::Abandoned;
                    }
                }
            }
        }

        AccountEnd::Next
    }

    /// One send plus any retries the policy allows, each bounded by the send
    /// timeout. Only failures where nothing reached the server are retried.
    async fn send_with_retry(
        &self,
        message: &OutboundMessage,
        account: &SenderCredential,
        shutdown: &mut ShutdownListener,
    ) -> Result<(), SendError> {
        let mut retry = self.config.retry.start();

        loop {
            let result = tokio::time::timeout(
                self.send_timeout,
                self.transport.send(message, account),
            )
            .await
            .unwrap_or_else(|_| {
                Err(TemporaryError::Timeout(format!(
                    "no response within {}s",
                    self.send_timeout.as_secs()
                ))
                .into())
            });

            let error = match result {
                Err(e) if e.is_retryable() => e,
                other => return other,
            };

            let Some(backoff) = retry.next_backoff() else {
                return Err(error);
            };

            tracing::warn!(
                email = %message.to,
                error = %error,
                retry_in_secs = backoff.as_secs(),
                attempts_remaining = retry.attempts_remaining(),
                "Send failed before reaching the server, retrying"
            );

            tokio::select! {
                () = tokio::time::sleep(backoff) => {}
                () = shutdown.triggered() => return Err(error),
            }
        }
    }
}

impl Progress<'_> {
    /// A recipient failed for this run; it will not be tried again until the next one.
    fn fail(&mut self, record: &RecipientRecord, account: &SenderCredential, reason: String) {
        let identifier = record.identifier.trim();
        self.excluded.insert(identifier);
        self.report.failures.push(Failure {
            identifier: identifier.to_string(),
            email: record.email.trim().to_string(),
            login: account.login().to_string(),
            reason,
        });
    }
}
