use std::fmt::{self, Display, Formatter};

use courier_state::SentState;

use crate::policy::Eligibility;

/// Successful sends made through one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTally {
    pub login: String,
    pub sent: usize,
}

/// Recipients passed over before any send attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub incomplete: usize,
    pub already_sent: usize,
    pub undeliverable: usize,
}

impl SkipCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.incomplete + self.already_sent + self.undeliverable
    }

    pub fn record(&mut self, eligibility: &Eligibility) {
        match eligibility {
            Eligibility::Admit => {}
            Eligibility::Incomplete(_) => self.incomplete += 1,
            Eligibility::AlreadySent => self.already_sent += 1,
            Eligibility::Undeliverable => self.undeliverable += 1,
        }
    }
}

/// A recipient whose message could not be built or sent this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub identifier: String,
    pub email: String,
    pub login: String,
    pub reason: String,
}

/// Outcome of one dispatcher run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub accounts: Vec<AccountTally>,
    /// Identifiers sent to this run, in send order.
    pub sent: Vec<String>,
    pub skipped: SkipCounts,
    pub failures: Vec<Failure>,
    /// Recipients never looked at because every account hit its cap or the
    /// run was cancelled.
    pub unattempted: usize,
    /// The run stopped early on a shutdown signal.
    pub cancelled: bool,
    /// The sent-state was written successfully.
    pub persisted: bool,
    /// Prior history plus this run's successes, whether or not it was persisted.
    pub state: SentState,
}

impl RunReport {
    pub(crate) fn new<'a>(logins: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            accounts: logins
                .into_iter()
                .map(|login| AccountTally {
                    login: login.to_string(),
                    sent: 0,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn record_sent(&mut self, login: &str, identifier: &str) {
        if let Some(tally) = self.accounts.iter_mut().find(|t| t.login == login) {
            tally.sent += 1;
        }
        self.sent.push(identifier.to_string());
    }

    #[must_use]
    pub fn total_sent(&self) -> usize {
        self.sent.len()
    }

    /// Sends attributed to `login`.
    #[must_use]
    pub fn sent_by(&self, login: &str) -> usize {
        self.accounts
            .iter()
            .find(|tally| tally.login == login)
            .map_or(0, |tally| tally.sent)
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sent: {}", self.total_sent())?;
        for tally in &self.accounts {
            writeln!(f, "  {}: {}", tally.login, tally.sent)?;
        }
        writeln!(
            f,
            "Skipped: {} (incomplete {}, already sent {}, invalid {})",
            self.skipped.total(),
            self.skipped.incomplete,
            self.skipped.already_sent,
            self.skipped.undeliverable
        )?;
        writeln!(f, "Failed: {}", self.failures.len())?;
        for failure in &self.failures {
            writeln!(
                f,
                "  {} <{}>: {}",
                failure.identifier, failure.email, failure.reason
            )?;
        }
        if self.unattempted > 0 {
            writeln!(f, "Not reached: {}", self.unattempted)?;
        }
        if self.cancelled {
            writeln!(f, "Run was cancelled")?;
        }
        write!(
            f,
            "Sent-state: {} identifier(s){}",
            self.state.len(),
            if self.persisted { "" } else { " (NOT saved)" }
        )
    }
}
