//! Per-recipient admission checks.

use ahash::AHashMap;
use courier_common::{RecipientRecord, RequiredField, tracing};
use courier_state::SentState;
use serde::Deserialize;

/// Email address to "known deliverable" flag.
///
/// Addresses not present in the map are treated as deliverable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ValidityMap(AHashMap<String, bool>);

impl ValidityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, email: impl Into<String>, deliverable: bool) {
        self.0.insert(email.into(), deliverable);
    }

    #[must_use]
    pub fn is_deliverable(&self, email: &str) -> bool {
        self.0.get(email.trim()).copied().unwrap_or(true)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<E: Into<String>> FromIterator<(E, bool)> for ValidityMap {
    fn from_iter<I: IntoIterator<Item = (E, bool)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(email, deliverable)| (email.into(), deliverable))
                .collect(),
        )
    }
}

/// Outcome of checking one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Admit,
    /// One or more required fields are empty.
    Incomplete(Vec<RequiredField>),
    /// The identifier is already in the exclusion set.
    AlreadySent,
    /// The validity map marks the email as undeliverable.
    Undeliverable,
}

impl Eligibility {
    /// Decide whether `record` may be sent to.
    ///
    /// Checks run in a fixed order: completeness, then the exclusion set,
    /// then the validity map. An incomplete record is always reported as
    /// such, even if it would also have matched a later check.
    #[must_use]
    pub fn evaluate(record: &RecipientRecord, excluded: &SentState, validity: &ValidityMap) -> Self {
        let missing = record.missing_fields();
        if !missing.is_empty() {
            return Self::Incomplete(missing);
        }

        if excluded.contains(record.identifier.trim()) {
            return Self::AlreadySent;
        }

        if !validity.is_deliverable(&record.email) {
            return Self::Undeliverable;
        }

        Self::Admit
    }

    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }

    /// Emit the skip reason at the level it warrants.
    pub fn log(&self, record: &RecipientRecord) {
        match self {
            Self::Admit => {}
            Self::Incomplete(missing) => {
                let email = record.email.trim();
                let missing = missing
                    .iter()
                    .map(|field| field.name())
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::error!(
                    identifier = %record.identifier,
                    "Missing {missing} for {}",
                    if email.is_empty() { "[no email]" } else { email }
                );
            }
            Self::AlreadySent => tracing::debug!(
                identifier = %record.identifier,
                organization = %record.organization_name,
                "Already contacted, skipping"
            ),
            Self::Undeliverable => tracing::debug!(
                identifier = %record.identifier,
                email = %record.email,
                "Email is marked as invalid, skipping"
            ),
        }
    }
}
