//! Sender accounts and the pool they are rotated through.

use std::fmt;

use ahash::AHashMap;
use courier_common::{internal, tracing};
use secrecy::{ExposeSecret, SecretString};

use crate::error::DispatchError;

/// A login and the secret it authenticates with.
///
/// The login doubles as the `From` address and the transport username.
pub struct SenderCredential {
    login: String,
    secret: SecretString,
}

impl SenderCredential {
    #[must_use]
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.secret
    }
}

impl fmt::Debug for SenderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderCredential")
            .field("login", &self.login)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Every secret known to the process, keyed by login.
#[derive(Default)]
pub struct CredentialStore {
    secrets: AHashMap<String, SecretString>,
}

impl CredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, login: impl Into<String>, secret: impl Into<String>) {
        self.secrets
            .insert(login.into(), SecretString::from(secret.into()));
    }

    /// Look up the credential for `login`. Blank secrets count as absent.
    #[must_use]
    pub fn credential(&self, login: &str) -> Option<SenderCredential> {
        self.secrets
            .get(login)
            .map(|secret| secret.expose_secret())
            .filter(|secret| !secret.trim().is_empty())
            .map(|secret| SenderCredential::new(login, secret))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("logins", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<L: Into<String>, S: Into<String>> FromIterator<(L, S)> for CredentialStore {
    fn from_iter<I: IntoIterator<Item = (L, S)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (login, secret) in iter {
            store.insert(login, secret);
        }
        store
    }
}

/// Ordered, de-duplicated set of sender accounts for one run.
#[derive(Debug)]
pub struct AccountPool {
    accounts: Vec<SenderCredential>,
}

impl AccountPool {
    /// Resolve `logins` against `store`, keeping the order they were given in.
    ///
    /// A login without a usable secret is logged and left out. A login listed
    /// twice is only used once.
    ///
    /// # Errors
    /// [`DispatchError::EmptyAccountPool`] when no login resolves.
    pub fn resolve(logins: &[String], store: &CredentialStore) -> Result<Self, DispatchError> {
        let mut accounts: Vec<SenderCredential> = Vec::with_capacity(logins.len());

        for login in logins {
            if accounts.iter().any(|account| account.login() == login) {
                tracing::warn!(login = %login, "Login listed more than once, using it once");
                continue;
            }

            match store.credential(login) {
                Some(credential) => accounts.push(credential),
                None => tracing::error!(login = %login, "No credential found for login, skipping"),
            }
        }

        if accounts.is_empty() {
            return Err(DispatchError::EmptyAccountPool {
                requested: logins.len(),
            });
        }

        internal!(
            level = DEBUG,
            "Resolved {} of {} sender account(s)",
            accounts.len(),
            logins.len()
        );

        Ok(Self { accounts })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SenderCredential> {
        self.accounts.iter()
    }

    #[must_use]
    pub fn logins(&self) -> Vec<&str> {
        self.accounts.iter().map(SenderCredential::login).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl<'a> IntoIterator for &'a AccountPool {
    type Item = &'a SenderCredential;
    type IntoIter = std::slice::Iter<'a, SenderCredential>;

    fn into_iter(self) -> Self::IntoIter {
        self.accounts.iter()
    }
}
