//! Small value types shared by the dispatcher and its configuration

use std::fmt::{self, Display, Formatter};

/// How many successful sends one account may make in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCap {
    /// No explicit cap; the account sends until recipients run out.
    Unlimited,
    AtMost(u32),
}

impl AccountCap {
    /// Whether an account that has sent `sent` messages must stop.
    #[must_use]
    pub fn is_reached(self, sent: usize) -> bool {
        match self {
            Self::Unlimited => false,
            Self::AtMost(cap) => sent >= usize::try_from(cap).unwrap_or(usize::MAX),
        }
    }
}

/// `0` means [`AccountCap::Unlimited`].
impl From<u32> for AccountCap {
    fn from(cap: u32) -> Self {
        if cap == 0 {
            Self::Unlimited
        } else {
            Self::AtMost(cap)
        }
    }
}

impl Display for AccountCap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::AtMost(cap) => write!(f, "{cap}"),
        }
    }
}

/// Where a [`Dispatcher`](crate::Dispatcher) run currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    LoadingState,
    ResolvingAccounts,
    Dispatching,
    Persisting,
    Done,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::LoadingState => "loading state",
            Self::ResolvingAccounts => "resolving accounts",
            Self::Dispatching => "dispatching",
            Self::Persisting => "persisting",
            Self::Done => "done",
        })
    }
}
