//! Policy abstractions for dispatch decisions.
//!
//! ## Policies
//!
//! - [`Eligibility`]: admit or skip a recipient before anything is built
//! - [`RetryPolicy`]: how often a failed connection is retried, and how long to back off

pub mod eligibility;
pub mod retry;

pub use eligibility::{Eligibility, ValidityMap};
pub use retry::{RetryPolicy, RetryState};
