//! Campaign runner: configuration, input loading and process control around
//! the dispatcher.

pub mod config;
pub mod controller;
pub mod credentials;
pub mod source;
