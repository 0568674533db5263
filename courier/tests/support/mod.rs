//! Test support for running whole campaigns against files on disk.

#![allow(dead_code)]

pub mod harness;

pub use harness::CampaignHarness;
