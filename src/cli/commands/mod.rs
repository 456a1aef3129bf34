//! CLI command implementations

pub mod config;
pub mod ledger;
pub mod wallet;
