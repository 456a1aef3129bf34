//! Wallet Ledger
//!
//! Balance and time-lock accounting for privacy-coin wallets: owned
//! outputs, the locks that gate them, balances computed at an explicit
//! chain tip, and a cache that opens each wallet exactly once.

pub mod cache;
pub mod cli;
pub mod config;
pub mod ledger;
pub mod storage;
pub mod types;
