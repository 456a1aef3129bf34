//! Storage layer for wallet data
//!
//! Manages wallet directories and the output snapshots they hold.

pub mod file_system;
pub mod models;
