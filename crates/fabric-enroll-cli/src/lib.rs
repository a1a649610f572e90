//! # fabric-enroll-cli
//!
//! The `enroll-admin` command-line tool.
//!
//! ## Features
//!
//! - **Idempotent enrollment**: `enroll` is a no-op when the label is already in the wallet
//! - **Connection profiles**: CA settings can come from a Fabric `connection-*.json`
//! - **Wallet inspection**: `list` and `show` never print private keys
//! - **Output formats**: pretty text or JSON

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
