//! HTTP client for the Fabric CA enrollment API.
//!
//! This crate provides the [`CaClient`] that turns an enrollment id and
//! secret into a signed X.509 [`Identity`](fabric_enroll_core::Identity):
//! it generates the key pair locally, sends only the CSR, and checks that
//! the returned certificate matches the key before handing it back.
//!
//! # Features
//!
//! - `rustls` (default) - Use rustls for TLS
//! - `native-tls` - Use system native TLS
//! - `testutil` - Enable the [`testutil`] mock CA for downstream tests

#![doc(html_root_url = "https://docs.rs/fabric-ca-client/0.3.0")]

mod client;
mod config;
pub mod api;
pub mod csr;
pub mod keys;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use client::{CaClient, CaClientBuilder};
pub use config::*;
pub use fabric_enroll_core::{EnrollError, Result};
