//! Enroll a Fabric identity with a CA and store it exactly once.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fabric_enroll::{CaClient, CaEndpoint, Enroller, EnrollmentRequest, FileSystemWallet};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = CaEndpoint::builder("https://localhost:7054", "ca-org1")
//!         .msp_id("Org1MSP")
//!         .trusted_root_pem(std::fs::read("tls-ca.pem")?)
//!         .build()?;
//!
//!     let wallet = Arc::new(FileSystemWallet::open("wallet").await?);
//!     let enroller = Enroller::new(wallet, CaClient::new(endpoint)?);
//!
//!     let outcome = enroller
//!         .ensure_enrolled("admin", &EnrollmentRequest::new("admin", "adminpw"))
//!         .await?;
//!     println!("newly enrolled: {}", outcome.is_new());
//!     Ok(())
//! }
//! ```
//!
//! Calling [`Enroller::ensure_enrolled`] again with the same label is a
//! no-op that returns [`EnrollmentOutcome::AlreadyEnrolled`] without
//! contacting the CA.
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/fabric-enroll/0.3.0")]

mod orchestrator;

pub use orchestrator::Enroller;

// Re-export core types
pub use fabric_enroll_core::*;

// Re-export client and wallet
pub use fabric_ca_client::{CaClient, CaClientBuilder, KeyAlgorithm, TimeoutConfig};
pub use fabric_wallet::{FileSystemWallet, IdentityStore, InMemoryWallet};

// Re-export runtime for convenience
pub use tokio;
