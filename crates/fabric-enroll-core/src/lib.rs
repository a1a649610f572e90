//! Core types and error taxonomy for Fabric CA enrollment.
//!
//! This crate provides the foundational types shared by the enrollment client,
//! the identity wallet and the orchestrator:
//!
//! - **Types**: [`Identity`], [`CaEndpoint`], [`EnrollmentRequest`] and the
//!   [`EnrollmentOutcome`] of an enrollment attempt
//! - **X.509 helpers**: certificate parsing and key/certificate consistency
//!   checks in [`x509`]
//! - **Errors**: the full failure taxonomy in [`EnrollError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use fabric_enroll_core::{CaEndpoint, EnrollmentRequest};
//!
//! let endpoint = CaEndpoint::builder("https://localhost:7054", "ca-org1")
//!     .msp_id("Org1MSP")
//!     .trusted_root_pem(std::fs::read("tls-ca.pem")?)
//!     .build()?;
//! let request = EnrollmentRequest::new("admin", "adminpw");
//! ```

#![doc(html_root_url = "https://docs.rs/fabric-enroll-core/0.3.0")]

mod error;
pub mod types;
pub mod x509;

pub use error::{EnrollError, EnrollmentStage, Result};
pub use types::*;
