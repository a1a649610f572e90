//! Identity wallets for enrolled Fabric identities.
//!
//! A wallet maps a label (e.g. `"admin"`) to an [`Identity`]. All backends
//! share the [`IdentityStore`] contract:
//!
//! - `put` never overwrites; a taken label is
//!   [`DuplicateIdentity`](fabric_enroll_core::EnrollError::DuplicateIdentity)
//! - readers never observe a partially written record
//! - records whose certificate and key disagree are reported as corrupt
//!
//! # Backends
//!
//! - [`FileSystemWallet`] - one Fabric-compatible JSON file per identity
//! - [`InMemoryWallet`] - process memory, for tests and embedding
//!
//! # Example
//!
//! ```rust,ignore
//! use fabric_wallet::{FileSystemWallet, IdentityStore};
//!
//! let wallet = FileSystemWallet::open("wallet").await?;
//! if let Some(admin) = wallet.get("admin").await? {
//!     println!("admin belongs to {}", admin.issuer_id);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/fabric-wallet/0.3.0")]

mod filesystem;
mod memory;
pub mod record;
mod store;

pub use fabric_enroll_core::{EnrollError, Identity, Result};
pub use filesystem::{FileSystemWallet, RECORD_EXTENSION};
pub use memory::InMemoryWallet;
pub use store::{validate_label, IdentityStore, MAX_LABEL_LEN};
