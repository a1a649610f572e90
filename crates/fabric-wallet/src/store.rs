//! Identity store trait definition.
//!
//! [`IdentityStore`] is the single shared mutable resource of an enrollment:
//! every write goes through [`put`](IdentityStore::put), which refuses to
//! replace an existing record. That refusal is what makes "enroll at most
//! once per label" hold even when two callers race past their `exists`
//! checks.

use async_trait::async_trait;
use fabric_enroll_core::{EnrollError, Identity, Result};

/// Longest label accepted by the stores
pub const MAX_LABEL_LEN: usize = 200;

/// Durable mapping from label to [`Identity`].
///
/// | Method | Description |
/// |--------|-------------|
/// | [`exists`](IdentityStore::exists) | Whether a record is stored under a label |
/// | [`get`](IdentityStore::get) | Load and validate a record |
/// | [`put`](IdentityStore::put) | Store a new record, never overwriting |
/// | [`list`](IdentityStore::list) | Labels currently stored |
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Returns true if a record is stored under `label`.
    ///
    /// Fails only when the storage medium cannot be read.
    async fn exists(&self, label: &str) -> Result<bool>;

    /// Load the identity stored under `label`.
    ///
    /// A record that cannot be decoded, or whose certificate does not match
    /// its private key, is reported as [`EnrollError::StoreCorruption`].
    async fn get(&self, label: &str) -> Result<Option<Identity>>;

    /// Store `identity` under `label`.
    ///
    /// Concurrent readers see either no record or the complete record.
    /// Fails with [`EnrollError::DuplicateIdentity`] if the label is taken.
    async fn put(&self, label: &str, identity: &Identity) -> Result<()>;

    /// Labels of all stored identities, sorted
    async fn list(&self) -> Result<Vec<String>>;
}

/// Check that `label` can be used as a store key.
///
/// Labels become file names in [`FileSystemWallet`](crate::FileSystemWallet),
/// so path separators and leading dots are refused everywhere.
pub fn validate_label(label: &str) -> Result<()> {
    let reason = if label.is_empty() {
        Some("must not be empty")
    } else if label.len() > MAX_LABEL_LEN {
        Some("is too long")
    } else if label.starts_with('.') {
        Some("must not start with '.'")
    } else if label.contains(['/', '\\', '\0']) {
        Some("must not contain path separators or NUL")
    } else if label.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(EnrollError::InvalidLabel {
            label: label.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_labels() {
        for label in ["admin", "appUser", "peer0.org1", "user-1@org1"] {
            assert!(validate_label(label).is_ok(), "{label}");
        }
    }

    #[test]
    fn test_invalid_labels() {
        let too_long = "a".repeat(MAX_LABEL_LEN + 1);
        for label in ["", ".hidden", "../admin", "a/b", "a\\b", "a\nb", too_long.as_str()] {
            assert!(
                matches!(validate_label(label), Err(EnrollError::InvalidLabel { .. })),
                "{label:?}"
            );
        }
    }
}
