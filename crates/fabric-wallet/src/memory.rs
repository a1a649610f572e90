//! In-memory wallet.

use async_trait::async_trait;
use fabric_enroll_core::{EnrollError, Identity, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::store::{validate_label, IdentityStore};

/// Wallet kept in process memory.
///
/// Useful for tests and for short-lived tools that hand the identity to
/// something else. The check-and-insert in `put` happens under one write
/// lock.
#[derive(Debug, Default)]
pub struct InMemoryWallet {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryWallet {
    /// Create an empty wallet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities
    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    /// Returns true if nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryWallet {
    async fn exists(&self, label: &str) -> Result<bool> {
        validate_label(label)?;
        Ok(self.identities.read().await.contains_key(label))
    }

    async fn get(&self, label: &str) -> Result<Option<Identity>> {
        validate_label(label)?;
        Ok(self.identities.read().await.get(label).cloned())
    }

    async fn put(&self, label: &str, identity: &Identity) -> Result<()> {
        validate_label(label)?;
        let mut identities = self.identities.write().await;
        match identities.entry(label.to_string()) {
            Entry::Occupied(_) => Err(EnrollError::DuplicateIdentity {
                label: label.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(identity.clone().with_label(label));
                info!(label, "stored identity in memory");
                Ok(())
            }
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut labels: Vec<String> = self.identities.read().await.keys().cloned().collect();
        labels.sort();
        Ok(labels)
    }
}
