//! Enrollment orchestration.
//!
//! [`Enroller`] ties a [`CaClient`] to an [`IdentityStore`] and makes
//! enrollment idempotent per label. Two mechanisms cooperate:
//!
//! - an async mutex per label serializes check, enroll and store inside one
//!   process, so concurrent callers make a single CA request
//! - the store's no-overwrite `put` settles races between processes; the
//!   loser sees `DuplicateIdentity` and reports `AlreadyEnrolled`

use fabric_ca_client::CaClient;
use fabric_enroll_core::{
    EnrollError, EnrollmentOutcome, EnrollmentRequest, EnrollmentStage, EnrollmentState, Result,
};
use fabric_wallet::{validate_label, IdentityStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

type LabelLock = Arc<tokio::sync::Mutex<()>>;
type LockMap = Mutex<HashMap<String, LabelLock>>;

/// Enrolls identities at most once per label
pub struct Enroller {
    store: Arc<dyn IdentityStore>,
    client: CaClient,
    locks: LockMap,
}

impl Enroller {
    /// Create an orchestrator over `store` and `client`
    pub fn new(store: Arc<dyn IdentityStore>, client: CaClient) -> Self {
        Self {
            store,
            client,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The store identities are written to
    #[must_use]
    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    /// The CA client used for enrollment
    #[must_use]
    pub const fn client(&self) -> &CaClient {
        &self.client
    }

    /// Make sure an identity is stored under `label`.
    ///
    /// Returns [`EnrollmentOutcome::AlreadyEnrolled`] without contacting the
    /// CA when the label is taken. Otherwise enrolls with `request` and
    /// stores the issued identity under `label`.
    ///
    /// Nothing is retried. If the CA issued a certificate but the store
    /// write failed, the error is [`EnrollError::PartialEnrollment`]: the
    /// secret is likely spent and a new one is needed.
    pub async fn ensure_enrolled(
        &self,
        label: &str,
        request: &EnrollmentRequest,
    ) -> Result<EnrollmentOutcome> {
        validate_label(label)?;

        let lease = self.label_lock(label);
        let _guard = lease.lock.lock().await;
        let mut attempt = Attempt::new(label);

        let present = self
            .store
            .exists(label)
            .await
            .map_err(|e| attempt.fail(EnrollmentStage::StoreCheck, e))?;
        attempt.advance(EnrollmentState::Checked { present });

        if present {
            attempt.advance(EnrollmentState::Done);
            info!(label, "identity already enrolled");
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }

        attempt.advance(EnrollmentState::Enrolling);
        let identity = match self.client.enroll(request).await {
            Ok(identity) => identity.with_label(label),
            Err(e) => return Err(attempt.fail(e.stage(), e)),
        };

        match self.store.put(label, &identity).await {
            Ok(()) => {
                attempt.advance(EnrollmentState::Stored);
                info!(label, issuer = %identity.issuer_id, "enrolled and stored identity");
                Ok(EnrollmentOutcome::NewlyEnrolled(identity))
            }
            Err(EnrollError::DuplicateIdentity { .. }) => {
                // Another process stored first; the certificate we hold is discarded
                warn!(label, "identity stored concurrently by another writer");
                attempt.advance(EnrollmentState::Done);
                Ok(EnrollmentOutcome::AlreadyEnrolled)
            }
            Err(e) => Err(attempt.fail(
                EnrollmentStage::StoreWrite,
                EnrollError::PartialEnrollment {
                    label: label.to_string(),
                    source: Box::new(e),
                },
            )),
        }
    }

    fn label_lock<'a>(&'a self, label: &'a str) -> LockLease<'a> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        LockLease {
            locks: &self.locks,
            label,
            lock: Arc::clone(locks.entry(label.to_string()).or_default()),
        }
    }
}

/// A caller's share of a label lock.
///
/// Dropping the last lease removes the label from the map, so the map only
/// holds labels with an attempt in flight.
struct LockLease<'a> {
    locks: &'a LockMap,
    label: &'a str,
    lock: LabelLock,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Leases are only handed out under the map lock, so a count of two
        // (map + this lease) means nobody else is waiting
        let last = locks
            .get(self.label)
            .is_some_and(|held| Arc::ptr_eq(held, &self.lock) && Arc::strong_count(held) == 2);
        if last {
            locks.remove(self.label);
        }
    }
}

impl std::fmt::Debug for Enroller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enroller")
            .field("endpoint", &self.client.endpoint().url().as_str())
            .finish_non_exhaustive()
    }
}

/// State of one `ensure_enrolled` call
struct Attempt<'a> {
    label: &'a str,
    state: EnrollmentState,
}

impl<'a> Attempt<'a> {
    const fn new(label: &'a str) -> Self {
        Self {
            label,
            state: EnrollmentState::NotChecked,
        }
    }

    fn advance(&mut self, next: EnrollmentState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal enrollment transition {} -> {}",
            self.state,
            next
        );
        debug!(label = self.label, from = %self.state, to = %next, "enrollment state");
        self.state = next;
    }

    fn fail(&mut self, stage: EnrollmentStage, err: EnrollError) -> EnrollError {
        self.advance(EnrollmentState::Failed(stage));
        error!(label = self.label, %stage, error = %err, "enrollment failed");
        err
    }
}
