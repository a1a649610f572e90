use std::fmt;
use thiserror::Error;

/// Result type alias for enrollment operations
pub type Result<T> = std::result::Result<T, EnrollError>;

/// Stage of the enrollment workflow an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStage {
    /// Validating inputs or configuration
    Setup,
    /// Checking the identity store for an existing record
    StoreCheck,
    /// Generating the key pair and signing request
    KeyGeneration,
    /// Talking to the CA
    CaRequest,
    /// Validating the certificate the CA returned
    ResponseValidation,
    /// Writing the identity to the store
    StoreWrite,
}

impl fmt::Display for EnrollmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::StoreCheck => "store check",
            Self::KeyGeneration => "key generation",
            Self::CaRequest => "CA request",
            Self::ResponseValidation => "response validation",
            Self::StoreWrite => "store write",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while enrolling or storing an identity
#[derive(Error, Debug)]
pub enum EnrollError {
    /// Key material could not be generated
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Connection, TLS or timeout failure talking to the CA
    #[error("transport error talking to CA at {url}: {message}")]
    Transport {
        /// CA URL that was being contacted
        url: String,
        /// Underlying failure
        message: String,
        /// Whether the request timed out
        timed_out: bool,
    },

    /// The CA refused the enrollment id / secret pair
    #[error("CA rejected the enrollment secret for '{enrollment_id}': {message}")]
    Authentication {
        /// Enrollment id that was rejected
        enrollment_id: String,
        /// Message reported by the CA
        message: String,
    },

    /// The CA answered, but not with a usable certificate
    #[error("malformed CA response: {0}")]
    MalformedResponse(String),

    /// The CA rejected the request for a reason other than authentication
    #[error("CA rejected the enrollment (HTTP {status}): {message}")]
    CaRejected {
        /// HTTP status code
        status: u16,
        /// Fabric CA error code, when one was reported
        code: Option<i64>,
        /// Message reported by the CA
        message: String,
    },

    /// The storage medium could not be read or written
    #[error("identity store unavailable for '{label}': {source}")]
    StoreUnavailable {
        /// Label being accessed (`*` for whole-store operations)
        label: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A stored record exists but cannot be trusted
    #[error("identity record for '{label}' is corrupt: {reason}")]
    StoreCorruption {
        /// Label of the corrupt record
        label: String,
        /// What is wrong with it
        reason: String,
    },

    /// A record already occupies the label
    #[error("an identity labelled '{label}' already exists in the store")]
    DuplicateIdentity {
        /// Occupied label
        label: String,
    },

    /// The CA issued a certificate but the store write failed
    #[error(
        "enrolled '{label}' with the CA but could not store the identity: {source}; \
         the enrollment secret is likely consumed, request a new one before retrying"
    )]
    PartialEnrollment {
        /// Label that was being enrolled
        label: String,
        /// Store failure that followed the enrollment
        #[source]
        source: Box<EnrollError>,
    },

    /// The label cannot be used as a store key
    #[error("invalid identity label '{label}': {reason}")]
    InvalidLabel {
        /// Offending label
        label: String,
        /// Why it was refused
        reason: &'static str,
    },

    /// Invalid endpoint or client configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl EnrollError {
    /// Returns true if the enrollment secret should be considered spent.
    ///
    /// Recovery from these errors needs a fresh secret from the CA
    /// registrar, not another attempt with the same one.
    #[must_use]
    pub const fn is_fatal_for_secret(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::PartialEnrollment { .. }
        )
    }

    /// Returns true if the error came from the identity store
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. }
                | Self::StoreCorruption { .. }
                | Self::DuplicateIdentity { .. }
                | Self::InvalidLabel { .. }
        )
    }

    /// Returns the workflow stage this error is attributed to
    #[must_use]
    pub const fn stage(&self) -> EnrollmentStage {
        match self {
            Self::KeyGeneration(_) => EnrollmentStage::KeyGeneration,
            Self::Transport { .. } | Self::Authentication { .. } | Self::CaRejected { .. } => {
                EnrollmentStage::CaRequest
            }
            Self::MalformedResponse(_) => EnrollmentStage::ResponseValidation,
            Self::StoreUnavailable { .. }
            | Self::StoreCorruption { .. }
            | Self::InvalidLabel { .. } => EnrollmentStage::StoreCheck,
            Self::DuplicateIdentity { .. } | Self::PartialEnrollment { .. } => {
                EnrollmentStage::StoreWrite
            }
            Self::Config(_) => EnrollmentStage::Setup,
        }
    }

    /// Shorthand for a [`EnrollError::StoreUnavailable`] error
    pub fn store_io(label: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreUnavailable {
            label: label.into(),
            source,
        }
    }

    /// Shorthand for a [`EnrollError::StoreCorruption`] error
    pub fn corrupt(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StoreCorruption {
            label: label.into(),
            reason: reason.into(),
        }
    }
}
