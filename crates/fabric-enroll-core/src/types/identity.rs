use serde::{Deserialize, Serialize};
use std::fmt;

use crate::x509::{self, CertificateSummary};
use crate::{EnrollError, Result};

/// Credential scheme of a stored identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKind {
    /// X.509 certificate plus PKCS#8 private key
    #[default]
    #[serde(rename = "X.509")]
    X509,
}

impl IdentityKind {
    /// Wire / on-disk tag for this kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X509 => "X.509",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enrolled participant credential.
///
/// `certificate` is the PEM encoded certificate issued by the CA and
/// `private_key` the PKCS#8 PEM encoded key it was issued for. The private
/// key is never printed by the `Debug` implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Key of this identity within a store
    pub label: String,
    /// CA-signed certificate (PEM)
    pub certificate: Vec<u8>,
    /// Private key matching the certificate (PKCS#8 PEM)
    pub private_key: Vec<u8>,
    /// Owning organization / MSP id
    pub issuer_id: String,
    /// Credential scheme
    pub kind: IdentityKind,
}

impl Identity {
    /// Create an X.509 identity
    pub fn x509(
        label: impl Into<String>,
        certificate: impl Into<Vec<u8>>,
        private_key: impl Into<Vec<u8>>,
        issuer_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            certificate: certificate.into(),
            private_key: private_key.into(),
            issuer_id: issuer_id.into(),
            kind: IdentityKind::X509,
        }
    }

    /// Return the same credential under a different label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Certificate as a PEM string
    pub fn certificate_pem(&self) -> Result<&str> {
        std::str::from_utf8(&self.certificate)
            .map_err(|_| EnrollError::corrupt(&self.label, "certificate is not valid UTF-8 PEM"))
    }

    /// Private key as a PEM string
    pub fn private_key_pem(&self) -> Result<&str> {
        std::str::from_utf8(&self.private_key)
            .map_err(|_| EnrollError::corrupt(&self.label, "private key is not valid UTF-8 PEM"))
    }

    /// Check that the certificate's public key belongs to the private key.
    ///
    /// A mismatch is reported as [`EnrollError::StoreCorruption`].
    pub fn verify_key_consistency(&self) -> Result<()> {
        x509::check_key_pair(&self.certificate, &self.private_key)
            .map_err(|reason| EnrollError::corrupt(&self.label, reason))
    }

    /// Parse the certificate and summarize it
    pub fn summary(&self) -> Result<CertificateSummary> {
        x509::summarize(&self.certificate).map_err(|reason| EnrollError::corrupt(&self.label, reason))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("label", &self.label)
            .field("issuer_id", &self.issuer_id)
            .field("kind", &self.kind)
            .field("certificate_len", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}
