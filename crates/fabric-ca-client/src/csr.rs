//! PKCS#10 certificate signing requests.

use fabric_enroll_core::{EnrollError, EnrollmentRequest, Result};
use rcgen::{CertificateParams, DistinguishedName, DnType};

use crate::keys::KeyMaterial;

/// A signing request together with the key it binds
#[derive(Debug)]
pub struct SigningRequest {
    pem: String,
    key: KeyMaterial,
}

impl SigningRequest {
    /// Build a CSR binding `key` to the request's subject.
    ///
    /// The common name is the enrollment id unless overridden; requested
    /// hosts become subject alternative names.
    pub fn build(request: &EnrollmentRequest, key: KeyMaterial) -> Result<Self> {
        let mut params = CertificateParams::new(request.hosts().to_vec())
            .map_err(|e| EnrollError::Config(format!("invalid CSR host: {e}")))?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, request.subject_common_name());
        params.distinguished_name = dn;

        let csr = params
            .serialize_request(key.key_pair())
            .map_err(|e| EnrollError::KeyGeneration(format!("failed to sign CSR: {e}")))?;
        let pem = csr
            .pem()
            .map_err(|e| EnrollError::KeyGeneration(format!("failed to encode CSR: {e}")))?;

        Ok(Self { pem, key })
    }

    /// PEM encoded request
    #[must_use]
    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// Key the request was signed with
    #[must_use]
    pub const fn key(&self) -> &KeyMaterial {
        &self.key
    }

    /// Give up the request and keep the key
    #[must_use]
    pub fn into_key(self) -> KeyMaterial {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyGenerator;

    #[test]
    fn test_build_csr() {
        let request = EnrollmentRequest::new("admin", "adminpw").host("peer0.org1.example.com");
        let key = KeyGenerator::default().generate().unwrap();
        let csr = SigningRequest::build(&request, key).unwrap();

        assert!(csr.pem().starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
        assert!(csr.key().private_key_pem().contains("PRIVATE KEY"));
    }

    #[test]
    fn test_invalid_host_is_a_setup_error() {
        let request = EnrollmentRequest::new("admin", "adminpw").host("h\u{f4}st.example.com");
        let key = KeyGenerator::default().generate().unwrap();

        let err = SigningRequest::build(&request, key).unwrap_err();
        assert!(matches!(err, EnrollError::Config(ref msg) if msg.contains("invalid CSR host")));
        assert_eq!(err.stage(), fabric_enroll_core::EnrollmentStage::Setup);
        assert!(!err.is_fatal_for_secret());
    }
}
