//! X.509 helpers shared by the CA client and the wallet.
//!
//! Errors are returned as plain reason strings; callers decide whether a bad
//! certificate is a malformed CA response or a corrupt stored record.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

/// Human-facing summary of a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateSummary {
    /// Subject distinguished name
    pub subject: String,
    /// Subject common name, if present
    pub common_name: Option<String>,
    /// Issuer distinguished name
    pub issuer: String,
    /// Serial number (hex)
    pub serial: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
}

impl CertificateSummary {
    /// Returns true if the certificate is past its `not_after`
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.not_after
    }
}

/// Decode the first `CERTIFICATE` block of a PEM document into DER
pub fn certificate_der(pem_bytes: &[u8]) -> Result<Vec<u8>, String> {
    let blocks = pem::parse_many(pem_bytes).map_err(|e| format!("invalid PEM: {e}"))?;
    blocks
        .into_iter()
        .find(|block| block.tag() == "CERTIFICATE")
        .map(pem::Pem::into_contents)
        .ok_or_else(|| "no CERTIFICATE block in PEM".to_string())
}

fn with_certificate<T>(
    pem_bytes: &[u8],
    f: impl FnOnce(&X509Certificate<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let der = certificate_der(pem_bytes)?;
    let (rest, cert) =
        X509Certificate::from_der(&der).map_err(|e| format!("invalid X.509 certificate: {e}"))?;
    if !rest.is_empty() {
        return Err("trailing data after X.509 certificate".into());
    }
    f(&cert)
}

/// Parse a PEM certificate and summarize it
pub fn summarize(pem_bytes: &[u8]) -> Result<CertificateSummary, String> {
    with_certificate(pem_bytes, |cert| {
        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(String::from);

        Ok(CertificateSummary {
            subject: cert.subject().to_string(),
            common_name,
            issuer: cert.issuer().to_string(),
            serial: cert.raw_serial_as_string(),
            not_before: asn1_to_utc(cert.validity().not_before),
            not_after: asn1_to_utc(cert.validity().not_after),
        })
    })
}

/// Raw subject public key bytes of a PEM certificate
pub fn certificate_public_key(pem_bytes: &[u8]) -> Result<Vec<u8>, String> {
    with_certificate(pem_bytes, |cert| {
        Ok(cert.public_key().subject_public_key.data.to_vec())
    })
}

/// Check that `cert_pem` was issued for the private key in `key_pem`.
///
/// `key_pem` must be a PKCS#8 PEM private key.
pub fn check_key_pair(cert_pem: &[u8], key_pem: &[u8]) -> Result<(), String> {
    let cert_key = certificate_public_key(cert_pem)?;

    let key_str =
        std::str::from_utf8(key_pem).map_err(|_| "private key is not valid UTF-8 PEM".to_string())?;
    let key_pair =
        rcgen::KeyPair::from_pem(key_str).map_err(|e| format!("invalid private key: {e}"))?;

    if key_pair.public_key_raw() == cert_key.as_slice() {
        Ok(())
    } else {
        Err("certificate public key does not match the private key".into())
    }
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

    fn self_signed(cn: &str) -> (String, KeyPair) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![]).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        let cert = params.self_signed(&key).unwrap();
        (cert.pem(), key)
    }

    #[test]
    fn test_matching_pair() {
        let (cert, key) = self_signed("admin");
        assert!(check_key_pair(cert.as_bytes(), key.serialize_pem().as_bytes()).is_ok());
    }

    #[test]
    fn test_mismatched_pair() {
        let (cert, _) = self_signed("admin");
        let other = KeyPair::generate().unwrap();
        let err = check_key_pair(cert.as_bytes(), other.serialize_pem().as_bytes()).unwrap_err();
        assert!(err.contains("does not match"));
    }

    #[test]
    fn test_summary() {
        let (cert, _) = self_signed("admin");
        let summary = summarize(cert.as_bytes()).unwrap();
        assert_eq!(summary.common_name.as_deref(), Some("admin"));
        assert!(summary.subject.contains("CN=admin"));
        assert!(!summary.is_expired());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(summarize(b"not a certificate").is_err());
        let key = KeyPair::generate().unwrap();
        // A key is not a certificate
        assert!(certificate_der(key.serialize_pem().as_bytes()).is_err());
    }
}
