//! Client configuration types.

use std::time::Duration;

/// Key algorithm used for newly generated identities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// ECDSA with P-256 curve (Fabric default)
    #[default]
    EcdsaP256,
    /// ECDSA with P-384 curve
    EcdsaP384,
}

impl KeyAlgorithm {
    pub(crate) fn signature_algorithm(self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            Self::EcdsaP256 => &rcgen::PKCS_ECDSA_P256_SHA256,
            Self::EcdsaP384 => &rcgen::PKCS_ECDSA_P384_SHA384,
        }
    }
}

impl std::str::FromStr for KeyAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p256" | "p-256" | "ecdsa-p256" | "prime256v1" => Ok(Self::EcdsaP256),
            "p384" | "p-384" | "ecdsa-p384" | "secp384r1" => Ok(Self::EcdsaP384),
            other => Err(format!("unsupported key algorithm '{other}' (expected p256 or p384)")),
        }
    }
}

/// Timeouts for CA requests
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Bound on the whole request, including reading the response
    pub request: Duration,

    /// Bound on establishing the TCP/TLS connection
    pub connect: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutConfig {
    /// Create the default timeout configuration
    #[must_use]
    pub const fn new() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }

    /// Set the overall request timeout
    #[must_use]
    pub const fn request(mut self, duration: Duration) -> Self {
        self.request = duration;
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub const fn connect(mut self, duration: Duration) -> Self {
        self.connect = duration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_algorithm() {
        assert_eq!("P256".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::EcdsaP256);
        assert_eq!("secp384r1".parse::<KeyAlgorithm>().unwrap(), KeyAlgorithm::EcdsaP384);
        assert!("rsa2048".parse::<KeyAlgorithm>().is_err());
    }

    #[test]
    fn test_timeout_builder() {
        let config = TimeoutConfig::new().request(Duration::from_secs(5));
        assert_eq!(config.request, Duration::from_secs(5));
        assert_eq!(config.connect, Duration::from_secs(10));
    }
}
