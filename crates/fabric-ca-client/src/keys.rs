//! Key material generation for new identities.

use fabric_enroll_core::{EnrollError, Result};
use rcgen::KeyPair;

use crate::config::KeyAlgorithm;

/// A freshly generated key pair
pub struct KeyMaterial {
    key_pair: KeyPair,
    algorithm: KeyAlgorithm,
}

impl KeyMaterial {
    /// Algorithm the pair was generated for
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// SubjectPublicKeyInfo DER of the public half
    #[must_use]
    pub fn public_key_der(&self) -> Vec<u8> {
        self.key_pair.public_key_der()
    }

    /// PKCS#8 PEM of the private half
    #[must_use]
    pub fn private_key_pem(&self) -> String {
        self.key_pair.serialize_pem()
    }

    pub(crate) const fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Produces key pairs for the configured algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator {
    algorithm: KeyAlgorithm,
}

impl KeyGenerator {
    /// Create a generator for `algorithm`
    #[must_use]
    pub const fn new(algorithm: KeyAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Generate a fresh key pair from the system randomness source
    pub fn generate(&self) -> Result<KeyMaterial> {
        let key_pair = KeyPair::generate_for(self.algorithm.signature_algorithm())
            .map_err(|e| EnrollError::KeyGeneration(e.to_string()))?;

        Ok(KeyMaterial {
            key_pair,
            algorithm: self.algorithm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct_keys() {
        let generator = KeyGenerator::default();
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();

        assert_ne!(a.public_key_der(), b.public_key_der());
        assert!(a.private_key_pem().contains("PRIVATE KEY"));
        assert_eq!(a.algorithm(), KeyAlgorithm::EcdsaP256);
    }

    #[test]
    fn test_generate_p384() {
        let generator = KeyGenerator::new(KeyAlgorithm::EcdsaP384);
        let key = generator.generate().unwrap();
        assert_eq!(key.algorithm(), KeyAlgorithm::EcdsaP384);
        // P-384 SPKI is longer than P-256 SPKI (91 bytes)
        assert!(key.public_key_der().len() > 91);
    }

    #[test]
    fn test_debug_hides_key() {
        let key = KeyGenerator::default().generate().unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("PRIVATE"));
    }
}
