use url::Url;

use crate::{EnrollError, Result};

/// Connection details for a Fabric CA.
///
/// Immutable once built. Server certificate verification is on unless the
/// caller explicitly opts out with
/// [`CaEndpointBuilder::insecure_skip_verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaEndpoint {
    url: Url,
    ca_name: String,
    msp_id: Option<String>,
    trusted_root_certificates: Vec<Vec<u8>>,
    verify_server_certificate: bool,
}

impl CaEndpoint {
    /// Start building an endpoint for the CA at `url` serving `ca_name`
    #[must_use]
    pub fn builder(url: impl Into<String>, ca_name: impl Into<String>) -> CaEndpointBuilder {
        CaEndpointBuilder::new(url, ca_name)
    }

    /// Base URL of the CA
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Name of the CA instance on the server (`caname` on the wire)
    #[must_use]
    pub fn ca_name(&self) -> &str {
        &self.ca_name
    }

    /// MSP id configured for this CA, if any
    #[must_use]
    pub fn msp_id(&self) -> Option<&str> {
        self.msp_id.as_deref()
    }

    /// Issuer id recorded on identities enrolled through this endpoint.
    ///
    /// The configured MSP id, falling back to the CA name.
    #[must_use]
    pub fn issuer_id(&self) -> &str {
        self.msp_id.as_deref().unwrap_or(&self.ca_name)
    }

    /// PEM encoded roots the CA's TLS certificate must chain to
    #[must_use]
    pub fn trusted_root_certificates(&self) -> &[Vec<u8>] {
        &self.trusted_root_certificates
    }

    /// Whether the CA's TLS certificate is verified
    #[must_use]
    pub const fn verify_server_certificate(&self) -> bool {
        self.verify_server_certificate
    }

    /// Join an API path onto the base URL
    pub fn api_url(&self, path: &str) -> Result<Url> {
        let base = self.url.as_str().trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| EnrollError::Config(format!("invalid CA URL {joined}: {e}")))
    }
}

/// Builder for [`CaEndpoint`]
#[derive(Debug, Clone)]
pub struct CaEndpointBuilder {
    url: String,
    ca_name: String,
    msp_id: Option<String>,
    trusted_root_certificates: Vec<Vec<u8>>,
    verify_server_certificate: bool,
}

impl CaEndpointBuilder {
    fn new(url: impl Into<String>, ca_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ca_name: ca_name.into(),
            msp_id: None,
            trusted_root_certificates: Vec::new(),
            verify_server_certificate: true,
        }
    }

    /// Set the MSP id stored as the issuer of enrolled identities
    #[must_use]
    pub fn msp_id(mut self, msp_id: impl Into<String>) -> Self {
        self.msp_id = Some(msp_id.into());
        self
    }

    /// Add a PEM blob of trusted TLS root certificates
    #[must_use]
    pub fn trusted_root_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.trusted_root_certificates.push(pem.into());
        self
    }

    /// Disable verification of the CA's TLS certificate.
    ///
    /// Only for throwaway test networks. Anyone on the path can then
    /// impersonate the CA and capture the enrollment secret.
    #[must_use]
    pub const fn insecure_skip_verify(mut self) -> Self {
        self.verify_server_certificate = false;
        self
    }

    /// Validate and build the endpoint
    pub fn build(self) -> Result<CaEndpoint> {
        let url = Url::parse(&self.url)
            .map_err(|e| EnrollError::Config(format!("invalid CA URL '{}': {e}", self.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EnrollError::Config(format!(
                "unsupported CA URL scheme '{}'",
                url.scheme()
            )));
        }
        if self.ca_name.trim().is_empty() {
            return Err(EnrollError::Config("CA name must not be empty".into()));
        }
        for blob in &self.trusted_root_certificates {
            let parsed = pem::parse_many(blob)
                .map_err(|e| EnrollError::Config(format!("invalid trusted root PEM: {e}")))?;
            if !parsed.iter().any(|p| p.tag() == "CERTIFICATE") {
                return Err(EnrollError::Config(
                    "trusted root PEM contains no CERTIFICATE block".into(),
                ));
            }
        }

        Ok(CaEndpoint {
            url,
            ca_name: self.ca_name,
            msp_id: self.msp_id,
            trusted_root_certificates: self.trusted_root_certificates,
            verify_server_certificate: self.verify_server_certificate,
        })
    }
}
