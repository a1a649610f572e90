//! Main Fabric CA client implementation.

use crate::api::{CaInfo, EnrollmentApi, InfoApi};
use crate::config::{KeyAlgorithm, TimeoutConfig};
use crate::keys::KeyGenerator;
use fabric_enroll_core::{
    CaEndpoint, CaMessage, CaResponse, EnrollError, EnrollmentRequest, Identity, Result,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest CA error body echoed back in an error message
const MAX_ERROR_BODY: usize = 256;

/// Client for one Fabric CA endpoint
#[derive(Clone)]
pub struct CaClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    endpoint: CaEndpoint,
    keys: KeyGenerator,
}

impl CaClient {
    /// Create a client for `endpoint` using default settings
    pub fn new(endpoint: CaEndpoint) -> Result<Self> {
        CaClientBuilder::new(endpoint).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(endpoint: CaEndpoint) -> CaClientBuilder {
        CaClientBuilder::new(endpoint)
    }

    /// Endpoint this client talks to
    #[must_use]
    pub fn endpoint(&self) -> &CaEndpoint {
        &self.inner.endpoint
    }

    /// Access enrollment endpoints
    #[must_use]
    pub fn enrollment(&self) -> EnrollmentApi<'_> {
        EnrollmentApi::new(self)
    }

    /// Access CA information endpoints
    #[must_use]
    pub fn info(&self) -> InfoApi<'_> {
        InfoApi::new(self)
    }

    /// Enroll with the CA and return the issued identity.
    ///
    /// The identity is labelled with the enrollment id. Nothing is retried:
    /// a second attempt may spend the secret twice.
    pub async fn enroll(&self, request: &EnrollmentRequest) -> Result<Identity> {
        self.enrollment().enroll(request).await
    }

    /// Fetch the CA's name, version and certificate chain
    pub async fn ca_info(&self) -> Result<CaInfo> {
        self.info().get().await
    }

    pub(crate) fn key_generator(&self) -> KeyGenerator {
        self.inner.keys
    }

    /// Perform a GET request and unwrap the CA response envelope
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut url = self.inner.endpoint.api_url(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        debug!(url = %url, "GET request");

        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        self.handle_response(response, "anonymous").await
    }

    /// Perform a POST request with a JSON body and HTTP Basic credentials
    pub(crate) async fn post_authenticated<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
        user: &str,
        secret: &str,
    ) -> Result<T> {
        let url = self.inner.endpoint.api_url(path)?;
        debug!(url = %url, user, "POST request");

        let response = self
            .inner
            .http
            .post(url)
            .basic_auth(user, Some(secret))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        self.handle_response(response, user).await
    }

    fn transport_error(&self, error: &reqwest::Error) -> EnrollError {
        EnrollError::Transport {
            url: self.inner.endpoint.url().to_string(),
            message: error.to_string(),
            timed_out: error.is_timeout(),
        }
    }

    /// Unwrap a CA response envelope or turn it into an error
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        principal: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            let first = serde_json::from_str::<CaResponse<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.errors.into_iter().next());
            return Err(rejection(status.as_u16(), first.as_ref(), principal, &body));
        }

        let envelope: CaResponse<T> = serde_json::from_str(&body)
            .map_err(|e| EnrollError::MalformedResponse(format!("invalid response envelope: {e}")))?;

        if !envelope.success {
            return Err(rejection(
                status.as_u16(),
                envelope.first_error(),
                principal,
                &body,
            ));
        }

        envelope.result.ok_or_else(|| {
            EnrollError::MalformedResponse("CA reported success without a result".into())
        })
    }
}

/// Convert a CA failure into an error
fn rejection(status: u16, error: Option<&CaMessage>, principal: &str, body: &str) -> EnrollError {
    let message = error.map_or_else(|| truncate(body.trim()), |e| e.message.clone());

    let authentication = matches!(status, 401 | 403)
        || error.is_some_and(CaMessage::is_authentication_failure);

    if authentication {
        warn!(enrollment_id = principal, status, "CA rejected enrollment credentials");
        EnrollError::Authentication {
            enrollment_id: principal.to_string(),
            message,
        }
    } else {
        warn!(status, message = %message, "CA rejected request");
        EnrollError::CaRejected {
            status,
            code: error.map(|e| e.code),
            message,
        }
    }
}

fn truncate(body: &str) -> String {
    if body.is_empty() {
        return "no error detail".to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Builder for configuring a [`CaClient`]
pub struct CaClientBuilder {
    endpoint: CaEndpoint,
    timeouts: TimeoutConfig,
    user_agent: String,
    key_algorithm: KeyAlgorithm,
}

impl CaClientBuilder {
    /// Create a new builder for `endpoint`
    #[must_use]
    pub fn new(endpoint: CaEndpoint) -> Self {
        Self {
            endpoint,
            timeouts: TimeoutConfig::default(),
            user_agent: format!("fabric-enroll/{}", env!("CARGO_PKG_VERSION")),
            key_algorithm: KeyAlgorithm::default(),
        }
    }

    /// Set the overall request timeout; a timed out enrollment is a transport error
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request = timeout;
        self
    }

    /// Set all timeouts
    #[must_use]
    pub const fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the algorithm for generated identity keys
    #[must_use]
    pub const fn key_algorithm(mut self, algorithm: KeyAlgorithm) -> Self {
        self.key_algorithm = algorithm;
        self
    }

    /// Build the client.
    ///
    /// When the endpoint lists trusted roots, only those roots are trusted.
    pub fn build(self) -> Result<CaClient> {
        let mut http = HttpClient::builder()
            .timeout(self.timeouts.request)
            .connect_timeout(self.timeouts.connect)
            .user_agent(&self.user_agent)
            .gzip(true);

        let roots = self.endpoint.trusted_root_certificates();
        if !roots.is_empty() {
            http = http.tls_built_in_root_certs(false);
            for blob in roots {
                let certs = reqwest::Certificate::from_pem_bundle(blob)
                    .map_err(|e| EnrollError::Config(format!("invalid trusted root: {e}")))?;
                for cert in certs {
                    http = http.add_root_certificate(cert);
                }
            }
        }

        if !self.endpoint.verify_server_certificate() {
            warn!(
                url = %self.endpoint.url(),
                "TLS certificate verification is DISABLED for this CA; the enrollment secret can be intercepted"
            );
            http = http.danger_accept_invalid_certs(true);
        }

        let http = http
            .build()
            .map_err(|e| EnrollError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(CaClient {
            inner: Arc::new(ClientInner {
                http,
                endpoint: self.endpoint,
                keys: KeyGenerator::new(self.key_algorithm),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        let auth = CaMessage {
            code: CaMessage::AUTHENTICATION_FAILURE,
            message: "Authentication failure".into(),
        };
        assert!(matches!(
            rejection(401, Some(&auth), "admin", ""),
            EnrollError::Authentication { ref enrollment_id, .. } if enrollment_id == "admin"
        ));
        // The code alone is enough, whatever the HTTP status
        assert!(matches!(
            rejection(500, Some(&auth), "admin", ""),
            EnrollError::Authentication { .. }
        ));

        let other = CaMessage {
            code: 63,
            message: "Failed to get user".into(),
        };
        assert!(matches!(
            rejection(500, Some(&other), "admin", ""),
            EnrollError::CaRejected { status: 500, code: Some(63), .. }
        ));
        assert!(matches!(
            rejection(403, None, "admin", "forbidden"),
            EnrollError::Authentication { ref message, .. } if message == "forbidden"
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(""), "no error detail");
        let long = "x".repeat(MAX_ERROR_BODY * 2);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY + 3);
    }

    #[test]
    fn test_build_with_roots_and_insecure() {
        let key = rcgen::KeyPair::generate().unwrap();
        let root = rcgen::CertificateParams::new(vec!["ca.org1.example.com".to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap();

        let endpoint = CaEndpoint::builder("https://localhost:7054", "ca-org1")
            .trusted_root_pem(root.pem().into_bytes())
            .insecure_skip_verify()
            .build()
            .unwrap();
        let client = CaClient::builder(endpoint)
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(client.endpoint().ca_name(), "ca-org1");
    }

    #[test]
    fn test_key_generator_follows_builder() {
        let endpoint = CaEndpoint::builder("https://localhost:7054", "ca-org1")
            .build()
            .unwrap();
        let client = CaClient::builder(endpoint)
            .timeouts(TimeoutConfig::new().connect(Duration::from_secs(2)))
            .key_algorithm(KeyAlgorithm::EcdsaP384)
            .build()
            .unwrap();

        let key = client.key_generator().generate().unwrap();
        assert_eq!(key.algorithm(), KeyAlgorithm::EcdsaP384);
        // Clones share one inner client
        let clone = client.clone();
        assert_eq!(
            clone.key_generator().generate().unwrap().algorithm(),
            KeyAlgorithm::EcdsaP384
        );
    }
}
