//! In-process mock Fabric CA for tests.
//!
//! [`MockCa`] runs a `wiremock` server that signs real CSRs with a throwaway
//! CA key, so the full enrollment path (key generation, CSR, HTTP, response
//! validation) runs without a Fabric CA container. It is feature-gated behind
//! `testutil` to keep it out of production builds.
//!
//! ```toml
//! [dev-dependencies]
//! fabric-ca-client = { workspace = true, features = ["testutil"] }
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fabric_enroll_core::CaEndpoint;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CertificateSigningRequestParams,
    DistinguishedName, DnType, IsCa, KeyPair,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// CA name served by [`MockCa`]
pub const MOCK_CA_NAME: &str = "ca-org1";

/// MSP id used by [`MockCa::endpoint`]
pub const MOCK_MSP_ID: &str = "Org1MSP";

/// Key and certificate the mock CA signs with
pub struct CaSigner {
    key: KeyPair,
    cert: Certificate,
}

impl CaSigner {
    /// Generate a self-signed CA
    pub fn generate() -> Self {
        let key = KeyPair::generate().expect("CA key generation");
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "ca.org1.example.com");
        dn.push(DnType::OrganizationName, "org1.example.com");
        params.distinguished_name = dn;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).expect("CA self-signature");
        Self { key, cert }
    }

    /// PEM of the CA certificate
    pub fn certificate_pem(&self) -> String {
        self.cert.pem()
    }

    /// Sign a PEM CSR, returning the issued certificate PEM
    pub fn sign(&self, csr_pem: &str) -> Result<String, String> {
        let csr = CertificateSigningRequestParams::from_pem(csr_pem).map_err(|e| e.to_string())?;
        let cert = csr
            .signed_by(&self.cert, &self.key)
            .map_err(|e| e.to_string())?;
        Ok(cert.pem())
    }

    /// Issue a certificate for an unrelated key, ignoring the CSR's key
    pub fn sign_unrelated(&self) -> String {
        let other = KeyPair::generate().expect("key generation");
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("params");
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "someone-else");
        params.distinguished_name = dn;
        params
            .signed_by(&other, &self.cert, &self.key)
            .expect("signature")
            .pem()
    }
}

/// Fabric CA success envelope around `result`
pub fn success_body(result: &serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "result": result, "errors": [], "messages": [] })
}

/// Fabric CA failure envelope
pub fn failure_body(code: i64, message: &str) -> serde_json::Value {
    json!({
        "success": false,
        "result": null,
        "errors": [{ "code": code, "message": message }],
        "messages": []
    })
}

#[derive(Clone, Copy)]
enum Behavior {
    Sign,
    WrongKey,
}

/// Responder for `POST /api/v1/enroll` that checks Basic credentials and signs the CSR
pub struct EnrollResponder {
    signer: Arc<CaSigner>,
    authorization: String,
    delay: Option<Duration>,
    behavior: Behavior,
}

impl EnrollResponder {
    fn template(&self, status: u16) -> ResponseTemplate {
        let template = ResponseTemplate::new(status);
        match self.delay {
            Some(delay) => template.set_delay(delay),
            None => template,
        }
    }
}

impl Respond for EnrollResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let authorized = request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == self.authorization);
        if !authorized {
            return self
                .template(401)
                .set_body_json(failure_body(20, "Authentication failure"));
        }

        let body: serde_json::Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(e) => return self.template(400).set_body_json(failure_body(0, &e.to_string())),
        };
        let Some(csr) = body["certificate_request"].as_str() else {
            return self
                .template(400)
                .set_body_json(failure_body(0, "missing certificate_request"));
        };

        let issued = match self.behavior {
            Behavior::Sign => match self.signer.sign(csr) {
                Ok(pem) => pem,
                Err(e) => return self.template(400).set_body_json(failure_body(0, &e)),
            },
            Behavior::WrongKey => self.signer.sign_unrelated(),
        };

        let result = json!({
            "Cert": BASE64.encode(issued),
            "ServerInfo": {
                "CAName": body["caname"].as_str().unwrap_or(MOCK_CA_NAME),
                "CAChain": BASE64.encode(self.signer.certificate_pem()),
                "Version": "1.5.7"
            }
        });
        self.template(201).set_body_json(success_body(&result))
    }
}

/// A running mock CA
pub struct MockCa {
    server: MockServer,
    signer: Arc<CaSigner>,
    enrollment_id: String,
    enrollment_secret: String,
}

impl MockCa {
    /// Start a mock CA accepting `enrollment_id` / `enrollment_secret`
    pub async fn start(enrollment_id: &str, enrollment_secret: &str) -> Self {
        Self {
            server: MockServer::start().await,
            signer: Arc::new(CaSigner::generate()),
            enrollment_id: enrollment_id.to_string(),
            enrollment_secret: enrollment_secret.to_string(),
        }
    }

    /// The underlying server, for custom mocks
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// Base URL of the mock CA
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// PEM of the mock CA's signing certificate
    pub fn ca_certificate_pem(&self) -> String {
        self.signer.certificate_pem()
    }

    /// Endpoint pointing at this CA with [`MOCK_MSP_ID`] as issuer
    pub fn endpoint(&self) -> CaEndpoint {
        CaEndpoint::builder(self.uri(), MOCK_CA_NAME)
            .msp_id(MOCK_MSP_ID)
            .build()
            .expect("mock endpoint")
    }

    fn responder(&self, behavior: Behavior, delay: Option<Duration>) -> EnrollResponder {
        let credentials = format!("{}:{}", self.enrollment_id, self.enrollment_secret);
        EnrollResponder {
            signer: Arc::clone(&self.signer),
            authorization: format!("Basic {}", BASE64.encode(credentials)),
            delay,
            behavior,
        }
    }

    /// Serve enrollments, expecting exactly `expected` requests
    pub async fn mount_enroll(&self, expected: u64) {
        self.mount(Behavior::Sign, None, expected).await;
    }

    /// Serve enrollments after `delay`, expecting exactly `expected` requests
    pub async fn mount_enroll_delayed(&self, delay: Duration, expected: u64) {
        self.mount(Behavior::Sign, Some(delay), expected).await;
    }

    /// Answer enrollments with a certificate for a key the client never generated
    pub async fn mount_enroll_wrong_key(&self) {
        self.mount(Behavior::WrongKey, None, 1).await;
    }

    /// Serve `cainfo`
    pub async fn mount_cainfo(&self) {
        let result = json!({
            "CAName": MOCK_CA_NAME,
            "CAChain": BASE64.encode(self.signer.certificate_pem()),
            "Version": "1.5.7"
        });
        Mock::given(method("GET"))
            .and(path("/api/v1/cainfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&result)))
            .mount(&self.server)
            .await;
    }

    async fn mount(&self, behavior: Behavior, delay: Option<Duration>, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/api/v1/enroll"))
            .respond_with(self.responder(behavior, delay))
            .expect(expected)
            .mount(&self.server)
            .await;
    }
}
