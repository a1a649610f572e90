//! Enrollment API endpoints.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fabric_enroll_core::{
    x509, EnrollError, EnrollRequestBody, EnrollResult, EnrollmentRequest, Identity, Result,
};
use tracing::{debug, info, warn};

use crate::csr::SigningRequest;
use crate::CaClient;

const ENROLL_PATH: &str = "/api/v1/enroll";

/// Enrollment API endpoints
pub struct EnrollmentApi<'a> {
    client: &'a CaClient,
}

impl<'a> EnrollmentApi<'a> {
    pub(crate) fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Enroll `request.enrollment_id()` and return the issued identity.
    ///
    /// A fresh key pair is generated for every call; only the CSR leaves
    /// the process. The returned certificate must carry that key's public
    /// half, otherwise the response is treated as malformed.
    pub async fn enroll(&self, request: &EnrollmentRequest) -> Result<Identity> {
        let endpoint = self.client.endpoint();

        let key = self.client.key_generator().generate()?;
        let csr = SigningRequest::build(request, key)?;

        let body = EnrollRequestBody {
            certificate_request: csr.pem().to_string(),
            caname: endpoint.ca_name().to_string(),
            hosts: request.hosts().to_vec(),
            profile: request.signing_profile().map(String::from),
            attr_reqs: request.attribute_requests().to_vec(),
        };

        debug!(
            enrollment_id = request.enrollment_id(),
            ca_name = endpoint.ca_name(),
            "submitting enrollment request"
        );

        let result: EnrollResult = self
            .client
            .post_authenticated(
                ENROLL_PATH,
                &body,
                request.enrollment_id(),
                request.enrollment_secret(),
            )
            .await?;

        if let Some(server) = &result.server_info {
            if !server.ca_name.is_empty() && server.ca_name != endpoint.ca_name() {
                warn!(
                    expected = endpoint.ca_name(),
                    actual = %server.ca_name,
                    "certificate issued by a different CA instance than requested"
                );
            }
        }

        let certificate = decode_certificate(&result.cert)?;
        let private_key = csr.into_key().private_key_pem();

        x509::check_key_pair(&certificate, private_key.as_bytes()).map_err(|reason| {
            EnrollError::MalformedResponse(format!(
                "issued certificate does not match the submitted key: {reason}"
            ))
        })?;

        info!(
            enrollment_id = request.enrollment_id(),
            issuer_id = endpoint.issuer_id(),
            "CA issued certificate"
        );

        Ok(Identity::x509(
            request.enrollment_id(),
            certificate,
            private_key.into_bytes(),
            endpoint.issuer_id(),
        ))
    }
}

/// Decode the base64 `Cert` field into PEM bytes
fn decode_certificate(encoded: &str) -> Result<Vec<u8>> {
    let pem = BASE64
        .decode(encoded.trim())
        .map_err(|e| EnrollError::MalformedResponse(format!("certificate is not base64: {e}")))?;

    x509::summarize(&pem)
        .map_err(|reason| EnrollError::MalformedResponse(format!("certificate: {reason}")))?;

    Ok(pem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{failure_body, MockCa, MOCK_MSP_ID};
    use fabric_enroll_core::IdentityKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_enroll_issues_matching_identity() {
        let ca = MockCa::start("admin", "adminpw").await;
        ca.mount_enroll(1).await;

        let client = CaClient::new(ca.endpoint()).unwrap();
        let identity = client
            .enroll(&EnrollmentRequest::new("admin", "adminpw"))
            .await
            .unwrap();

        assert_eq!(identity.label, "admin");
        assert_eq!(identity.issuer_id, MOCK_MSP_ID);
        assert_eq!(identity.kind, IdentityKind::X509);
        identity.verify_key_consistency().unwrap();

        let summary = identity.summary().unwrap();
        assert_eq!(summary.common_name.as_deref(), Some("admin"));
        assert!(summary.issuer.contains("ca.org1.example.com"));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_authentication_error() {
        let ca = MockCa::start("admin", "adminpw").await;
        ca.mount_enroll(1).await;

        let client = CaClient::new(ca.endpoint()).unwrap();
        let err = client
            .enroll(&EnrollmentRequest::new("admin", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EnrollError::Authentication { ref enrollment_id, ref message }
                if enrollment_id == "admin" && message == "Authentication failure"
        ));
        assert!(err.is_fatal_for_secret());
    }

    #[tokio::test]
    async fn test_certificate_for_other_key_is_malformed() {
        let ca = MockCa::start("admin", "adminpw").await;
        ca.mount_enroll_wrong_key().await;

        let client = CaClient::new(ca.endpoint()).unwrap();
        let err = client
            .enroll(&EnrollmentRequest::new("admin", "adminpw"))
            .await
            .unwrap_err();

        assert!(matches!(err, EnrollError::MalformedResponse(ref m) if m.contains("does not match")));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let ca = MockCa::start("admin", "adminpw").await;
        Mock::given(method("POST"))
            .and(path("/api/v1/enroll"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(ca.server())
            .await;

        let client = CaClient::new(ca.endpoint()).unwrap();
        let err = client
            .enroll(&EnrollmentRequest::new("admin", "adminpw"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_other_ca_errors_are_rejections() {
        let ca = MockCa::start("admin", "adminpw").await;
        Mock::given(method("POST"))
            .and(path("/api/v1/enroll"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(failure_body(71, "Max enrollments reached")),
            )
            .mount(ca.server())
            .await;

        let client = CaClient::new(ca.endpoint()).unwrap();
        let err = client
            .enroll(&EnrollmentRequest::new("admin", "adminpw"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EnrollError::CaRejected { status: 500, code: Some(71), .. }
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let ca = MockCa::start("admin", "adminpw").await;
        ca.mount_enroll_delayed(Duration::from_secs(2), 1).await;

        let client = CaClient::builder(ca.endpoint())
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let err = client
            .enroll(&EnrollmentRequest::new("admin", "adminpw"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollError::Transport { timed_out: true, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_ca_is_transport_error() {
        // Reserve a port, then free it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let endpoint =
            fabric_enroll_core::CaEndpoint::builder(format!("http://127.0.0.1:{port}"), "ca-org1")
                .build()
                .unwrap();
        let client = CaClient::new(endpoint).unwrap();
        let err = client
            .enroll(&EnrollmentRequest::new("admin", "adminpw"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollError::Transport { timed_out: false, .. }));
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        assert!(matches!(
            decode_certificate("%%%"),
            Err(EnrollError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_certificate() {
        let encoded = BASE64.encode("hello");
        assert!(matches!(
            decode_certificate(&encoded),
            Err(EnrollError::MalformedResponse(_))
        ));
    }
}
