use serde::{Deserialize, Serialize};

use super::AttributeRequest;

/// Envelope wrapping every Fabric CA REST response
#[derive(Debug, Clone, Deserialize)]
pub struct CaResponse<T> {
    /// Whether the CA processed the request
    #[serde(default)]
    pub success: bool,

    /// Payload, present on success
    pub result: Option<T>,

    /// Errors reported by the CA
    #[serde(default)]
    pub errors: Vec<CaMessage>,

    /// Informational messages
    #[serde(default)]
    pub messages: Vec<CaMessage>,
}

impl<T> CaResponse<T> {
    /// First error reported by the CA, if any
    #[must_use]
    pub fn first_error(&self) -> Option<&CaMessage> {
        self.errors.first()
    }
}

/// Error or info message inside a [`CaResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaMessage {
    /// Fabric CA error code
    #[serde(default)]
    pub code: i64,

    /// Human readable message
    #[serde(default)]
    pub message: String,
}

impl CaMessage {
    /// Fabric CA code for a rejected enrollment id / secret
    pub const AUTHENTICATION_FAILURE: i64 = 20;

    /// Returns true if the CA reported an authentication failure
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        self.code == Self::AUTHENTICATION_FAILURE
    }
}

/// Body of `POST /api/v1/enroll`
#[derive(Debug, Clone, Serialize)]
pub struct EnrollRequestBody {
    /// PKCS#10 request in PEM form
    pub certificate_request: String,

    /// Target CA instance
    pub caname: String,

    /// Subject alternative names requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    /// Signing profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Attribute requests
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attr_reqs: Vec<AttributeRequest>,
}

/// `result` of a successful enrollment
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollResult {
    /// Base64 encoded PEM certificate
    #[serde(rename = "Cert")]
    pub cert: String,

    /// Information about the issuing CA
    #[serde(rename = "ServerInfo", default)]
    pub server_info: Option<ServerInfo>,
}

/// CA description returned by `enroll` and `cainfo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// CA instance name
    #[serde(rename = "CAName", default)]
    pub ca_name: String,

    /// Base64 encoded PEM chain of the CA
    #[serde(rename = "CAChain", default)]
    pub ca_chain: String,

    /// Fabric CA server version
    #[serde(rename = "Version", default)]
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_envelope() {
        let body = r#"{"success":false,"result":null,"errors":[{"code":20,"message":"Authentication failure"}],"messages":[]}"#;
        let response: CaResponse<EnrollResult> = serde_json::from_str(body).unwrap();
        assert!(!response.success);
        assert!(response.result.is_none());
        assert!(response.first_error().unwrap().is_authentication_failure());
    }

    #[test]
    fn test_parse_enroll_result() {
        let body = r#"{
            "success": true,
            "result": {
                "Cert": "LS0tLS1CRUdJTg==",
                "ServerInfo": {"CAName": "ca-org1", "CAChain": "", "Version": "1.5.7",
                               "IssuerPublicKey": "", "IssuerRevocationPublicKey": ""}
            },
            "errors": [],
            "messages": []
        }"#;
        let response: CaResponse<EnrollResult> = serde_json::from_str(body).unwrap();
        let result = response.result.unwrap();
        assert_eq!(result.cert, "LS0tLS1CRUdJTg==");
        assert_eq!(result.server_info.unwrap().ca_name, "ca-org1");
    }

    #[test]
    fn test_request_body_omits_empty_options() {
        let body = EnrollRequestBody {
            certificate_request: "CSR".into(),
            caname: "ca-org1".into(),
            hosts: Vec::new(),
            profile: None,
            attr_reqs: Vec::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"certificate_request": "CSR", "caname": "ca-org1"}));
    }
}
