//! CA information endpoint.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fabric_enroll_core::{EnrollError, Result, ServerInfo};
use serde::Serialize;

use crate::CaClient;

/// Decoded `cainfo` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaInfo {
    /// CA instance name
    pub ca_name: String,
    /// Fabric CA server version
    pub version: String,
    /// PEM chain of the CA (may be empty)
    #[serde(skip)]
    pub ca_chain: Vec<u8>,
}

/// CA information endpoints
pub struct InfoApi<'a> {
    client: &'a CaClient,
}

impl<'a> InfoApi<'a> {
    pub(crate) fn new(client: &'a CaClient) -> Self {
        Self { client }
    }

    /// Fetch information about the configured CA.
    ///
    /// Needs no credentials, so it can check connectivity without
    /// touching an enrollment secret.
    pub async fn get(&self) -> Result<CaInfo> {
        let ca_name = self.client.endpoint().ca_name();
        let server: ServerInfo = self
            .client
            .get("/api/v1/cainfo", &[("ca", ca_name)])
            .await?;

        let ca_chain = if server.ca_chain.is_empty() {
            Vec::new()
        } else {
            BASE64.decode(server.ca_chain.trim()).map_err(|e| {
                EnrollError::MalformedResponse(format!("CA chain is not base64: {e}"))
            })?
        };

        Ok(CaInfo {
            ca_name: server.ca_name,
            version: server.version,
            ca_chain,
        })
    }
}
