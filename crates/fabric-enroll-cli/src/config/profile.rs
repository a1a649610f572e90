//! Fabric connection profiles (`connection-org1.json`).
//!
//! Only the parts needed to reach a CA are read: the CA entry under
//! `certificateAuthorities` and the MSP id of the client organization.

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// CA settings extracted from a connection profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCa {
    /// CA base URL
    pub url: String,
    /// CA instance name
    pub ca_name: String,
    /// Trusted TLS roots (PEM)
    pub tls_ca_pems: Vec<Vec<u8>>,
    /// MSP id of the owning organization, if the profile names one
    pub msp_id: Option<String>,
}

/// Parsed connection profile
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    #[serde(default)]
    client: Option<ClientSection>,
    #[serde(default)]
    organizations: BTreeMap<String, Organization>,
    #[serde(default)]
    certificate_authorities: BTreeMap<String, CertificateAuthority>,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    organization: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Organization {
    mspid: Option<String>,
    #[serde(default)]
    certificate_authorities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CertificateAuthority {
    url: String,
    ca_name: Option<String>,
    #[serde(default, rename = "tlsCACerts")]
    tls_ca_certs: Option<TlsCaCerts>,
}

#[derive(Debug, Deserialize)]
struct TlsCaCerts {
    pem: Option<PemList>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PemList {
    One(String),
    Many(Vec<String>),
}

impl ConnectionProfile {
    /// Read a JSON connection profile from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read connection profile {}", path.display()))?;
        let mut profile = Self::from_json(&content)
            .with_context(|| format!("Invalid connection profile {}", path.display()))?;
        profile.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(profile)
    }

    /// Parse a JSON connection profile
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Keys of the CAs listed in the profile
    pub fn ca_keys(&self) -> impl Iterator<Item = &str> {
        self.certificate_authorities.keys().map(String::as_str)
    }

    /// Resolve the CA under `key`, or the only CA when `key` is `None`
    pub fn ca(&self, key: Option<&str>) -> Result<ProfileCa> {
        let (key, entry) = match key {
            Some(key) => match self.certificate_authorities.get_key_value(key) {
                Some(found) => found,
                None => bail!(
                    "CA '{}' not found in connection profile (available: {})",
                    key,
                    self.available()
                ),
            },
            None => {
                let mut entries = self.certificate_authorities.iter();
                match (entries.next(), entries.next()) {
                    (Some(only), None) => only,
                    (None, _) => bail!("Connection profile lists no certificate authorities"),
                    (Some(_), Some(_)) => bail!(
                        "Connection profile lists several CAs; pick one with --ca-key (available: {})",
                        self.available()
                    ),
                }
            }
        };

        let mut tls_ca_pems = Vec::new();
        if let Some(certs) = &entry.tls_ca_certs {
            match &certs.pem {
                Some(PemList::One(pem)) => tls_ca_pems.push(pem.clone().into_bytes()),
                Some(PemList::Many(pems)) => {
                    tls_ca_pems.extend(pems.iter().map(|pem| pem.clone().into_bytes()));
                }
                None => {}
            }
            if let Some(path) = &certs.path {
                let path = self.base_dir.join(path);
                let pem = std::fs::read(&path)
                    .with_context(|| format!("Failed to read TLS CA certificate {}", path.display()))?;
                tls_ca_pems.push(pem);
            }
        }

        Ok(ProfileCa {
            url: entry.url.clone(),
            ca_name: entry.ca_name.clone().unwrap_or_else(|| key.clone()),
            tls_ca_pems,
            msp_id: self.msp_id_for(key),
        })
    }

    /// MSP id of the client organization, else of the organization owning `ca_key`
    fn msp_id_for(&self, ca_key: &str) -> Option<String> {
        let client_org = self
            .client
            .as_ref()
            .and_then(|client| client.organization.as_deref())
            .and_then(|org| self.organizations.get(org));

        client_org
            .or_else(|| {
                self.organizations
                    .values()
                    .find(|org| org.certificate_authorities.iter().any(|ca| ca == ca_key))
            })
            .and_then(|org| org.mspid.clone())
    }

    fn available(&self) -> String {
        self.ca_keys().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORG1_PROFILE: &str = r#"{
        "name": "test-network-org1",
        "version": "1.0.0",
        "client": { "organization": "Org1" },
        "organizations": {
            "Org1": {
                "mspid": "Org1MSP",
                "peers": ["peer0.org1.example.com"],
                "certificateAuthorities": ["ca.org1.example.com"]
            }
        },
        "certificateAuthorities": {
            "ca.org1.example.com": {
                "url": "https://localhost:7054",
                "caName": "ca-org1",
                "tlsCACerts": { "pem": "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n" },
                "httpOptions": { "verify": false }
            }
        }
    }"#;

    #[test]
    fn test_test_network_profile() {
        let profile = ConnectionProfile::from_json(ORG1_PROFILE).unwrap();
        let ca = profile.ca(None).unwrap();

        assert_eq!(ca.url, "https://localhost:7054");
        assert_eq!(ca.ca_name, "ca-org1");
        assert_eq!(ca.msp_id.as_deref(), Some("Org1MSP"));
        assert_eq!(ca.tls_ca_pems.len(), 1);
        assert_eq!(profile.ca(Some("ca.org1.example.com")).unwrap(), ca);
    }

    #[test]
    fn test_unknown_key_lists_available() {
        let profile = ConnectionProfile::from_json(ORG1_PROFILE).unwrap();
        let err = profile.ca(Some("ca.org2.example.com")).unwrap_err();
        assert!(err.to_string().contains("ca.org1.example.com"));
    }

    #[test]
    fn test_several_cas_need_a_key() {
        let profile = ConnectionProfile::from_json(
            r#"{
                "organizations": {
                    "Org2": { "mspid": "Org2MSP", "certificateAuthorities": ["ca2"] }
                },
                "certificateAuthorities": {
                    "ca1": { "url": "https://ca1:7054" },
                    "ca2": { "url": "https://ca2:8054", "tlsCACerts": { "pem": ["a", "b"] } }
                }
            }"#,
        )
        .unwrap();

        assert!(profile.ca(None).is_err());

        let ca2 = profile.ca(Some("ca2")).unwrap();
        // No caName: the key is used, and the owning organization supplies the MSP id
        assert_eq!(ca2.ca_name, "ca2");
        assert_eq!(ca2.msp_id.as_deref(), Some("Org2MSP"));
        assert_eq!(ca2.tls_ca_pems, vec![b"a".to_vec(), b"b".to_vec()]);

        assert_eq!(profile.ca(Some("ca1")).unwrap().msp_id, None);
    }

    #[test]
    fn test_pem_path_is_relative_to_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ca-cert.pem"), b"PEM").unwrap();
        let profile_path = dir.path().join("connection.json");
        std::fs::write(
            &profile_path,
            r#"{"certificateAuthorities": {"ca": {"url": "https://ca:7054", "tlsCACerts": {"path": "ca-cert.pem"}}}}"#,
        )
        .unwrap();

        let ca = ConnectionProfile::load(&profile_path).unwrap().ca(None).unwrap();
        assert_eq!(ca.tls_ca_pems, vec![b"PEM".to_vec()]);
    }
}
