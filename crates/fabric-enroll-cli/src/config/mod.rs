//! Configuration management.

mod profile;

pub use profile::{ConnectionProfile, ProfileCa};

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
///
/// ```toml
/// [ca]
/// url = "https://localhost:7054"
/// ca_name = "ca-org1"
/// tls_ca_certs = ["organizations/peerOrganizations/org1.example.com/ca/ca.org1.example.com-cert.pem"]
/// msp_id = "Org1MSP"
///
/// [wallet]
/// path = "wallet"
///
/// [enroll]
/// label = "admin"
/// enrollment_id = "admin"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Certificate authority settings.
    pub ca: CaConfig,

    /// Wallet settings.
    pub wallet: WalletConfig,

    /// Enrollment defaults.
    pub enroll: EnrollConfig,
}

/// `[ca]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaConfig {
    /// CA base URL.
    pub url: Option<String>,

    /// CA instance name.
    pub ca_name: Option<String>,

    /// PEM files holding the trusted TLS roots.
    pub tls_ca_certs: Vec<PathBuf>,

    /// Verify the CA's TLS certificate.
    pub verify: bool,

    /// MSP id recorded on enrolled identities.
    pub msp_id: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Fabric connection profile to read CA settings from.
    pub connection_profile: Option<PathBuf>,

    /// Key of the CA under `certificateAuthorities` in the connection profile.
    pub ca_key: Option<String>,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            url: None,
            ca_name: None,
            tls_ca_certs: Vec::new(),
            verify: true,
            msp_id: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            connection_profile: None,
            ca_key: None,
        }
    }
}

/// `[wallet]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Wallet directory.
    pub path: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("wallet"),
        }
    }
}

/// `[enroll]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollConfig {
    /// Wallet label of the enrolled identity.
    pub label: String,

    /// Enrollment id registered with the CA. Defaults to the label.
    pub enrollment_id: Option<String>,

    /// Enrollment secret. Prefer `--secret` or `FABRIC_ENROLLMENT_SECRET`.
    #[serde(skip_serializing)]
    pub enrollment_secret: Option<String>,

    /// Key algorithm for the generated key pair (`p256` or `p384`).
    pub key_algorithm: Option<String>,
}

impl Default for EnrollConfig {
    fn default() -> Self {
        Self {
            label: "admin".to_string(),
            enrollment_id: None,
            enrollment_secret: None,
            key_algorithm: None,
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "hyperledger", "fabric-enroll")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used and a missing file means default settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}
