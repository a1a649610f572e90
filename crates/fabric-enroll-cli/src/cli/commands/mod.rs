//! Command implementations.

pub mod enroll;
pub mod info;
pub mod list;
pub mod show;

use anyhow::{Context as _, Result};
use fabric_enroll::{CaClient, CaEndpoint, FileSystemWallet, KeyAlgorithm, TimeoutConfig};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::args::CaArgs;
use crate::config::{Config, ConnectionProfile, ProfileCa};
use crate::output::OutputFormat;

/// User-Agent sent to the CA
const USER_AGENT: &str = concat!("enroll-admin/", env!("CARGO_PKG_VERSION"));

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration
    pub config: Config,

    /// Wallet directory
    pub wallet_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,
}

impl Context {
    /// Open the wallet, creating its directory if needed.
    pub async fn wallet(&self) -> Result<FileSystemWallet> {
        FileSystemWallet::open(&self.wallet_path)
            .await
            .with_context(|| format!("Failed to open wallet at {}", self.wallet_path.display()))
    }

    /// Resolve the CA endpoint.
    ///
    /// Flags and environment win over the config file, which wins over the
    /// connection profile.
    pub fn endpoint(&self, args: &CaArgs) -> Result<CaEndpoint> {
        let ca = &self.config.ca;
        let profile = self.profile_ca(args)?;

        let url = args
            .ca_url
            .clone()
            .or_else(|| ca.url.clone())
            .or_else(|| profile.as_ref().map(|p| p.url.clone()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "CA URL required.\n\n\
                     Set it with one of:\n  \
                     1. --ca-url <URL>\n  \
                     2. FABRIC_CA_URL environment variable\n  \
                     3. [ca] url in the config file\n  \
                     4. --connection-profile <connection.json>"
                )
            })?;

        let ca_name = args
            .ca_name
            .clone()
            .or_else(|| ca.ca_name.clone())
            .or_else(|| profile.as_ref().map(|p| p.ca_name.clone()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "CA name required.\n\n\
                     Set it with --ca-name, FABRIC_CA_NAME, [ca] ca_name, or a connection profile"
                )
            })?;

        let mut builder = CaEndpoint::builder(url, ca_name);

        let cert_paths = if args.tls_ca_certs.is_empty() {
            &ca.tls_ca_certs
        } else {
            &args.tls_ca_certs
        };
        if cert_paths.is_empty() {
            for pem in profile.iter().flat_map(|p| &p.tls_ca_pems) {
                builder = builder.trusted_root_pem(pem.clone());
            }
        } else {
            for path in cert_paths {
                let pem = std::fs::read(path).with_context(|| {
                    format!("Failed to read TLS CA certificate {}", path.display())
                })?;
                builder = builder.trusted_root_pem(pem);
            }
        }

        let msp_id = args
            .msp_id
            .clone()
            .or_else(|| ca.msp_id.clone())
            .or_else(|| profile.and_then(|p| p.msp_id));
        if let Some(msp_id) = msp_id {
            builder = builder.msp_id(msp_id);
        }

        if args.insecure || !ca.verify {
            builder = builder.insecure_skip_verify();
        }

        builder.build().context("Invalid CA configuration")
    }

    /// Create a CA client for the resolved endpoint.
    pub fn client(&self, args: &CaArgs, algorithm: KeyAlgorithm) -> Result<CaClient> {
        CaClient::builder(self.endpoint(args)?)
            .timeouts(self.timeouts(args))
            .user_agent(USER_AGENT)
            .key_algorithm(algorithm)
            .build()
            .context("Failed to create CA client")
    }

    fn timeouts(&self, args: &CaArgs) -> TimeoutConfig {
        let ca = &self.config.ca;
        TimeoutConfig::new()
            .request(Duration::from_secs(args.timeout.unwrap_or(ca.timeout_secs)))
            .connect(Duration::from_secs(ca.connect_timeout_secs))
    }

    fn profile_ca(&self, args: &CaArgs) -> Result<Option<ProfileCa>> {
        let Some(path) = args
            .connection_profile
            .as_ref()
            .or(self.config.ca.connection_profile.as_ref())
        else {
            return Ok(None);
        };

        let key = args.ca_key.as_deref().or(self.config.ca.ca_key.as_deref());
        ConnectionProfile::load(path)?.ca(key).map(Some)
    }
}
