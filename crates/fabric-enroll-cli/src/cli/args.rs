//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use fabric_enroll::KeyAlgorithm;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Enroll a Hyperledger Fabric identity and store it in a wallet
///
/// Running `enroll-admin` again for a label that is already in the wallet
/// does nothing, so it is safe to call from startup scripts.
#[derive(Parser, Debug)]
#[command(name = "enroll-admin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Config file (default: platform config directory)
    #[arg(short, long, env = "FABRIC_ENROLL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Wallet directory
    #[arg(short, long, env = "FABRIC_WALLET", global = true)]
    pub wallet: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Arguments for the default `enroll` command
    #[command(flatten)]
    pub enroll: EnrollArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enroll with the CA unless the label is already in the wallet (default)
    Enroll(EnrollArgs),

    /// Show CA name, version and chain without using a secret
    Info(InfoArgs),

    /// List identities stored in the wallet
    List,

    /// Show a stored identity (never prints the private key)
    Show(ShowArgs),
}

// ============================================================================
// CA connection
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct CaArgs {
    /// CA URL, e.g. https://localhost:7054
    #[arg(long, env = "FABRIC_CA_URL")]
    pub ca_url: Option<String>,

    /// CA instance name, e.g. ca-org1
    #[arg(long, env = "FABRIC_CA_NAME")]
    pub ca_name: Option<String>,

    /// PEM file with trusted TLS root certificates (repeatable)
    #[arg(long = "tls-ca-cert", value_name = "PEM")]
    pub tls_ca_certs: Vec<PathBuf>,

    /// MSP id recorded on the enrolled identity
    #[arg(long, env = "FABRIC_MSP_ID")]
    pub msp_id: Option<String>,

    /// Fabric connection profile (connection-org1.json) describing the CA
    #[arg(long, value_name = "JSON")]
    pub connection_profile: Option<PathBuf>,

    /// CA entry to use from the connection profile, e.g. ca.org1.example.com
    #[arg(long)]
    pub ca_key: Option<String>,

    /// Do not verify the CA's TLS certificate (test networks only)
    #[arg(long)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

// ============================================================================
// Enroll command
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct EnrollArgs {
    #[command(flatten)]
    pub ca: CaArgs,

    /// Wallet label to store the identity under
    #[arg(short, long)]
    pub label: Option<String>,

    /// Enrollment id registered with the CA (defaults to the label)
    #[arg(long, env = "FABRIC_ENROLLMENT_ID")]
    pub enrollment_id: Option<String>,

    /// One-time enrollment secret
    #[arg(long, env = "FABRIC_ENROLLMENT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Subject common name for the CSR (defaults to the enrollment id)
    #[arg(long)]
    pub common_name: Option<String>,

    /// Subject alternative name for the CSR (repeatable)
    #[arg(long = "host", value_name = "HOST")]
    pub hosts: Vec<String>,

    /// CA signing profile, e.g. tls
    #[arg(long, value_name = "NAME")]
    pub enrollment_profile: Option<String>,

    /// Attribute to request in the certificate, `name` or `name:opt` (repeatable)
    #[arg(long = "attr", value_name = "NAME[:opt]")]
    pub attrs: Vec<String>,

    /// Key algorithm: p256 or p384
    #[arg(long)]
    pub key_algorithm: Option<KeyAlgorithm>,
}

// ============================================================================
// Info command
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct InfoArgs {
    #[command(flatten)]
    pub ca: CaArgs,
}

// ============================================================================
// Show command
// ============================================================================

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Wallet label
    pub label: String,

    /// Also print the certificate PEM
    #[arg(long)]
    pub certificate: bool,
}
