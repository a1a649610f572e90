//! `enroll-admin info` - CA information.

use anyhow::{Context as _, Result};
use colored::Colorize;
use fabric_enroll::x509::{self, CertificateSummary};
use fabric_enroll::KeyAlgorithm;
use serde::Serialize;

use super::Context;
use crate::cli::args::InfoArgs;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct InfoReport {
    url: String,
    ca_name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<CertificateSummary>,
}

pub async fn execute(ctx: Context, args: InfoArgs) -> Result<()> {
    let client = ctx.client(&args.ca, KeyAlgorithm::default())?;
    let url = client.endpoint().url().to_string();

    let info = client
        .ca_info()
        .await
        .with_context(|| format!("Failed to query CA at {url}"))?;

    // An empty chain is allowed; an unparseable one is reported but not fatal
    let root = if info.ca_chain.is_empty() {
        None
    } else {
        match x509::summarize(&info.ca_chain) {
            Ok(summary) => Some(summary),
            Err(reason) => {
                tracing::warn!(%reason, "could not parse CA chain");
                None
            }
        }
    };

    match ctx.output_format {
        OutputFormat::Json => print_json(&InfoReport {
            url,
            ca_name: info.ca_name,
            version: info.version,
            root,
        })?,
        OutputFormat::Pretty => {
            println!("{}", "Certificate Authority".bold().underline());
            println!();
            println!("  {} {}", "URL:".bold(), url);
            println!("  {} {}", "CA Name:".bold(), info.ca_name);
            println!("  {} {}", "Version:".bold(), info.version);
            if let Some(root) = root {
                println!("  {} {}", "Chain:".bold(), root.subject);
                let expires = root.not_after.to_string();
                if root.is_expired() {
                    println!("  {} {}", "Expires:".bold(), expires.red());
                } else {
                    println!("  {} {}", "Expires:".bold(), expires);
                }
            }
        }
    }

    Ok(())
}
