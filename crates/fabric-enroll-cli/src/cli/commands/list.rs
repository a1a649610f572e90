//! `enroll-admin list` - Identities stored in the wallet.

use anyhow::Result;
use colored::Colorize;
use fabric_enroll::IdentityStore;
use serde::Serialize;

use super::Context;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct Entry {
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    msp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(ctx: Context) -> Result<()> {
    let wallet = ctx.wallet().await?;

    // A corrupt record is listed with its error instead of failing the listing
    let mut entries = Vec::new();
    for label in wallet.list().await? {
        let entry = match wallet.get(&label).await {
            Ok(identity) => Entry {
                msp_id: identity.map(|i| i.issuer_id),
                error: None,
                label,
            },
            Err(e) => Entry {
                msp_id: None,
                error: Some(e.to_string()),
                label,
            },
        };
        entries.push(entry);
    }

    match ctx.output_format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Pretty => {
            if entries.is_empty() {
                println!(
                    "{}",
                    format!("No identities in wallet at {}", ctx.wallet_path.display()).dimmed()
                );
                return Ok(());
            }
            for entry in &entries {
                match (&entry.msp_id, &entry.error) {
                    (_, Some(error)) => println!("  {}  {}", entry.label.bold(), error.red()),
                    (Some(msp_id), None) => println!("  {}  {}", entry.label.bold(), msp_id),
                    (None, None) => println!("  {}", entry.label.bold()),
                }
            }
        }
    }

    Ok(())
}
