//! `enroll-admin show` - Details of one stored identity.

use anyhow::Result;
use colored::Colorize;
use fabric_enroll::x509::CertificateSummary;
use fabric_enroll::IdentityStore;
use serde::Serialize;

use super::Context;
use crate::cli::args::ShowArgs;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct IdentityReport<'a> {
    label: &'a str,
    msp_id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    certificate: CertificateSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate_pem: Option<&'a str>,
}

pub async fn execute(ctx: Context, args: ShowArgs) -> Result<()> {
    let wallet = ctx.wallet().await?;

    let Some(identity) = wallet.get(&args.label).await? else {
        anyhow::bail!(
            "No identity labelled \"{}\" in wallet at {}",
            args.label,
            ctx.wallet_path.display()
        );
    };
    let summary = identity.summary()?;

    match ctx.output_format {
        OutputFormat::Json => {
            let certificate_pem = if args.certificate {
                Some(identity.certificate_pem()?)
            } else {
                None
            };
            print_json(&IdentityReport {
                label: &identity.label,
                msp_id: &identity.issuer_id,
                kind: identity.kind.as_str(),
                certificate: summary,
                certificate_pem,
            })?;
        }
        OutputFormat::Pretty => {
            println!("{}", identity.label.bold().underline());
            println!();
            println!("  {} {}", "MSP ID:".bold(), identity.issuer_id);
            println!("  {} {}", "Type:".bold(), identity.kind);
            println!("  {} {}", "Subject:".bold(), summary.subject);
            println!("  {} {}", "Issuer:".bold(), summary.issuer);
            println!("  {} {}", "Serial:".bold(), summary.serial);
            println!("  {} {}", "Valid from:".bold(), summary.not_before);
            let until = summary.not_after.to_string();
            if summary.is_expired() {
                println!("  {} {} {}", "Valid until:".bold(), until.red(), "(expired)".red());
            } else {
                println!("  {} {}", "Valid until:".bold(), until.green());
            }
            if args.certificate {
                println!();
                print!("{}", identity.certificate_pem()?);
            }
        }
    }

    Ok(())
}
