//! `enroll-admin enroll` - Enroll with the CA and store the identity once.

use anyhow::{Context as _, Result};
use colored::Colorize;
use fabric_enroll::x509::CertificateSummary;
use fabric_enroll::{
    EnrollError, Enroller, EnrollmentOutcome, EnrollmentRequest, IdentityStore, KeyAlgorithm,
};
use serde::Serialize;
use std::sync::Arc;

use super::Context;
use crate::cli::args::EnrollArgs;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct EnrollReport {
    label: String,
    status: &'static str,
    wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    msp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<CertificateSummary>,
}

pub async fn execute(ctx: Context, args: EnrollArgs) -> Result<()> {
    let label = args
        .label
        .clone()
        .unwrap_or_else(|| ctx.config.enroll.label.clone());
    let enrollment_id = args
        .enrollment_id
        .clone()
        .or_else(|| ctx.config.enroll.enrollment_id.clone())
        .unwrap_or_else(|| label.clone());

    let wallet = ctx.wallet().await?;
    if ctx.output_format == OutputFormat::Pretty {
        println!("Wallet path: {}", ctx.wallet_path.display());
    }

    let Some(secret) = args
        .secret
        .clone()
        .or_else(|| ctx.config.enroll.enrollment_secret.clone())
    else {
        // Without a secret there is nothing to enroll with, but an existing
        // identity still counts as success
        if wallet.exists(&label).await? {
            return report(&ctx, &label, &EnrollmentOutcome::AlreadyEnrolled);
        }
        anyhow::bail!(
            "Enrollment secret required for \"{}\".\n\n\
             Set it with one of:\n  \
             1. --secret <SECRET>\n  \
             2. FABRIC_ENROLLMENT_SECRET environment variable",
            label
        );
    };

    let request = build_request(&args, enrollment_id, secret)?;
    let algorithm = key_algorithm(&ctx, &args)?;
    let client = ctx.client(&args.ca, algorithm)?;
    let enroller = Enroller::new(Arc::new(wallet), client);

    let outcome = match enroller.ensure_enrolled(&label, &request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let stage = e.stage();
            if let Some(hint) = recovery_hint(&e) {
                eprintln!("{}", format!("Hint: {hint}").yellow());
            }
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to enroll \"{label}\" during {stage}")));
        }
    };

    report(&ctx, &label, &outcome)
}

/// What the operator should do next, when the error says
fn recovery_hint(err: &EnrollError) -> Option<&'static str> {
    if err.is_fatal_for_secret() {
        Some("the enrollment secret is rejected or spent; ask the CA registrar for a new one")
    } else if err.is_store_error() {
        Some("check the wallet path and its permissions; the CA was not contacted")
    } else {
        None
    }
}

fn build_request(args: &EnrollArgs, enrollment_id: String, secret: String) -> Result<EnrollmentRequest> {
    let mut request = EnrollmentRequest::new(enrollment_id, secret);

    if let Some(cn) = &args.common_name {
        request = request.common_name(cn);
    }
    for host in &args.hosts {
        request = request.host(host);
    }
    if let Some(profile) = &args.enrollment_profile {
        request = request.profile(profile);
    }
    for attr in &args.attrs {
        let (name, optional) = parse_attr(attr)?;
        request = request.attribute(name, optional);
    }

    Ok(request)
}

/// Parse `name` or `name:opt` into an attribute request
fn parse_attr(input: &str) -> Result<(&str, bool)> {
    let (name, optional) = match input.split_once(':') {
        None => (input, false),
        Some((name, "opt" | "optional")) => (name, true),
        Some((_, other)) => anyhow::bail!(
            "Invalid attribute request '{}': unknown modifier '{}' (expected 'opt')",
            input,
            other
        ),
    };
    if name.is_empty() {
        anyhow::bail!("Invalid attribute request '{}': empty name", input);
    }
    Ok((name, optional))
}

fn key_algorithm(ctx: &Context, args: &EnrollArgs) -> Result<KeyAlgorithm> {
    if let Some(algorithm) = args.key_algorithm {
        return Ok(algorithm);
    }
    ctx.config
        .enroll
        .key_algorithm
        .as_deref()
        .map_or(Ok(KeyAlgorithm::default()), str::parse)
        .map_err(anyhow::Error::msg)
        .context("Invalid [enroll] key_algorithm")
}

fn report(ctx: &Context, label: &str, outcome: &EnrollmentOutcome) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json => {
            let identity = outcome.identity();
            print_json(&EnrollReport {
                label: label.to_string(),
                status: if outcome.is_new() { "enrolled" } else { "already_enrolled" },
                wallet: ctx.wallet_path.display().to_string(),
                msp_id: identity.map(|i| i.issuer_id.clone()),
                certificate: identity.map(|i| i.summary()).transpose()?,
            })?;
        }
        OutputFormat::Pretty => match outcome {
            EnrollmentOutcome::AlreadyEnrolled => {
                println!(
                    "{}",
                    format!("An identity for \"{label}\" already exists in the wallet").yellow()
                );
            }
            EnrollmentOutcome::NewlyEnrolled(identity) => {
                println!(
                    "{} enrolled \"{}\" and imported it into the wallet",
                    "Success:".green().bold(),
                    label.cyan()
                );
                println!("  {} {}", "MSP ID:".bold(), identity.issuer_id);
                if let Ok(summary) = identity.summary() {
                    println!("  {} {}", "Subject:".bold(), summary.subject);
                    println!("  {} {}", "Expires:".bold(), summary.not_after);
                }
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attr() {
        assert_eq!(parse_attr("hf.Registrar.Roles").unwrap(), ("hf.Registrar.Roles", false));
        assert_eq!(parse_attr("role:opt").unwrap(), ("role", true));
        assert!(parse_attr("role:maybe").is_err());
        assert!(parse_attr(":opt").is_err());
    }

    #[test]
    fn test_recovery_hint() {
        let auth = EnrollError::Authentication {
            enrollment_id: "admin".into(),
            message: "Authentication failure".into(),
        };
        assert!(recovery_hint(&auth).unwrap().contains("new one"));

        let unreadable = EnrollError::StoreUnavailable {
            label: "admin".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(recovery_hint(&unreadable).unwrap().contains("wallet path"));

        // A store write after enrollment points at the secret, not the wallet
        let partial = EnrollError::PartialEnrollment {
            label: "admin".into(),
            source: Box::new(unreadable),
        };
        assert!(recovery_hint(&partial).unwrap().contains("new one"));

        assert!(recovery_hint(&EnrollError::MalformedResponse("empty".into())).is_none());
    }

    #[test]
    fn test_build_request_carries_csr_options() {
        let args = EnrollArgs {
            common_name: Some("Org1 Admin".into()),
            hosts: vec!["localhost".into()],
            enrollment_profile: Some("tls".into()),
            attrs: vec!["hf.Type:opt".into()],
            ..EnrollArgs::default()
        };

        let request = build_request(&args, "admin".into(), "adminpw".into()).unwrap();
        assert_eq!(request.enrollment_id(), "admin");
        assert_eq!(request.subject_common_name(), "Org1 Admin");
        assert_eq!(request.hosts(), ["localhost".to_string()]);
        assert_eq!(request.signing_profile(), Some("tls"));
        assert_eq!(request.attribute_requests().len(), 1);
        assert!(request.attribute_requests()[0].optional);
    }
}
