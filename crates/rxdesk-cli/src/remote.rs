//! # Remote Subcommand
//!
//! Operations against a running rxdesk API server through `rxdesk-client`.
//! The server URL and token come from `--url`/`--token`, falling back to
//! `RXDESK_API_URL`/`RXDESK_API_TOKEN`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rxdesk_client::{ClientConfig, RxClient};
use rxdesk_core::{AuditFilter, AuditStatus, DrugFilter, PrescriptionId};

use crate::EXIT_NOT_FULFILLABLE;

/// Arguments for the `rxdesk remote` subcommand.
#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Server base URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Bearer token (static API token or session token).
    #[arg(long)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// List the drug catalog.
    Drugs {
        /// Case-insensitive name substring.
        #[arg(long)]
        name: Option<String>,
    },

    /// Attempt to fulfill a prescription.
    Fulfill {
        #[arg(value_name = "PRESCRIPTION_ID")]
        id: String,
    },

    /// List fulfillment audit logs.
    Audit {
        #[arg(long)]
        patient: Option<String>,
        #[arg(long)]
        pharmacy: Option<String>,
        /// SUCCESS or FAILED.
        #[arg(long)]
        status: Option<AuditStatus>,
    },

    /// Show dashboard counts.
    Dashboard,
}

/// Build the client from flags, falling back to the environment.
pub fn client_for(args: &RemoteArgs) -> Result<RxClient> {
    let mut config = match &args.url {
        Some(url) => ClientConfig::new(url)?,
        None => ClientConfig::from_env()?,
    };
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    tracing::debug!(?config, "remote client configuration");
    Ok(RxClient::new(config)?)
}

/// Execute the remote subcommand.
pub fn run_remote(args: &RemoteArgs) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let client = client_for(args)?;
    runtime.block_on(execute(&client, &args.command))
}

/// Run one remote command. Returns the process exit code.
pub async fn execute(client: &RxClient, command: &RemoteCommand) -> Result<u8> {
    match command {
        RemoteCommand::Drugs { name } => {
            let filter = DrugFilter {
                name: name.clone(),
                ..DrugFilter::default()
            };
            let drugs = client.drugs().list(&filter).await?;
            for d in &drugs {
                println!(
                    "{:<6} {:<20} {:<16} stock {:>5}/{:<5} expires {}",
                    d.id.as_str(),
                    d.name,
                    d.manufacturer,
                    d.stock,
                    d.limit,
                    d.expiry
                );
            }
            println!("{} drug(s)", drugs.len());
            Ok(0)
        }
        RemoteCommand::Fulfill { id } => {
            let id = PrescriptionId::new(id)?;
            let outcome = client.prescriptions().fulfill(&id).await?;
            if outcome.success {
                println!("{id}: fulfilled");
                Ok(0)
            } else {
                println!("{id}: fulfillment failed");
                for reason in outcome.errors.unwrap_or_default() {
                    println!("  - {reason}");
                }
                Ok(EXIT_NOT_FULFILLABLE)
            }
        }
        RemoteCommand::Audit {
            patient,
            pharmacy,
            status,
        } => {
            let filter = AuditFilter {
                patient_id: patient.clone(),
                pharmacy_id: pharmacy.clone(),
                status: *status,
            };
            let logs = client.audit_logs().list(&filter).await?;
            for log in &logs {
                println!(
                    "{:<6} {} {:<7} {} patient {} at {}",
                    log.id.as_str(),
                    log.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    log.status,
                    log.prescription_id,
                    log.patient_id,
                    log.pharmacy_id
                );
                for reason in log.failure_reasons.iter().flatten() {
                    println!("         - {reason}");
                }
            }
            println!("{} entr{}", logs.len(), if logs.len() == 1 { "y" } else { "ies" });
            Ok(0)
        }
        RemoteCommand::Dashboard => {
            let summary = client.dashboard().summary().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(server: &MockServer, command: RemoteCommand) -> RemoteArgs {
        RemoteArgs {
            url: Some(server.uri()),
            token: Some("secret".into()),
            command,
        }
    }

    #[tokio::test]
    async fn fulfill_failure_exits_with_not_fulfillable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/prescriptions/RX001/fulfill"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "errors": ["Drug D002 is expired"]
            })))
            .mount(&server)
            .await;

        let a = args(&server, RemoteCommand::Fulfill { id: "RX001".into() });
        let client = client_for(&a).unwrap();
        assert_eq!(execute(&client, &a.command).await.unwrap(), EXIT_NOT_FULFILLABLE);
    }

    #[tokio::test]
    async fn fulfill_conflict_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/prescriptions/RX002/fulfill"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": "CONFLICT", "message": "conflict: prescription RX002 is already FULFILLED"}
            })))
            .mount(&server)
            .await;

        let a = args(&server, RemoteCommand::Fulfill { id: "RX002".into() });
        let client = client_for(&a).unwrap();
        let err = execute(&client, &a.command).await.unwrap_err();
        assert!(err.to_string().contains("already FULFILLED"));
    }

    #[tokio::test]
    async fn audit_passes_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/audit-logs"))
            .and(query_param("patientId", "P003"))
            .and(query_param("status", "FAILED"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let a = args(
            &server,
            RemoteCommand::Audit {
                patient: Some("P003".into()),
                pharmacy: None,
                status: Some(AuditStatus::Failed),
            },
        );
        let client = client_for(&a).unwrap();
        assert_eq!(execute(&client, &a.command).await.unwrap(), 0);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let a = RemoteArgs {
            url: Some("not a url".into()),
            token: None,
            command: RemoteCommand::Dashboard,
        };
        assert!(client_for(&a).is_err());
    }
}
