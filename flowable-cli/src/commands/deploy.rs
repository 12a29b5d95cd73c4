//! Deploy command - upload a model file.

use super::{family, print_json};
use anyhow::{Context, Result};
use flowable_client::{ApiFamily, Client, DeploymentUpload};
use std::path::Path;

/// Run the deploy command.
pub async fn run(
    client: &Client,
    file: &str,
    name: Option<String>,
    tenant: Option<String>,
    bpmn: bool,
) -> Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("Model file not found: {}", file);
    }

    tracing::info!(file = %file, bpmn, "Deploying model");

    let upload = DeploymentUpload {
        name,
        tenant_id: tenant,
        ..Default::default()
    };
    let deployments = match family(bpmn) {
        ApiFamily::Cmmn => client.cmmn_deployments(),
        ApiFamily::Bpmn => client.bpmn_deployments(),
    };
    let deployment = deployments
        .create(path, &upload)
        .await
        .with_context(|| format!("Failed to deploy {}", file))?;

    print_json(&deployment)
}
