//! Start command - start a case or process instance by definition key.

use super::print_json;
use anyhow::{Context, Result};
use flowable_client::{Client, Variable};

/// Run the start command.
pub async fn run(
    client: &Client,
    key: &str,
    business_key: Option<&str>,
    vars: Vec<Variable>,
    bpmn: bool,
) -> Result<()> {
    tracing::info!(key, variables = vars.len(), bpmn, "Starting instance");

    let variables = (!vars.is_empty()).then_some(vars);
    let instance = if bpmn {
        client
            .process_instances()
            .start_by_key(key, variables, business_key)
            .await
    } else {
        client
            .case_instances()
            .start_by_key(key, variables, business_key)
            .await
    }
    .with_context(|| format!("Failed to start '{}'", key))?;

    print_json(&instance)
}
