//! Definitions command - list deployed case or process definitions.

use super::print_json;
use anyhow::{Context, Result};
use flowable_client::{CaseDefinitionQuery, Client, ProcessDefinitionQuery};

/// Run the definitions command.
pub async fn run(client: &Client, key: Option<String>, latest: bool, bpmn: bool) -> Result<()> {
    let latest = latest.then_some(true);

    let page = if bpmn {
        let query = ProcessDefinitionQuery {
            key,
            latest,
            ..Default::default()
        };
        client.process_definitions().list(&query).await
    } else {
        let query = CaseDefinitionQuery {
            key,
            latest,
            ..Default::default()
        };
        client.case_definitions().list(&query).await
    }
    .context("Failed to list definitions")?;

    tracing::debug!(total = page.total, "Listed definitions");
    print_json(&serde_json::to_value(&page)?)
}
