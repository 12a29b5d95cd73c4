//! Task commands - list, claim and complete tasks.

use super::{family, print_json};
use anyhow::{Context, Result};
use flowable_client::{Client, TaskQuery, Variable};

/// List open tasks.
pub async fn list(
    client: &Client,
    instance: Option<String>,
    assignee: Option<String>,
    bpmn: bool,
) -> Result<()> {
    let mut query = TaskQuery {
        assignee,
        ..Default::default()
    };
    if bpmn {
        query.process_instance_id = instance;
    } else {
        query.case_instance_id = instance;
    }

    let page = client
        .tasks(family(bpmn))
        .list(&query)
        .await
        .context("Failed to list tasks")?;

    tracing::debug!(total = page.total, "Listed tasks");
    print_json(&serde_json::to_value(&page)?)
}

/// Claim a task for a user.
pub async fn claim(client: &Client, task_id: &str, user: &str, bpmn: bool) -> Result<()> {
    tracing::info!(task_id, user, "Claiming task");

    let result = client
        .tasks(family(bpmn))
        .claim(task_id, user)
        .await
        .with_context(|| format!("Failed to claim task {}", task_id))?;

    print_json(&result)
}

/// Complete a task.
pub async fn complete(
    client: &Client,
    task_id: &str,
    vars: Vec<Variable>,
    outcome: Option<&str>,
    bpmn: bool,
) -> Result<()> {
    tracing::info!(task_id, variables = vars.len(), "Completing task");

    let variables = (!vars.is_empty()).then_some(vars);
    let result = client
        .tasks(family(bpmn))
        .complete(task_id, variables, outcome)
        .await
        .with_context(|| format!("Failed to complete task {}", task_id))?;

    print_json(&result)
}
