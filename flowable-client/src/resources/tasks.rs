//! Task operations for both engines.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{DateParam, Pagination, Query};
use crate::resources::identity_links::IdentityLinks;
use crate::resources::variable_store::VariableStore;
use crate::resources::{ApiFamily, IdentityKind, flatten};
use crate::response::{Page, RequestBody};
use crate::variables::{Variable, VariableScope};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::slice;
use tracing::debug;

/// Filters for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Exact name.
    pub name: Option<String>,
    /// Name pattern.
    pub name_like: Option<String>,
    /// Exact description.
    pub description: Option<String>,
    /// Exact priority.
    pub priority: Option<i32>,
    /// Lowest priority.
    pub minimum_priority: Option<i32>,
    /// Highest priority.
    pub maximum_priority: Option<i32>,
    /// Assigned user.
    pub assignee: Option<String>,
    /// Assignee pattern.
    pub assignee_like: Option<String>,
    /// Owner.
    pub owner: Option<String>,
    /// Only tasks without assignee.
    pub unassigned: Option<bool>,
    /// `pending` or `resolved`.
    pub delegation_state: Option<String>,
    /// Tasks the user may claim.
    pub candidate_user: Option<String>,
    /// Tasks the group may claim.
    pub candidate_group: Option<String>,
    /// User involved in any way.
    pub involved_user: Option<String>,
    /// Owning case instance.
    pub case_instance_id: Option<String>,
    /// Case definition id.
    pub case_definition_id: Option<String>,
    /// Owning process instance.
    pub process_instance_id: Option<String>,
    /// Process definition id.
    pub process_definition_id: Option<String>,
    /// Process definition key.
    pub process_definition_key: Option<String>,
    /// Task definition key.
    pub task_definition_key: Option<String>,
    /// Created on this date.
    pub created_on: Option<DateParam>,
    /// Created before this date.
    pub created_before: Option<DateParam>,
    /// Created after this date.
    pub created_after: Option<DateParam>,
    /// Due on this date.
    pub due_on: Option<DateParam>,
    /// Due before this date.
    pub due_before: Option<DateParam>,
    /// Due after this date.
    pub due_after: Option<DateParam>,
    /// Only tasks without due date.
    pub without_due_date: Option<bool>,
    /// Only active (not suspended) tasks.
    pub active: Option<bool>,
    /// Category.
    pub category: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Include task-local variables.
    pub include_task_local_variables: Option<bool>,
    /// Include process variables.
    pub include_process_variables: Option<bool>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl TaskQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("name", self.name.as_deref())
            .opt("nameLike", self.name_like.as_deref())
            .opt("description", self.description.as_deref())
            .opt("priority", self.priority)
            .opt("minimumPriority", self.minimum_priority)
            .opt("maximumPriority", self.maximum_priority)
            .opt("assignee", self.assignee.as_deref())
            .opt("assigneeLike", self.assignee_like.as_deref())
            .opt("owner", self.owner.as_deref())
            .opt("unassigned", self.unassigned)
            .opt("delegationState", self.delegation_state.as_deref())
            .opt("candidateUser", self.candidate_user.as_deref())
            .opt("candidateGroup", self.candidate_group.as_deref())
            .opt("involvedUser", self.involved_user.as_deref())
            .opt("caseInstanceId", self.case_instance_id.as_deref())
            .opt("caseDefinitionId", self.case_definition_id.as_deref())
            .opt("processInstanceId", self.process_instance_id.as_deref())
            .opt("processDefinitionId", self.process_definition_id.as_deref())
            .opt("processDefinitionKey", self.process_definition_key.as_deref())
            .opt("taskDefinitionKey", self.task_definition_key.as_deref())
            .date("createdOn", self.created_on.as_ref())
            .date("createdBefore", self.created_before.as_ref())
            .date("createdAfter", self.created_after.as_ref())
            .date("dueOn", self.due_on.as_ref())
            .date("dueBefore", self.due_before.as_ref())
            .date("dueAfter", self.due_after.as_ref())
            .opt("withoutDueDate", self.without_due_date)
            .opt("active", self.active)
            .opt("category", self.category.as_deref())
            .opt("tenantId", self.tenant_id.as_deref())
            .opt("includeTaskLocalVariables", self.include_task_local_variables)
            .opt("includeProcessVariables", self.include_process_variables)
            .page(&self.page)
    }
}

/// Fields changed by [`Tasks::update`]. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New assignee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// New owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// `pending` or `resolved`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegation_state: Option<String>,
    /// Due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Parent task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,
    /// Category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Tenant id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Form key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_key: Option<String>,
}

/// Action posted to a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    /// Claim for `assignee`, or release the task with `None`.
    Claim {
        /// New assignee.
        assignee: Option<String>,
    },
    /// Complete the task.
    Complete {
        /// Variables set on completion.
        variables: Option<Vec<Variable>>,
        /// Outcome of the task form.
        outcome: Option<String>,
        /// Variables that are not persisted.
        transient_variables: Option<Vec<Variable>>,
    },
    /// Delegate to another user.
    Delegate {
        /// Delegate.
        assignee: String,
    },
    /// Resolve a delegated task back to its owner.
    Resolve,
}

impl TaskAction {
    fn body(&self) -> Result<Value> {
        let mut body = Map::new();
        match self {
            Self::Claim { assignee } => {
                body.insert("action".to_string(), json!("claim"));
                // `null` releases the task, so it is always sent
                body.insert("assignee".to_string(), json!(assignee));
            }
            Self::Complete {
                variables,
                outcome,
                transient_variables,
            } => {
                body.insert("action".to_string(), json!("complete"));
                if let Some(variables) = variables {
                    body.insert("variables".to_string(), serde_json::to_value(variables)?);
                }
                if let Some(outcome) = outcome {
                    body.insert("outcome".to_string(), json!(outcome));
                }
                if let Some(transient) = transient_variables {
                    body.insert(
                        "transientVariables".to_string(),
                        serde_json::to_value(transient)?,
                    );
                }
            }
            Self::Delegate { assignee } => {
                body.insert("action".to_string(), json!("delegate"));
                body.insert("assignee".to_string(), json!(assignee));
            }
            Self::Resolve => {
                body.insert("action".to_string(), json!("resolve"));
            }
        }
        Ok(Value::Object(body))
    }
}

/// Tasks of one engine.
#[derive(Debug, Clone)]
pub struct Tasks<'a> {
    client: &'a Client,
    family: ApiFamily,
    base: String,
}

impl<'a> Tasks<'a> {
    pub(crate) fn new(client: &'a Client, family: ApiFamily) -> Self {
        Self {
            client,
            family,
            base: format!("{}/tasks", family.runtime()),
        }
    }

    /// The engine these tasks belong to.
    pub fn family(&self) -> ApiFamily {
        self.family
    }

    fn path(&self, id: &str) -> String {
        format!("{}/{}", self.base, segment(id))
    }

    /// List tasks.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use flowable_client::{Client, ClientConfig, TaskQuery};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = Client::new(ClientConfig::default())?;
    /// let page = client
    ///     .cmmn_tasks()
    ///     .list(&TaskQuery {
    ///         assignee: Some("kermit".to_string()),
    ///         ..Default::default()
    ///     })
    ///     .await?;
    /// for task in page {
    ///     println!("{}", task["name"]);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list(&self, query: &TaskQuery) -> Result<Page> {
        self.client.get_page(&self.base, &query.to_query()).await
    }

    /// Get a task by id.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.get_json(&self.path(id), &Query::new()).await
    }

    /// Change task fields.
    pub async fn update(&self, id: &str, update: &TaskUpdate) -> Result<Value> {
        let body = RequestBody::from_serialize(update)?;
        self.client.put_json(&self.path(id), body).await
    }

    /// Delete a standalone task.
    pub async fn delete(
        &self,
        id: &str,
        cascade_history: Option<bool>,
        delete_reason: Option<&str>,
    ) -> Result<()> {
        let query = Query::new()
            .opt("cascadeHistory", cascade_history)
            .opt("deleteReason", delete_reason);
        self.client.delete_empty(&self.path(id), &query).await
    }

    /// Post an action to a task.
    pub async fn action(&self, id: &str, action: &TaskAction) -> Result<Value> {
        self.client.post_json(&self.path(id), action.body()?).await
    }

    /// Assign the task to `user`.
    pub async fn claim(&self, id: &str, user: &str) -> Result<Value> {
        let action = TaskAction::Claim {
            assignee: Some(user.to_string()),
        };
        self.action(id, &action).await
    }

    /// Remove the assignee.
    pub async fn unclaim(&self, id: &str) -> Result<Value> {
        self.action(id, &TaskAction::Claim { assignee: None }).await
    }

    /// Complete the task.
    pub async fn complete(
        &self,
        id: &str,
        variables: Option<Vec<Variable>>,
        outcome: Option<&str>,
    ) -> Result<Value> {
        let action = TaskAction::Complete {
            variables,
            outcome: outcome.map(str::to_string),
            transient_variables: None,
        };
        self.action(id, &action).await
    }

    /// Delegate the task to `user`.
    pub async fn delegate(&self, id: &str, user: &str) -> Result<Value> {
        let action = TaskAction::Delegate {
            assignee: user.to_string(),
        };
        self.action(id, &action).await
    }

    /// Hand a delegated task back to its owner.
    pub async fn resolve(&self, id: &str) -> Result<Value> {
        self.action(id, &TaskAction::Resolve).await
    }

    fn store(&self, id: &str) -> VariableStore<'a> {
        VariableStore::new(self.client, &self.path(id))
    }

    /// Variables of a task, optionally limited to one scope.
    pub async fn variables(&self, id: &str, scope: Option<VariableScope>) -> Result<Vec<Value>> {
        self.store(id).list(scope).await
    }

    /// One task variable.
    pub async fn variable(
        &self,
        id: &str,
        name: &str,
        scope: Option<VariableScope>,
    ) -> Result<Value> {
        self.store(id).get(name, scope).await
    }

    /// Create new task variables.
    pub async fn create_variables(&self, id: &str, variables: &[Variable]) -> Result<Vec<Value>> {
        self.store(id).create(variables).await
    }

    /// Update one existing task variable.
    pub async fn update_variable(&self, id: &str, variable: &Variable) -> Result<Value> {
        self.store(id).update(variable).await
    }

    /// Update each variable, creating the ones that do not exist yet.
    ///
    /// Variables are written one at a time. The answers are flattened into
    /// one list in input order.
    ///
    /// # Errors
    ///
    /// Any error other than a 404 on update stops the loop and is returned.
    /// Variables written before the failure stay written.
    pub async fn set_variables(&self, id: &str, variables: &[Variable]) -> Result<Vec<Value>> {
        let store = self.store(id);
        let mut results = Vec::with_capacity(variables.len());

        for variable in variables {
            match store.update(variable).await {
                Ok(value) => results.extend(flatten(value)),
                Err(err) if err.is_not_found() => {
                    debug!(task = id, variable = %variable.name, "creating missing variable");
                    results.extend(store.create(slice::from_ref(variable)).await?);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(results)
    }

    /// Delete one task variable.
    pub async fn delete_variable(
        &self,
        id: &str,
        name: &str,
        scope: Option<VariableScope>,
    ) -> Result<()> {
        self.store(id).delete(name, scope).await
    }

    /// Delete all local variables of a task.
    pub async fn delete_local_variables(&self, id: &str) -> Result<()> {
        self.store(id).delete_all().await
    }

    fn links(&self, id: &str) -> IdentityLinks<'a> {
        IdentityLinks::new(self.client, &self.path(id))
    }

    /// All identity links of a task.
    pub async fn identity_links(&self, id: &str) -> Result<Vec<Value>> {
        self.links(id).list().await
    }

    /// User identity links of a task.
    pub async fn user_identity_links(&self, id: &str) -> Result<Vec<Value>> {
        self.links(id).list_kind(IdentityKind::User).await
    }

    /// Group identity links of a task.
    pub async fn group_identity_links(&self, id: &str) -> Result<Vec<Value>> {
        self.links(id).list_kind(IdentityKind::Group).await
    }

    async fn add_link(
        &self,
        id: &str,
        kind: IdentityKind,
        identity_id: &str,
        link_type: &str,
    ) -> Result<Value> {
        let mut body = Map::new();
        body.insert(kind.body_field().to_string(), json!(identity_id));
        body.insert("type".to_string(), json!(link_type));
        self.links(id).add(Value::Object(body)).await
    }

    /// Link a user, e.g. as `candidate`.
    pub async fn add_user_identity_link(
        &self,
        id: &str,
        user: &str,
        link_type: &str,
    ) -> Result<Value> {
        self.add_link(id, IdentityKind::User, user, link_type).await
    }

    /// Link a group, e.g. as `candidate`.
    pub async fn add_group_identity_link(
        &self,
        id: &str,
        group: &str,
        link_type: &str,
    ) -> Result<Value> {
        self.add_link(id, IdentityKind::Group, group, link_type).await
    }

    /// Remove a user link.
    pub async fn remove_user_identity_link(
        &self,
        id: &str,
        user: &str,
        link_type: &str,
    ) -> Result<()> {
        self.links(id)
            .remove(IdentityKind::User, user, Some(link_type))
            .await
    }

    /// Remove a group link.
    pub async fn remove_group_identity_link(
        &self,
        id: &str,
        group: &str,
        link_type: &str,
    ) -> Result<()> {
        self.links(id)
            .remove(IdentityKind::Group, group, Some(link_type))
            .await
    }

    /// Query tasks with a JSON body.
    pub async fn query(&self, body: impl Into<RequestBody>) -> Result<Page> {
        let path = format!("{}/tasks", self.family.query());
        self.client.post(&path, body).await?.deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclaim_sends_null_assignee() {
        let body = TaskAction::Claim { assignee: None }.body().unwrap();
        assert_eq!(body, json!({"action": "claim", "assignee": null}));
    }

    #[test]
    fn test_complete_body() {
        let body = TaskAction::Complete {
            variables: Some(vec![Variable::new("approved", true)]),
            outcome: Some("accept".to_string()),
            transient_variables: None,
        }
        .body()
        .unwrap();
        assert_eq!(
            body,
            json!({
                "action": "complete",
                "variables": [{"name": "approved", "value": true, "type": "boolean"}],
                "outcome": "accept"
            })
        );

        let body = TaskAction::Complete {
            variables: None,
            outcome: None,
            transient_variables: None,
        }
        .body()
        .unwrap();
        assert_eq!(body, json!({"action": "complete"}));
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let body = serde_json::to_value(TaskUpdate {
            owner: Some("gonzo".to_string()),
            priority: Some(80),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({"owner": "gonzo", "priority": 80}));
    }

    #[test]
    fn test_query_dates_and_flags() {
        let query = TaskQuery {
            case_instance_id: Some("ci-1".to_string()),
            due_before: Some(DateParam::from("2024-05-01")),
            unassigned: Some(true),
            ..Default::default()
        }
        .to_query();
        assert_eq!(
            query.pairs(),
            &[
                ("unassigned".to_string(), "true".to_string()),
                ("caseInstanceId".to_string(), "ci-1".to_string()),
                ("dueBefore".to_string(), "2024-05-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_task_paths() {
        let client = Client::new(crate::ClientConfig::default()).unwrap();
        let tasks = Tasks::new(&client, ApiFamily::Cmmn);
        assert_eq!(tasks.path("t 1"), "cmmn-api/cmmn-runtime/tasks/t%201");
        assert_eq!(tasks.family(), ApiFamily::Cmmn);
    }
}
