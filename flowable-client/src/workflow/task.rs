//! A user task and the actions a worker performs on it.

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::resources::{ApiFamily, Tasks};
use crate::variables::{Variable, variables_to_map};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};

/// How a [`Task`] updates its snapshot after an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotPolicy {
    /// Apply the action's effect to the local snapshot without a request.
    #[default]
    Patch,
    /// Re-read the task from the server after every action.
    Refetch,
}

/// A runtime (or, once completed, historic) task.
///
/// # Example
///
/// ```no_run
/// # use flowable_client::{ApiFamily, Client, ClientConfig, Task, variables};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let client = Client::new(ClientConfig::default())?;
/// let mut task = Task::load(client, ApiFamily::Cmmn, "task-1").await?;
/// task.claim("kermit").await?;
/// task.complete(Some(variables([("approved", true)])), None).await?;
/// assert!(task.is_completed());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Task {
    client: Client,
    family: ApiFamily,
    snapshot: Value,
    policy: SnapshotPolicy,
    patched: bool,
}

impl Task {
    /// Wrap an already fetched task representation.
    pub fn from_snapshot(client: Client, family: ApiFamily, snapshot: Value) -> Self {
        Self {
            client,
            family,
            snapshot,
            policy: SnapshotPolicy::default(),
            patched: false,
        }
    }

    /// Fetch a task by id.
    pub async fn load(client: Client, family: ApiFamily, id: &str) -> Result<Self> {
        let snapshot = client.tasks(family).get(id).await?;
        Ok(Self::from_snapshot(client, family, snapshot))
    }

    /// Use `policy` for subsequent actions.
    #[must_use]
    pub fn with_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The snapshot policy in use.
    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    /// Whether the snapshot was patched locally since the last fetch.
    pub fn is_patched(&self) -> bool {
        self.patched
    }

    /// The last known representation.
    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    /// The engine the task belongs to.
    pub fn family(&self) -> ApiFamily {
        self.family
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.snapshot.get(name).and_then(Value::as_str)
    }

    /// Task id.
    pub fn id(&self) -> Option<&str> {
        self.field("id")
    }

    /// Task name.
    pub fn name(&self) -> Option<&str> {
        self.field("name")
    }

    /// Current assignee.
    pub fn assignee(&self) -> Option<&str> {
        self.field("assignee")
    }

    /// Current owner.
    pub fn owner(&self) -> Option<&str> {
        self.field("owner")
    }

    /// Id of the owning case or process instance.
    pub fn instance_id(&self) -> Option<&str> {
        match self.family {
            ApiFamily::Cmmn => self.field("caseInstanceId").or_else(|| self.field("scopeId")),
            ApiFamily::Bpmn => self.field("processInstanceId"),
        }
    }

    /// Whether the task has ended.
    ///
    /// Only a non-blank `endTime` counts; `null`, a missing field or an
    /// empty string mean the task is still open.
    pub fn is_completed(&self) -> bool {
        self.field("endTime").is_some_and(|end| !end.trim().is_empty())
    }

    fn tasks(&self) -> Tasks<'_> {
        self.client.tasks(self.family)
    }

    fn require_id(&self) -> Result<String> {
        self.id()
            .map(str::to_string)
            .ok_or(ClientError::NotLoaded("task"))
    }

    /// Re-read the task. A completed task is read from history.
    pub async fn refresh(&mut self) -> Result<&Value> {
        let id = self.require_id()?;
        self.snapshot = match self.tasks().get(&id).await {
            Ok(task) => task,
            Err(err) if err.is_not_found() => self.historic(&id).await?,
            Err(err) => return Err(err),
        };
        self.patched = false;
        Ok(&self.snapshot)
    }

    async fn historic(&self, id: &str) -> Result<Value> {
        match self.family {
            ApiFamily::Cmmn => self.client.cmmn_history().historic_task_instance(id).await,
            ApiFamily::Bpmn => self.client.bpmn_history().historic_task_instance(id).await,
        }
    }

    async fn settle(&mut self, patch: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        match self.policy {
            SnapshotPolicy::Patch => {
                if let Value::Object(fields) = &mut self.snapshot {
                    patch(fields);
                }
                self.patched = true;
            }
            SnapshotPolicy::Refetch => {
                self.refresh().await?;
            }
        }
        Ok(())
    }

    /// Assign the task to `user`.
    pub async fn claim(&mut self, user: &str) -> Result<()> {
        let id = self.require_id()?;
        self.tasks().claim(&id, user).await?;
        self.settle(|fields| {
            fields.insert("assignee".to_string(), json!(user));
        })
        .await
    }

    /// Release the task.
    pub async fn unclaim(&mut self) -> Result<()> {
        let id = self.require_id()?;
        self.tasks().unclaim(&id).await?;
        self.settle(|fields| {
            fields.insert("assignee".to_string(), Value::Null);
        })
        .await
    }

    /// Complete the task.
    pub async fn complete(
        &mut self,
        variables: Option<Vec<Variable>>,
        outcome: Option<&str>,
    ) -> Result<()> {
        let id = self.require_id()?;
        self.tasks().complete(&id, variables, outcome).await?;
        let end_time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.settle(|fields| {
            fields.insert("endTime".to_string(), json!(end_time));
        })
        .await
    }

    /// Delegate the task to `user`. The previous assignee becomes owner if
    /// there was none.
    pub async fn delegate(&mut self, user: &str) -> Result<()> {
        let id = self.require_id()?;
        self.tasks().delegate(&id, user).await?;
        self.settle(|fields| {
            let owner_missing = fields.get("owner").is_none_or(Value::is_null);
            if owner_missing {
                let previous = fields.get("assignee").cloned().unwrap_or(Value::Null);
                fields.insert("owner".to_string(), previous);
            }
            fields.insert("assignee".to_string(), json!(user));
            fields.insert("delegationState".to_string(), json!("pending"));
        })
        .await
    }

    /// Hand a delegated task back to its owner.
    pub async fn resolve(&mut self) -> Result<()> {
        let id = self.require_id()?;
        self.tasks().resolve(&id).await?;
        self.settle(|fields| {
            let owner = fields.get("owner").cloned().unwrap_or(Value::Null);
            fields.insert("assignee".to_string(), owner);
            fields.insert("delegationState".to_string(), json!("resolved"));
        })
        .await
    }

    /// Variables of the task as a `name -> value` map.
    pub async fn variables(&self) -> Result<Map<String, Value>> {
        let id = self.require_id()?;
        let list = self.tasks().variables(&id, None).await?;
        Ok(variables_to_map(&list))
    }

    /// Value of one variable.
    pub async fn variable(&self, name: &str) -> Result<Value> {
        let id = self.require_id()?;
        let variable = self.tasks().variable(&id, name, None).await?;
        Ok(variable.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Update or create each variable.
    pub async fn set_variables(&self, variables: &[Variable]) -> Result<Vec<Value>> {
        let id = self.require_id()?;
        self.tasks().set_variables(&id, variables).await
    }

    /// Let `user` claim the task.
    pub async fn add_candidate_user(&self, user: &str) -> Result<Value> {
        let id = self.require_id()?;
        self.tasks()
            .add_user_identity_link(&id, user, "candidate")
            .await
    }

    /// Let members of `group` claim the task.
    pub async fn add_candidate_group(&self, group: &str) -> Result<Value> {
        let id = self.require_id()?;
        self.tasks()
            .add_group_identity_link(&id, group, "candidate")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn task(snapshot: Value) -> Task {
        let client = Client::new(ClientConfig::default()).unwrap();
        Task::from_snapshot(client, ApiFamily::Cmmn, snapshot)
    }

    #[test]
    fn test_completion_rule() {
        assert!(!task(json!({"id": "t1"})).is_completed());
        assert!(!task(json!({"id": "t1", "endTime": null})).is_completed());
        assert!(!task(json!({"id": "t1", "endTime": ""})).is_completed());
        assert!(!task(json!({"id": "t1", "endTime": "  "})).is_completed());
        assert!(task(json!({"id": "t1", "endTime": "2024-01-01T10:00:00.000Z"})).is_completed());
    }

    #[test]
    fn test_accessors() {
        let t = task(json!({
            "id": "t1",
            "name": "Review",
            "assignee": "kermit",
            "caseInstanceId": "ci-1"
        }));
        assert_eq!(t.id(), Some("t1"));
        assert_eq!(t.name(), Some("Review"));
        assert_eq!(t.assignee(), Some("kermit"));
        assert_eq!(t.owner(), None);
        assert_eq!(t.instance_id(), Some("ci-1"));
        assert_eq!(t.policy(), SnapshotPolicy::Patch);
        assert!(!t.is_patched());
    }

    #[tokio::test]
    async fn test_actions_need_an_id() {
        let mut t = task(json!({"name": "Review"}));
        let result = t.claim("kermit").await;
        assert!(matches!(result, Err(ClientError::NotLoaded("task"))));
    }
}
