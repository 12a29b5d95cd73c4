//! History queries.
//!
//! The CMMN and BPMN history APIs share most filters but name the instance
//! and definition parameters after their engine (`caseInstanceId` vs
//! `processInstanceId`). Query types here are engine-neutral and pick the
//! names when the request is built.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{DateParam, Pagination, Query};
use crate::resources::ApiFamily;
use crate::response::{Page, RequestBody};
use serde_json::Value;

fn instance_param(family: ApiFamily) -> &'static str {
    match family {
        ApiFamily::Cmmn => "caseInstanceId",
        ApiFamily::Bpmn => "processInstanceId",
    }
}

fn definition_id_param(family: ApiFamily) -> &'static str {
    match family {
        ApiFamily::Cmmn => "caseDefinitionId",
        ApiFamily::Bpmn => "processDefinitionId",
    }
}

fn definition_key_param(family: ApiFamily) -> &'static str {
    match family {
        ApiFamily::Cmmn => "caseDefinitionKey",
        ApiFamily::Bpmn => "processDefinitionKey",
    }
}

fn variables_param(family: ApiFamily) -> &'static str {
    match family {
        ApiFamily::Cmmn => "includeCaseVariables",
        ApiFamily::Bpmn => "includeProcessVariables",
    }
}

/// Filters for historic case or process instances.
#[derive(Debug, Clone, Default)]
pub struct HistoricInstanceQuery {
    /// Instance id.
    pub instance_id: Option<String>,
    /// Definition key.
    pub definition_key: Option<String>,
    /// Definition id.
    pub definition_id: Option<String>,
    /// Business key.
    pub business_key: Option<String>,
    /// User involved in the instance.
    pub involved_user: Option<String>,
    /// Only finished (`true`) or running (`false`) instances.
    pub finished: Option<bool>,
    /// User who started the instance.
    pub started_by: Option<String>,
    /// Started before this date.
    pub started_before: Option<DateParam>,
    /// Started after this date.
    pub started_after: Option<DateParam>,
    /// Finished before this date.
    pub finished_before: Option<DateParam>,
    /// Finished after this date.
    pub finished_after: Option<DateParam>,
    /// Include instance variables.
    pub include_variables: Option<bool>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl HistoricInstanceQuery {
    fn to_query(&self, family: ApiFamily) -> Query {
        Query::new()
            .opt(instance_param(family), self.instance_id.as_deref())
            .opt(definition_key_param(family), self.definition_key.as_deref())
            .opt(definition_id_param(family), self.definition_id.as_deref())
            .opt("businessKey", self.business_key.as_deref())
            .opt("involvedUser", self.involved_user.as_deref())
            .opt("finished", self.finished)
            .opt("startedBy", self.started_by.as_deref())
            .date("startedBefore", self.started_before.as_ref())
            .date("startedAfter", self.started_after.as_ref())
            .date("finishedBefore", self.finished_before.as_ref())
            .date("finishedAfter", self.finished_after.as_ref())
            .opt(variables_param(family), self.include_variables)
            .opt("tenantId", self.tenant_id.as_deref())
            .page(&self.page)
    }
}

/// Filters for historic tasks.
#[derive(Debug, Clone, Default)]
pub struct HistoricTaskQuery {
    /// Task id.
    pub task_id: Option<String>,
    /// Owning instance.
    pub instance_id: Option<String>,
    /// Definition id of the owning instance.
    pub definition_id: Option<String>,
    /// Exact task name.
    pub task_name: Option<String>,
    /// Task name pattern.
    pub task_name_like: Option<String>,
    /// Assignee.
    pub task_assignee: Option<String>,
    /// Owner.
    pub task_owner: Option<String>,
    /// User involved in the task.
    pub task_involved_user: Option<String>,
    /// Task definition key.
    pub task_definition_key: Option<String>,
    /// Only finished (`true`) or open (`false`) tasks.
    pub finished: Option<bool>,
    /// Completed before this date.
    pub task_completed_before: Option<DateParam>,
    /// Completed after this date.
    pub task_completed_after: Option<DateParam>,
    /// Include task-local variables.
    pub include_task_local_variables: Option<bool>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl HistoricTaskQuery {
    fn to_query(&self, family: ApiFamily) -> Query {
        Query::new()
            .opt("taskId", self.task_id.as_deref())
            .opt(instance_param(family), self.instance_id.as_deref())
            .opt(definition_id_param(family), self.definition_id.as_deref())
            .opt("taskName", self.task_name.as_deref())
            .opt("taskNameLike", self.task_name_like.as_deref())
            .opt("taskAssignee", self.task_assignee.as_deref())
            .opt("taskOwner", self.task_owner.as_deref())
            .opt("taskInvolvedUser", self.task_involved_user.as_deref())
            .opt("taskDefinitionKey", self.task_definition_key.as_deref())
            .opt("finished", self.finished)
            .date("taskCompletedBefore", self.task_completed_before.as_ref())
            .date("taskCompletedAfter", self.task_completed_after.as_ref())
            .opt("includeTaskLocalVariables", self.include_task_local_variables)
            .opt("tenantId", self.tenant_id.as_deref())
            .page(&self.page)
    }
}

/// Filters for historic variables.
#[derive(Debug, Clone, Default)]
pub struct HistoricVariableQuery {
    /// Owning instance.
    pub instance_id: Option<String>,
    /// Owning task.
    pub task_id: Option<String>,
    /// Exact variable name.
    pub variable_name: Option<String>,
    /// Variable name pattern.
    pub variable_name_like: Option<String>,
    /// Leave out task-local variables.
    pub exclude_task_variables: Option<bool>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl HistoricVariableQuery {
    fn to_query(&self, family: ApiFamily) -> Query {
        Query::new()
            .opt(instance_param(family), self.instance_id.as_deref())
            .opt("taskId", self.task_id.as_deref())
            .opt("variableName", self.variable_name.as_deref())
            .opt("variableNameLike", self.variable_name_like.as_deref())
            .opt("excludeTaskVariables", self.exclude_task_variables)
            .page(&self.page)
    }
}

/// Filters for historic BPMN activities.
#[derive(Debug, Clone, Default)]
pub struct HistoricActivityQuery {
    /// Activity id in the model.
    pub activity_id: Option<String>,
    /// Activity instance id.
    pub activity_instance_id: Option<String>,
    /// Activity name.
    pub activity_name: Option<String>,
    /// Activity type (`userTask`, `serviceTask`, ...).
    pub activity_type: Option<String>,
    /// Execution id.
    pub execution_id: Option<String>,
    /// Only finished (`true`) or running (`false`) activities.
    pub finished: Option<bool>,
    /// Assignee of the activity's task.
    pub task_assignee: Option<String>,
    /// Owning process instance.
    pub process_instance_id: Option<String>,
    /// Process definition id.
    pub process_definition_id: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl HistoricActivityQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("activityId", self.activity_id.as_deref())
            .opt("activityInstanceId", self.activity_instance_id.as_deref())
            .opt("activityName", self.activity_name.as_deref())
            .opt("activityType", self.activity_type.as_deref())
            .opt("executionId", self.execution_id.as_deref())
            .opt("finished", self.finished)
            .opt("taskAssignee", self.task_assignee.as_deref())
            .opt("processInstanceId", self.process_instance_id.as_deref())
            .opt("processDefinitionId", self.process_definition_id.as_deref())
            .opt("tenantId", self.tenant_id.as_deref())
            .page(&self.page)
    }
}

fn history_path(family: ApiFamily, resource: &str) -> String {
    format!("{}/{}", family.history(), resource)
}

fn item_path(family: ApiFamily, resource: &str, id: &str) -> String {
    format!("{}/{}/{}", family.history(), resource, segment(id))
}

/// CMMN history.
#[derive(Debug, Clone, Copy)]
pub struct CmmnHistory<'a> {
    client: &'a Client,
}

impl<'a> CmmnHistory<'a> {
    const FAMILY: ApiFamily = ApiFamily::Cmmn;

    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List historic case instances.
    pub async fn historic_case_instances(&self, query: &HistoricInstanceQuery) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-case-instances");
        self.client.get_page(&path, &query.to_query(Self::FAMILY)).await
    }

    /// Get a historic case instance.
    pub async fn historic_case_instance(&self, id: &str) -> Result<Value> {
        let path = item_path(Self::FAMILY, "historic-case-instances", id);
        self.client.get_json(&path, &Query::new()).await
    }

    /// Delete a historic case instance.
    pub async fn delete_historic_case_instance(&self, id: &str) -> Result<()> {
        let path = item_path(Self::FAMILY, "historic-case-instances", id);
        self.client.delete_empty(&path, &Query::new()).await
    }

    /// List historic tasks.
    pub async fn historic_task_instances(&self, query: &HistoricTaskQuery) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-task-instances");
        self.client.get_page(&path, &query.to_query(Self::FAMILY)).await
    }

    /// Get a historic task.
    pub async fn historic_task_instance(&self, id: &str) -> Result<Value> {
        let path = item_path(Self::FAMILY, "historic-task-instances", id);
        self.client.get_json(&path, &Query::new()).await
    }

    /// List historic variables.
    pub async fn historic_variable_instances(
        &self,
        query: &HistoricVariableQuery,
    ) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-variable-instances");
        self.client.get_page(&path, &query.to_query(Self::FAMILY)).await
    }

    /// List historic milestones.
    ///
    /// Filters such as `milestoneCaseInstanceId` or `milestoneName` go into
    /// `query` as is.
    pub async fn historic_milestone_instances(&self, query: &Query) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-milestone-instances");
        self.client.get_page(&path, query).await
    }

    /// List historic plan items.
    ///
    /// Filters such as `caseInstanceId` or `planItemInstanceState` go into
    /// `query` as is.
    pub async fn historic_plan_item_instances(&self, query: &Query) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-planitem-instances");
        self.client.get_page(&path, query).await
    }

    /// Query historic case instances with a JSON body.
    pub async fn query_historic_case_instances(
        &self,
        body: impl Into<RequestBody>,
    ) -> Result<Page> {
        let path = format!("{}/historic-case-instances", Self::FAMILY.query());
        self.client.post(&path, body).await?.deserialize()
    }
}

/// BPMN history.
#[derive(Debug, Clone, Copy)]
pub struct BpmnHistory<'a> {
    client: &'a Client,
}

impl<'a> BpmnHistory<'a> {
    const FAMILY: ApiFamily = ApiFamily::Bpmn;

    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List historic process instances.
    pub async fn historic_process_instances(
        &self,
        query: &HistoricInstanceQuery,
    ) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-process-instances");
        self.client.get_page(&path, &query.to_query(Self::FAMILY)).await
    }

    /// Get a historic process instance.
    pub async fn historic_process_instance(&self, id: &str) -> Result<Value> {
        let path = item_path(Self::FAMILY, "historic-process-instances", id);
        self.client.get_json(&path, &Query::new()).await
    }

    /// Delete a historic process instance.
    pub async fn delete_historic_process_instance(&self, id: &str) -> Result<()> {
        let path = item_path(Self::FAMILY, "historic-process-instances", id);
        self.client.delete_empty(&path, &Query::new()).await
    }

    /// List historic tasks.
    pub async fn historic_task_instances(&self, query: &HistoricTaskQuery) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-task-instances");
        self.client.get_page(&path, &query.to_query(Self::FAMILY)).await
    }

    /// Get a historic task.
    pub async fn historic_task_instance(&self, id: &str) -> Result<Value> {
        let path = item_path(Self::FAMILY, "historic-task-instances", id);
        self.client.get_json(&path, &Query::new()).await
    }

    /// List historic activities.
    pub async fn historic_activity_instances(
        &self,
        query: &HistoricActivityQuery,
    ) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-activity-instances");
        self.client.get_page(&path, &query.to_query()).await
    }

    /// List historic variables.
    pub async fn historic_variable_instances(
        &self,
        query: &HistoricVariableQuery,
    ) -> Result<Page> {
        let path = history_path(Self::FAMILY, "historic-variable-instances");
        self.client.get_page(&path, &query.to_query(Self::FAMILY)).await
    }

    /// Query historic process instances with a JSON body.
    pub async fn query_historic_process_instances(
        &self,
        body: impl Into<RequestBody>,
    ) -> Result<Page> {
        let path = format!("{}/historic-process-instances", Self::FAMILY.query());
        self.client.post(&path, body).await?.deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_query_names_follow_family() {
        let query = HistoricInstanceQuery {
            instance_id: Some("i-1".to_string()),
            definition_key: Some("order".to_string()),
            include_variables: Some(true),
            ..Default::default()
        };

        let cmmn = query.to_query(ApiFamily::Cmmn);
        assert_eq!(cmmn.get("caseInstanceId"), Some("i-1"));
        assert_eq!(cmmn.get("caseDefinitionKey"), Some("order"));
        assert_eq!(cmmn.get("includeCaseVariables"), Some("true"));
        assert!(cmmn.get("processInstanceId").is_none());

        let bpmn = query.to_query(ApiFamily::Bpmn);
        assert_eq!(bpmn.get("processInstanceId"), Some("i-1"));
        assert_eq!(bpmn.get("processDefinitionKey"), Some("order"));
        assert_eq!(bpmn.get("includeProcessVariables"), Some("true"));
    }

    #[test]
    fn test_task_query_finished_flag() {
        let query = HistoricTaskQuery {
            task_id: Some("t-1".to_string()),
            finished: Some(true),
            ..Default::default()
        }
        .to_query(ApiFamily::Cmmn);
        assert_eq!(
            query.pairs(),
            &[
                ("taskId".to_string(), "t-1".to_string()),
                ("finished".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            history_path(ApiFamily::Cmmn, "historic-milestone-instances"),
            "cmmn-api/cmmn-history/historic-milestone-instances"
        );
        assert_eq!(
            item_path(ApiFamily::Bpmn, "historic-task-instances", "t-1"),
            "service/history/historic-task-instances/t-1"
        );
    }
}
