//! Process instance operations.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{Pagination, Query};
use crate::resources::IdentityKind;
use crate::resources::identity_links::IdentityLinks;
use crate::resources::variable_store::VariableStore;
use crate::response::{Page, RequestBody};
use crate::variables::Variable;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Value, json};

const BASE: &str = "service/runtime/process-instances";
const QUERY: &str = "service/query/process-instances";

/// Filters for listing process instances.
#[derive(Debug, Clone, Default)]
pub struct ProcessInstanceQuery {
    /// Process instance id.
    pub id: Option<String>,
    /// Process definition key.
    pub process_definition_key: Option<String>,
    /// Process definition id.
    pub process_definition_id: Option<String>,
    /// Business key.
    pub business_key: Option<String>,
    /// User involved in the instance.
    pub involved_user: Option<String>,
    /// Suspension state.
    pub suspended: Option<bool>,
    /// Parent process instance.
    pub super_process_instance_id: Option<String>,
    /// Child process instance.
    pub sub_process_instance_id: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Include process variables in each result.
    pub include_process_variables: Option<bool>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl ProcessInstanceQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("id", self.id.as_deref())
            .opt("processDefinitionKey", self.process_definition_key.as_deref())
            .opt("processDefinitionId", self.process_definition_id.as_deref())
            .opt("businessKey", self.business_key.as_deref())
            .opt("involvedUser", self.involved_user.as_deref())
            .opt("suspended", self.suspended)
            .opt(
                "superProcessInstanceId",
                self.super_process_instance_id.as_deref(),
            )
            .opt(
                "subProcessInstanceId",
                self.sub_process_instance_id.as_deref(),
            )
            .opt("tenantId", self.tenant_id.as_deref())
            .opt("includeProcessVariables", self.include_process_variables)
            .page(&self.page)
    }
}

/// Body for starting a process instance.
///
/// Exactly one of definition id, definition key or message should be set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartProcessInstance {
    /// Start a specific definition version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_definition_id: Option<String>,
    /// Start the latest definition with this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_definition_key: Option<String>,
    /// Start through a message start event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Business key of the new instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_key: Option<String>,
    /// Tenant id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Initial variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<Variable>>,
    /// Variables that are not persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient_variables: Option<Vec<Variable>>,
    /// Ask the server to include variables in the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_variables: Option<bool>,
}

/// Running BPMN process instances.
#[derive(Debug, Clone, Copy)]
pub struct ProcessInstances<'a> {
    client: &'a Client,
}

impl<'a> ProcessInstances<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", BASE, segment(id))
    }

    /// List process instances.
    pub async fn list(&self, query: &ProcessInstanceQuery) -> Result<Page> {
        self.client.get_page(BASE, &query.to_query()).await
    }

    /// Get a process instance by id.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.get_json(&Self::path(id), &Query::new()).await
    }

    /// Start a process instance.
    pub async fn start(&self, request: &StartProcessInstance) -> Result<Value> {
        let body = RequestBody::from_serialize(request)?;
        self.client.post_json(BASE, body).await
    }

    /// Start the latest version of the definition with `key`.
    pub async fn start_by_key(
        &self,
        key: &str,
        variables: Option<Vec<Variable>>,
        business_key: Option<&str>,
    ) -> Result<Value> {
        self.start(&StartProcessInstance {
            process_definition_key: Some(key.to_string()),
            business_key: business_key.map(str::to_string),
            variables,
            ..Default::default()
        })
        .await
    }

    /// Start a specific process definition version.
    pub async fn start_by_id(
        &self,
        process_definition_id: &str,
        variables: Option<Vec<Variable>>,
        business_key: Option<&str>,
    ) -> Result<Value> {
        self.start(&StartProcessInstance {
            process_definition_id: Some(process_definition_id.to_string()),
            business_key: business_key.map(str::to_string),
            variables,
            ..Default::default()
        })
        .await
    }

    /// Delete a process instance.
    pub async fn delete(&self, id: &str, delete_reason: Option<&str>) -> Result<()> {
        let query = Query::new().opt("deleteReason", delete_reason);
        self.client.delete_empty(&Self::path(id), &query).await
    }

    /// Suspend a process instance.
    pub async fn suspend(&self, id: &str) -> Result<Value> {
        self.client
            .put_json(&Self::path(id), json!({ "action": "suspend" }))
            .await
    }

    /// Activate a suspended process instance.
    pub async fn activate(&self, id: &str) -> Result<Value> {
        self.client
            .put_json(&Self::path(id), json!({ "action": "activate" }))
            .await
    }

    /// Query process instances with a JSON body.
    pub async fn query(&self, body: impl Into<RequestBody>) -> Result<Page> {
        self.client.post(QUERY, body).await?.deserialize()
    }

    fn store(&self, id: &str) -> VariableStore<'a> {
        VariableStore::new(self.client, &Self::path(id))
    }

    /// All variables of a process instance.
    pub async fn variables(&self, id: &str) -> Result<Vec<Value>> {
        self.store(id).list(None).await
    }

    /// One variable of a process instance.
    pub async fn variable(&self, id: &str, name: &str) -> Result<Value> {
        self.store(id).get(name, None).await
    }

    /// Binary content of a variable.
    pub async fn variable_data(&self, id: &str, name: &str) -> Result<Bytes> {
        self.store(id).data(name).await
    }

    /// Create new variables.
    pub async fn create_variables(&self, id: &str, variables: &[Variable]) -> Result<Vec<Value>> {
        self.store(id).create(variables).await
    }

    /// Create or update variables.
    pub async fn update_variables(&self, id: &str, variables: &[Variable]) -> Result<Vec<Value>> {
        self.store(id).update_all(variables).await
    }

    /// Update one variable.
    pub async fn update_variable(&self, id: &str, variable: &Variable) -> Result<Value> {
        self.store(id).update(variable).await
    }

    /// Delete one variable.
    pub async fn delete_variable(&self, id: &str, name: &str) -> Result<()> {
        self.store(id).delete(name, None).await
    }

    fn links(&self, id: &str) -> IdentityLinks<'a> {
        IdentityLinks::new(self.client, &Self::path(id))
    }

    /// Users involved in a process instance.
    pub async fn identity_links(&self, id: &str) -> Result<Vec<Value>> {
        self.links(id).list().await
    }

    /// Involve a user with a link type such as `participant`.
    pub async fn add_user_identity_link(
        &self,
        id: &str,
        user: &str,
        link_type: &str,
    ) -> Result<Value> {
        self.links(id)
            .add(json!({ "user": user, "type": link_type }))
            .await
    }

    /// Remove a user involvement.
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

    /// Diagram with active activities highlighted (PNG).
    pub async fn diagram(&self, id: &str) -> Result<Bytes> {
        self.client
            .get_raw(&format!("{}/diagram", Self::path(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_by_message_body() {
        let body = serde_json::to_value(StartProcessInstance {
            message: Some("newOrder".to_string()),
            business_key: Some("order-42".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({"message": "newOrder", "businessKey": "order-42"}));
    }

    #[test]
    fn test_query_params() {
        let query = ProcessInstanceQuery {
            process_definition_key: Some("orderProcess".to_string()),
            suspended: Some(false),
            ..Default::default()
        }
        .to_query();
        assert_eq!(query.get("processDefinitionKey"), Some("orderProcess"));
        assert_eq!(query.get("suspended"), Some("false"));
        assert!(query.get("businessKey").is_none());
    }
}
