//! Case instance operations.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{DateParam, Pagination, Query};
use crate::resources::IdentityKind;
use crate::resources::identity_links::IdentityLinks;
use crate::resources::variable_store::VariableStore;
use crate::response::{Page, RequestBody};
use crate::variables::Variable;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Value, json};

const BASE: &str = "cmmn-api/cmmn-runtime/case-instances";
const QUERY: &str = "cmmn-api/query/case-instances";

/// Filters for listing case instances.
#[derive(Debug, Clone, Default)]
pub struct CaseInstanceQuery {
    /// Case instance id.
    pub id: Option<String>,
    /// Case definition id.
    pub case_definition_id: Option<String>,
    /// Case definition key.
    pub case_definition_key: Option<String>,
    /// Business key.
    pub business_key: Option<String>,
    /// Parent case instance id.
    pub case_instance_parent_id: Option<String>,
    /// User who started the instance.
    pub started_by: Option<String>,
    /// Started before this date.
    pub started_before: Option<DateParam>,
    /// Started after this date.
    pub started_after: Option<DateParam>,
    /// Instance state (`active`, `completed`, ...).
    pub state: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Include case variables in each result.
    pub include_case_variables: Option<bool>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl CaseInstanceQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("id", self.id.as_deref())
            .opt("caseDefinitionId", self.case_definition_id.as_deref())
            .opt("caseDefinitionKey", self.case_definition_key.as_deref())
            .opt("businessKey", self.business_key.as_deref())
            .opt("caseInstanceParentId", self.case_instance_parent_id.as_deref())
            .opt("startedBy", self.started_by.as_deref())
            .date("startedBefore", self.started_before.as_ref())
            .date("startedAfter", self.started_after.as_ref())
            .opt("state", self.state.as_deref())
            .opt("tenantId", self.tenant_id.as_deref())
            .opt("includeCaseVariables", self.include_case_variables)
            .page(&self.page)
    }
}

/// Body for starting a case instance.
///
/// Unset fields are omitted. `variables: Some(vec![])` sends an empty array.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCaseInstance {
    /// Start a specific definition version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_definition_id: Option<String>,
    /// Start the latest definition with this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_definition_key: Option<String>,
    /// Business key of the new instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_key: Option<String>,
    /// Tenant id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Outcome passed to the start form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
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

/// Running CMMN case instances.
#[derive(Debug, Clone, Copy)]
pub struct CaseInstances<'a> {
    client: &'a Client,
}

impl<'a> CaseInstances<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", BASE, segment(id))
    }

    /// List case instances.
    pub async fn list(&self, query: &CaseInstanceQuery) -> Result<Page> {
        self.client.get_page(BASE, &query.to_query()).await
    }

    /// Get a case instance by id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`](crate::ClientError::NotFound) once
    /// the instance has ended or never existed.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.get_json(&Self::path(id), &Query::new()).await
    }

    /// Start a case instance.
    pub async fn start(&self, request: &StartCaseInstance) -> Result<Value> {
        let body = RequestBody::from_serialize(request)?;
        self.client.post_json(BASE, body).await
    }

    /// Start the latest version of the definition with `key`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use flowable_client::{Client, ClientConfig, Variable};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = Client::new(ClientConfig::default())?;
    /// let instance = client
    ///     .case_instances()
    ///     .start_by_key(
    ///         "orderCase",
    ///         Some(vec![Variable::new("amount", 500), Variable::new("approved", true)]),
    ///         None,
    ///     )
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_by_key(
        &self,
        key: &str,
        variables: Option<Vec<Variable>>,
        business_key: Option<&str>,
    ) -> Result<Value> {
        self.start(&StartCaseInstance {
            case_definition_key: Some(key.to_string()),
            business_key: business_key.map(str::to_string),
            variables,
            ..Default::default()
        })
        .await
    }

    /// Start a specific case definition version.
    pub async fn start_by_id(
        &self,
        case_definition_id: &str,
        variables: Option<Vec<Variable>>,
        business_key: Option<&str>,
    ) -> Result<Value> {
        self.start(&StartCaseInstance {
            case_definition_id: Some(case_definition_id.to_string()),
            business_key: business_key.map(str::to_string),
            variables,
            ..Default::default()
        })
        .await
    }

    /// Terminate and delete a case instance.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete_empty(&Self::path(id), &Query::new()).await
    }

    /// Query case instances with a JSON body (variable filters etc).
    pub async fn query(&self, body: impl Into<RequestBody>) -> Result<Page> {
        self.client.post(QUERY, body).await?.deserialize()
    }

    fn store(&self, id: &str) -> VariableStore<'a> {
        VariableStore::new(self.client, &Self::path(id))
    }

    /// All variables of a case instance.
    pub async fn variables(&self, id: &str) -> Result<Vec<Value>> {
        self.store(id).list(None).await
    }

    /// One variable of a case instance.
    pub async fn variable(&self, id: &str, name: &str) -> Result<Value> {
        self.store(id).get(name, None).await
    }

    /// Binary content of a variable.
    pub async fn variable_data(&self, id: &str, name: &str) -> Result<Bytes> {
        self.store(id).data(name).await
    }

    /// Create new variables. Fails with `Conflict` if one exists.
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

    /// Users involved in a case instance.
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

    /// Stage overview of a case instance.
    pub async fn stage_overview(&self, id: &str) -> Result<Vec<Value>> {
        let path = format!("{}/stage-overview", Self::path(id));
        crate::resources::into_list(self.client.get_json(&path, &Query::new()).await?)
    }

    /// Diagram with active plan items highlighted (PNG).
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
    fn test_start_body_omits_unset_fields() {
        let body = serde_json::to_string(&StartCaseInstance {
            case_definition_key: Some("orderCase".to_string()),
            variables: Some(vec![
                Variable::new("amount", 500),
                Variable::new("approved", true),
            ]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            body,
            r#"{"caseDefinitionKey":"orderCase","variables":[{"name":"amount","value":500,"type":"long"},{"name":"approved","value":true,"type":"boolean"}]}"#
        );
    }

    #[test]
    fn test_start_body_empty_variables() {
        let body = serde_json::to_value(StartCaseInstance {
            case_definition_key: Some("orderCase".to_string()),
            variables: Some(Vec::new()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({"caseDefinitionKey": "orderCase", "variables": []}));
    }

    #[test]
    fn test_query_dates() {
        let query = CaseInstanceQuery {
            started_after: Some(DateParam::from("2024-01-01")),
            ..Default::default()
        }
        .to_query();
        assert_eq!(query.get("startedAfter"), Some("2024-01-01"));
        assert_eq!(query.pairs().len(), 1);
    }
}
