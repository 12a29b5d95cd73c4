//! Process definition operations.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{DateParam, Pagination, Query};
use crate::resources::IdentityKind;
use crate::resources::identity_links::IdentityLinks;
use crate::response::Page;
use bytes::Bytes;
use serde_json::{Map, Value, json};

const BASE: &str = "service/repository/process-definitions";

/// Filters for listing process definitions.
#[derive(Debug, Clone, Default)]
pub struct ProcessDefinitionQuery {
    /// Exact version.
    pub version: Option<u32>,
    /// Exact name.
    pub name: Option<String>,
    /// Name pattern.
    pub name_like: Option<String>,
    /// Exact key.
    pub key: Option<String>,
    /// Key pattern.
    pub key_like: Option<String>,
    /// Exact resource name.
    pub resource_name: Option<String>,
    /// Resource name pattern.
    pub resource_name_like: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Category pattern.
    pub category_like: Option<String>,
    /// Exclude a category.
    pub category_not_equals: Option<String>,
    /// Owning deployment.
    pub deployment_id: Option<String>,
    /// Only definitions the user may start.
    pub startable_by_user: Option<String>,
    /// Only the latest version of each key.
    pub latest: Option<bool>,
    /// Suspension state.
    pub suspended: Option<bool>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl ProcessDefinitionQuery {
    /// Latest version of the definition with `key`.
    pub fn latest_by_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            latest: Some(true),
            ..Default::default()
        }
    }

    fn to_query(&self) -> Query {
        Query::new()
            .opt("version", self.version)
            .opt("name", self.name.as_deref())
            .opt("nameLike", self.name_like.as_deref())
            .opt("key", self.key.as_deref())
            .opt("keyLike", self.key_like.as_deref())
            .opt("resourceName", self.resource_name.as_deref())
            .opt("resourceNameLike", self.resource_name_like.as_deref())
            .opt("category", self.category.as_deref())
            .opt("categoryLike", self.category_like.as_deref())
            .opt("categoryNotEquals", self.category_not_equals.as_deref())
            .opt("deploymentId", self.deployment_id.as_deref())
            .opt("startableByUser", self.startable_by_user.as_deref())
            .opt("latest", self.latest)
            .opt("suspended", self.suspended)
            .opt("tenantId", self.tenant_id.as_deref())
            .page(&self.page)
    }
}

/// Options for suspending or activating a definition.
#[derive(Debug, Clone, Default)]
pub struct SuspensionOptions {
    /// Also suspend/activate running instances.
    pub include_process_instances: Option<bool>,
    /// Apply at this date instead of immediately.
    pub date: Option<DateParam>,
}

impl SuspensionOptions {
    fn body(&self, action: &str) -> Value {
        let mut body = Map::new();
        body.insert("action".to_string(), json!(action));
        if let Some(include) = self.include_process_instances {
            body.insert("includeProcessInstances".to_string(), json!(include));
        }
        if let Some(date) = &self.date {
            body.insert("date".to_string(), json!(date.to_param()));
        }
        Value::Object(body)
    }
}

/// BPMN process definitions.
#[derive(Debug, Clone, Copy)]
pub struct ProcessDefinitions<'a> {
    client: &'a Client,
}

impl<'a> ProcessDefinitions<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", BASE, segment(id))
    }

    /// List process definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, query: &ProcessDefinitionQuery) -> Result<Page> {
        self.client.get_page(BASE, &query.to_query()).await
    }

    /// Get a process definition by id.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.get_json(&Self::path(id), &Query::new()).await
    }

    /// Latest process definition with `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Only fails on transport or server errors, never for a missing key.
    pub async fn get_by_key(&self, key: &str, tenant_id: Option<&str>) -> Result<Option<Value>> {
        let mut query = ProcessDefinitionQuery::latest_by_key(key);
        query.tenant_id = tenant_id.map(str::to_string);
        Ok(self.list(&query).await?.into_first())
    }

    /// Change the category of a definition.
    pub async fn update_category(&self, id: &str, category: &str) -> Result<Value> {
        self.client
            .put_json(&Self::path(id), json!({ "category": category }))
            .await
    }

    /// Suspend a definition so no new instances can start.
    pub async fn suspend(&self, id: &str, options: &SuspensionOptions) -> Result<Value> {
        self.client
            .put_json(&Self::path(id), options.body("suspend"))
            .await
    }

    /// Re-activate a suspended definition.
    pub async fn activate(&self, id: &str, options: &SuspensionOptions) -> Result<Value> {
        self.client
            .put_json(&Self::path(id), options.body("activate"))
            .await
    }

    /// The BPMN XML the definition was parsed from.
    pub async fn resource_data(&self, id: &str) -> Result<Bytes> {
        self.client
            .get_raw(&format!("{}/resourcedata", Self::path(id)))
            .await
    }

    /// JSON model of the definition.
    pub async fn model(&self, id: &str) -> Result<Value> {
        self.client
            .get_json(&format!("{}/model", Self::path(id)), &Query::new())
            .await
    }

    /// Diagram image (PNG).
    pub async fn image(&self, id: &str) -> Result<Bytes> {
        self.client
            .get_raw(&format!("{}/image", Self::path(id)))
            .await
    }

    fn links(&self, id: &str) -> IdentityLinks<'a> {
        IdentityLinks::new(self.client, &Self::path(id))
    }

    /// Candidate starters of a definition.
    pub async fn identity_links(&self, id: &str) -> Result<Vec<Value>> {
        self.links(id).list().await
    }

    /// One candidate starter link.
    pub async fn identity_link(
        &self,
        id: &str,
        kind: IdentityKind,
        identity_id: &str,
    ) -> Result<Value> {
        self.links(id).get(kind, identity_id, None).await
    }

    /// Allow a user to start this definition.
    pub async fn add_candidate_user(&self, id: &str, user: &str) -> Result<Value> {
        self.links(id).add(json!({ "user": user })).await
    }

    /// Allow a group to start this definition.
    pub async fn add_candidate_group(&self, id: &str, group: &str) -> Result<Value> {
        self.links(id).add(json!({ "groupId": group })).await
    }

    /// Remove a candidate starter.
    pub async fn remove_identity_link(
        &self,
        id: &str,
        kind: IdentityKind,
        identity_id: &str,
    ) -> Result<()> {
        self.links(id).remove(kind, identity_id, None).await
    }
}
