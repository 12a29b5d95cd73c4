//! Plan item instance operations.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{Pagination, Query};
use crate::response::Page;
use serde_json::{Value, json};

const BASE: &str = "cmmn-api/cmmn-runtime/plan-item-instances";

/// Filters for listing plan item instances.
#[derive(Debug, Clone, Default)]
pub struct PlanItemInstanceQuery {
    /// Plan item instance id.
    pub id: Option<String>,
    /// Element id in the case model.
    pub element_id: Option<String>,
    /// Plan item name.
    pub name: Option<String>,
    /// State (`active`, `available`, `completed`, ...).
    pub state: Option<String>,
    /// Case definition id.
    pub case_definition_id: Option<String>,
    /// Case instance id.
    pub case_instance_id: Option<String>,
    /// Enclosing stage instance.
    pub stage_instance_id: Option<String>,
    /// Plan item definition id.
    pub plan_item_definition_id: Option<String>,
    /// Plan item definition type (`stage`, `humantask`, `milestone`, ...).
    pub plan_item_definition_type: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl PlanItemInstanceQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("id", self.id.as_deref())
            .opt("elementId", self.element_id.as_deref())
            .opt("name", self.name.as_deref())
            .opt("state", self.state.as_deref())
            .opt("caseDefinitionId", self.case_definition_id.as_deref())
            .opt("caseInstanceId", self.case_instance_id.as_deref())
            .opt("stageInstanceId", self.stage_instance_id.as_deref())
            .opt("planItemDefinitionId", self.plan_item_definition_id.as_deref())
            .opt(
                "planItemDefinitionType",
                self.plan_item_definition_type.as_deref(),
            )
            .opt("tenantId", self.tenant_id.as_deref())
            .page(&self.page)
    }
}

/// Actions that can be executed on a plan item instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanItemAction {
    /// Trigger a waiting plan item.
    Trigger,
    /// Enable a manually activated plan item.
    Enable,
    /// Disable an enabled plan item.
    Disable,
    /// Start an enabled plan item.
    Start,
}

impl PlanItemAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Start => "start",
        }
    }
}

/// CMMN plan item instances.
#[derive(Debug, Clone, Copy)]
pub struct PlanItemInstances<'a> {
    client: &'a Client,
}

impl<'a> PlanItemInstances<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", BASE, segment(id))
    }

    /// List plan item instances.
    pub async fn list(&self, query: &PlanItemInstanceQuery) -> Result<Page> {
        self.client.get_page(BASE, &query.to_query()).await
    }

    /// Get a plan item instance by id.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.get_json(&Self::path(id), &Query::new()).await
    }

    /// Execute an action on a plan item instance.
    pub async fn action(&self, id: &str, action: PlanItemAction) -> Result<Value> {
        self.client
            .put_json(&Self::path(id), json!({ "action": action.as_str() }))
            .await
    }

    /// Trigger a waiting plan item.
    pub async fn trigger(&self, id: &str) -> Result<Value> {
        self.action(id, PlanItemAction::Trigger).await
    }

    /// Enable a manually activated plan item.
    pub async fn enable(&self, id: &str) -> Result<Value> {
        self.action(id, PlanItemAction::Enable).await
    }

    /// Disable an enabled plan item.
    pub async fn disable(&self, id: &str) -> Result<Value> {
        self.action(id, PlanItemAction::Disable).await
    }

    /// Start an enabled plan item.
    pub async fn start(&self, id: &str) -> Result<Value> {
        self.action(id, PlanItemAction::Start).await
    }
}
