//! A view over a stage plan item of a running case.

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::resources::PlanItemInstanceQuery;
use serde_json::Value;

/// A stage plan item instance.
#[derive(Debug, Clone)]
pub struct Stage {
    client: Client,
    snapshot: Value,
}

impl Stage {
    /// Wrap a plan item instance representation.
    pub fn from_snapshot(client: Client, snapshot: Value) -> Self {
        Self { client, snapshot }
    }

    /// The last known representation.
    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.snapshot.get(name).and_then(Value::as_str)
    }

    /// Plan item instance id.
    pub fn id(&self) -> Option<&str> {
        self.field("id")
    }

    /// Stage name.
    pub fn name(&self) -> Option<&str> {
        self.field("name")
    }

    /// Plan item state (`active`, `completed`, `available`, ...).
    pub fn state(&self) -> Option<&str> {
        self.field("state")
    }

    /// Whether the stage is running.
    pub fn is_active(&self) -> bool {
        self.state() == Some("active")
    }

    /// Whether the stage has completed.
    pub fn is_completed(&self) -> bool {
        self.state() == Some("completed")
    }

    fn require_id(&self) -> Result<String> {
        self.id()
            .map(str::to_string)
            .ok_or(ClientError::NotLoaded("stage"))
    }

    /// Re-read the stage.
    pub async fn refresh(&mut self) -> Result<&Value> {
        let id = self.require_id()?;
        self.snapshot = self.client.plan_item_instances().get(&id).await?;
        Ok(&self.snapshot)
    }

    /// Plan items directly inside this stage.
    pub async fn plan_items(&self) -> Result<Vec<Value>> {
        let query = PlanItemInstanceQuery {
            stage_instance_id: Some(self.require_id()?),
            ..Default::default()
        };
        let page = self.client.plan_item_instances().list(&query).await?;
        Ok(page.data)
    }
}
