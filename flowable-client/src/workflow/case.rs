//! CMMN case instances as stateful objects.

use crate::client::Client;
use crate::error::Result;
use crate::resources::{ApiFamily, CaseInstanceQuery, PlanItemInstanceQuery};
use crate::variables::{Variable, VariableValue};
use crate::workflow::instance::Instance;
use crate::workflow::stage::Stage;
use crate::workflow::task::Task;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A case instance, started or loaded through this wrapper.
///
/// A fresh wrapper holds no instance. [`start`](Self::start),
/// [`load`](Self::load) or [`find_by_business_key`](Self::find_by_business_key)
/// attach one; [`delete`](Self::delete) detaches it again. Operations that
/// need an instance fail with [`ClientError::NotLoaded`](crate::ClientError::NotLoaded)
/// while none is attached.
///
/// # Example
///
/// ```no_run
/// # use flowable_client::{Case, Client, ClientConfig, variables};
/// # use std::time::Duration;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let client = Client::new(ClientConfig::default())?;
/// let mut case = Case::new(client);
/// case.start("orderCase", Some(variables([("amount", 500)])), None)
///     .await?;
///
/// let mut review = case
///     .wait_for_task("Review order", Duration::from_secs(10), Duration::from_millis(500))
///     .await?;
/// review.claim("kermit").await?;
/// review.complete(None, Some("approve")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Case {
    inner: Instance,
}

impl Case {
    /// A wrapper with no instance attached.
    pub fn new(client: Client) -> Self {
        Self {
            inner: Instance::new(client, ApiFamily::Cmmn, "case instance"),
        }
    }

    /// Start the latest definition with `key` and attach the new instance.
    pub async fn start(
        &mut self,
        key: &str,
        variables: Option<Vec<Variable>>,
        business_key: Option<&str>,
    ) -> Result<&Value> {
        let started = self
            .inner
            .client
            .case_instances()
            .start_by_key(key, variables, business_key)
            .await?;
        debug!(key, id = ?started.get("id"), "case started");
        Ok(self.inner.set_snapshot(started))
    }

    /// Attach an existing instance.
    pub async fn load(&mut self, id: &str) -> Result<&Value> {
        let snapshot = self.inner.client.case_instances().get(id).await?;
        Ok(self.inner.set_snapshot(snapshot))
    }

    /// Attach the first running instance with `business_key`.
    ///
    /// Returns `false` and leaves the wrapper empty when none matches.
    pub async fn find_by_business_key(&mut self, business_key: &str) -> Result<bool> {
        let query = CaseInstanceQuery {
            business_key: Some(business_key.to_string()),
            ..Default::default()
        };
        let page = self.inner.client.case_instances().list(&query).await?;
        match page.into_first() {
            Some(snapshot) => {
                self.inner.set_snapshot(snapshot);
                Ok(true)
            }
            None => {
                self.inner.clear();
                Ok(false)
            }
        }
    }

    /// Whether an instance is attached.
    pub fn is_loaded(&self) -> bool {
        self.inner.snapshot().is_some()
    }

    /// The last known representation.
    pub fn snapshot(&self) -> Option<&Value> {
        self.inner.snapshot()
    }

    /// Instance id.
    pub fn id(&self) -> Option<&str> {
        self.inner.id()
    }

    /// Business key.
    pub fn business_key(&self) -> Option<&str> {
        self.inner.business_key()
    }

    /// Re-read the attached instance.
    pub async fn refresh(&mut self) -> Result<&Value> {
        let id = self.inner.require_id()?;
        let snapshot = self.inner.client.case_instances().get(&id).await?;
        Ok(self.inner.set_snapshot(snapshot))
    }

    /// Delete the instance and detach it.
    pub async fn delete(&mut self) -> Result<()> {
        let id = self.inner.require_id()?;
        self.inner.client.case_instances().delete(&id).await?;
        self.inner.clear();
        Ok(())
    }

    /// Variables as a `name -> value` map.
    pub async fn variables(&self) -> Result<Map<String, Value>> {
        self.inner.variables().await
    }

    /// Value of one variable.
    pub async fn variable(&self, name: &str) -> Result<Value> {
        self.inner.variable(name).await
    }

    /// Create or update one variable.
    pub async fn set_variable(&self, name: &str, value: impl Into<VariableValue>) -> Result<Value> {
        self.inner.set_variable(name, value).await
    }

    /// Create or update several variables.
    pub async fn set_variables(&self, variables: &[Variable]) -> Result<Vec<Value>> {
        self.inner.set_variables(variables).await
    }

    /// Open tasks of the instance.
    pub async fn tasks(&self) -> Result<Vec<Task>> {
        self.inner.tasks().await
    }

    /// The open task called `name`, if any.
    pub async fn task(&self, name: &str) -> Result<Option<Task>> {
        self.inner.task(name).await
    }

    /// Poll until a task called `name` exists. Polls are at least 50ms apart
    /// whatever `interval` says.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TaskTimeout`](crate::ClientError::TaskTimeout)
    /// if the task did not show up within `timeout`.
    pub async fn wait_for_task(
        &self,
        name: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Task> {
        self.inner.wait_for_task(name, timeout, interval).await
    }

    /// Register a handler for open tasks called `name`.
    pub fn on_task<F, Fut>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.on_task(name, handler);
        self
    }

    /// Run registered handlers over the open tasks. Returns how many ran.
    pub async fn process_tasks(&self) -> Result<usize> {
        self.inner.process_tasks().await
    }

    async fn stage_items(&self, state: Option<&str>) -> Result<Vec<Stage>> {
        let query = PlanItemInstanceQuery {
            case_instance_id: Some(self.inner.require_id()?),
            plan_item_definition_type: Some("stage".to_string()),
            state: state.map(str::to_string),
            ..Default::default()
        };
        let page = self.inner.client.plan_item_instances().list(&query).await?;
        Ok(page
            .into_iter()
            .map(|item| Stage::from_snapshot(self.inner.client.clone(), item))
            .collect())
    }

    /// All stages of the case.
    pub async fn stages(&self) -> Result<Vec<Stage>> {
        self.stage_items(None).await
    }

    /// Stages that are currently running.
    pub async fn active_stages(&self) -> Result<Vec<Stage>> {
        self.stage_items(Some("active")).await
    }

    /// The server's stage overview.
    pub async fn stage_overview(&self) -> Result<Vec<Value>> {
        let id = self.inner.require_id()?;
        self.inner.client.case_instances().stage_overview(&id).await
    }

    /// The historic record of the instance, also available after it ended.
    pub async fn history(&self) -> Result<Value> {
        let id = self.inner.require_id()?;
        self.inner
            .client
            .cmmn_history()
            .historic_case_instance(&id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;

    #[tokio::test]
    async fn test_unloaded_case() {
        let case = Case::new(Client::new(ClientConfig::default()).unwrap());
        assert!(!case.is_loaded());
        assert!(case.id().is_none());

        let result = case.variables().await;
        assert!(matches!(result, Err(ClientError::NotLoaded("case instance"))));

        let result = case.stages().await;
        assert!(matches!(result, Err(ClientError::NotLoaded(_))));
    }
}
