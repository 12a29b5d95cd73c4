//! BPMN process instances as stateful objects.

use crate::client::Client;
use crate::error::Result;
use crate::resources::{ApiFamily, ExecutionQuery, ProcessInstanceQuery};
use crate::variables::{Variable, VariableValue};
use crate::workflow::instance::Instance;
use crate::workflow::task::Task;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A process instance, started or loaded through this wrapper.
///
/// Follows the same attach/detach rules as [`Case`](crate::Case).
#[derive(Debug)]
pub struct Process {
    inner: Instance,
}

impl Process {
    /// A wrapper with no instance attached.
    pub fn new(client: Client) -> Self {
        Self {
            inner: Instance::new(client, ApiFamily::Bpmn, "process instance"),
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
            .process_instances()
            .start_by_key(key, variables, business_key)
            .await?;
        debug!(key, id = ?started.get("id"), "process started");
        Ok(self.inner.set_snapshot(started))
    }

    /// Attach an existing instance.
    pub async fn load(&mut self, id: &str) -> Result<&Value> {
        let snapshot = self.inner.client.process_instances().get(id).await?;
        Ok(self.inner.set_snapshot(snapshot))
    }

    /// Attach the first running instance with `business_key`.
    ///
    /// Returns `false` and leaves the wrapper empty when none matches.
    pub async fn find_by_business_key(&mut self, business_key: &str) -> Result<bool> {
        let query = ProcessInstanceQuery {
            business_key: Some(business_key.to_string()),
            ..Default::default()
        };
        let page = self.inner.client.process_instances().list(&query).await?;
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

    /// Whether the attached instance is suspended.
    pub fn is_suspended(&self) -> bool {
        self.inner
            .snapshot()
            .and_then(|s| s.get("suspended"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Re-read the attached instance.
    pub async fn refresh(&mut self) -> Result<&Value> {
        let id = self.inner.require_id()?;
        let snapshot = self.inner.client.process_instances().get(&id).await?;
        Ok(self.inner.set_snapshot(snapshot))
    }

    /// Delete the instance and detach it.
    pub async fn delete(&mut self, delete_reason: Option<&str>) -> Result<()> {
        let id = self.inner.require_id()?;
        self.inner
            .client
            .process_instances()
            .delete(&id, delete_reason)
            .await?;
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

    /// Poll until a task called `name` exists. Polls are at least 50ms apart.
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

    /// Executions of the instance.
    pub async fn executions(&self) -> Result<Vec<Value>> {
        let query = ExecutionQuery::for_instance(self.inner.require_id()?);
        Ok(self.inner.client.executions().list(&query).await?.data)
    }

    /// Suspend the instance.
    pub async fn suspend(&mut self) -> Result<&Value> {
        let id = self.inner.require_id()?;
        let answer = self.inner.client.process_instances().suspend(&id).await?;
        self.settle(answer).await
    }

    /// Resume a suspended instance.
    pub async fn activate(&mut self) -> Result<&Value> {
        let id = self.inner.require_id()?;
        let answer = self.inner.client.process_instances().activate(&id).await?;
        self.settle(answer).await
    }

    /// Take an action's answer as the new snapshot, or re-read the instance
    /// when the server answered without a representation.
    async fn settle(&mut self, answer: Value) -> Result<&Value> {
        if answer.is_object() {
            Ok(self.inner.set_snapshot(answer))
        } else {
            self.refresh().await
        }
    }

    /// The historic record of the instance, also available after it ended.
    pub async fn history(&self) -> Result<Value> {
        let id = self.inner.require_id()?;
        self.inner
            .client
            .bpmn_history()
            .historic_process_instance(&id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;

    #[tokio::test]
    async fn test_delete_requires_instance() {
        let mut process = Process::new(Client::new(ClientConfig::default()).unwrap());
        let result = process.delete(None).await;
        assert!(matches!(result, Err(ClientError::NotLoaded("process instance"))));
        assert!(!process.is_suspended());
    }
}
