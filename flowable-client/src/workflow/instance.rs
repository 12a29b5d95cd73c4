//! State shared by the case and process wrappers.

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::resources::{ApiFamily, TaskQuery};
use crate::variables::{Variable, VariableValue, variables_to_map};
use crate::workflow::poll::{self, TaskHandlers};
use crate::workflow::task::Task;
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub(crate) struct Instance {
    pub(crate) client: Client,
    family: ApiFamily,
    kind: &'static str,
    snapshot: Option<Value>,
    handlers: TaskHandlers,
}

impl Instance {
    pub(crate) fn new(client: Client, family: ApiFamily, kind: &'static str) -> Self {
        Self {
            client,
            family,
            kind,
            snapshot: None,
            handlers: TaskHandlers::default(),
        }
    }

    pub(crate) fn snapshot(&self) -> Option<&Value> {
        self.snapshot.as_ref()
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: Value) -> &Value {
        self.snapshot.insert(snapshot)
    }

    pub(crate) fn clear(&mut self) {
        self.snapshot = None;
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.snapshot.as_ref()?.get(name)?.as_str()
    }

    pub(crate) fn id(&self) -> Option<&str> {
        self.field("id")
    }

    pub(crate) fn business_key(&self) -> Option<&str> {
        self.field("businessKey")
    }

    pub(crate) fn require_id(&self) -> Result<String> {
        self.id()
            .map(str::to_string)
            .ok_or(ClientError::NotLoaded(self.kind))
    }

    async fn instance_variables(&self, id: &str) -> Result<Vec<Value>> {
        match self.family {
            ApiFamily::Cmmn => self.client.case_instances().variables(id).await,
            ApiFamily::Bpmn => self.client.process_instances().variables(id).await,
        }
    }

    pub(crate) async fn variables(&self) -> Result<Map<String, Value>> {
        let id = self.require_id()?;
        Ok(variables_to_map(&self.instance_variables(&id).await?))
    }

    pub(crate) async fn variable(&self, name: &str) -> Result<Value> {
        let id = self.require_id()?;
        let variable = match self.family {
            ApiFamily::Cmmn => self.client.case_instances().variable(&id, name).await?,
            ApiFamily::Bpmn => self.client.process_instances().variable(&id, name).await?,
        };
        Ok(variable.get("value").cloned().unwrap_or(Value::Null))
    }

    pub(crate) async fn set_variables(&self, variables: &[Variable]) -> Result<Vec<Value>> {
        let id = self.require_id()?;
        match self.family {
            ApiFamily::Cmmn => {
                self.client
                    .case_instances()
                    .update_variables(&id, variables)
                    .await
            }
            ApiFamily::Bpmn => {
                self.client
                    .process_instances()
                    .update_variables(&id, variables)
                    .await
            }
        }
    }

    pub(crate) async fn set_variable(
        &self,
        name: &str,
        value: impl Into<VariableValue>,
    ) -> Result<Value> {
        let written = self.set_variables(&[Variable::new(name, value)]).await?;
        Ok(written.into_iter().next().unwrap_or(Value::Null))
    }

    fn task_query(&self, id: String, name: Option<&str>) -> TaskQuery {
        let mut query = TaskQuery {
            name: name.map(str::to_string),
            ..Default::default()
        };
        match self.family {
            ApiFamily::Cmmn => query.case_instance_id = Some(id),
            ApiFamily::Bpmn => query.process_instance_id = Some(id),
        }
        query
    }

    fn wrap(&self, snapshot: Value) -> Task {
        Task::from_snapshot(self.client.clone(), self.family, snapshot)
    }

    pub(crate) async fn tasks(&self) -> Result<Vec<Task>> {
        let query = self.task_query(self.require_id()?, None);
        let page = self.client.tasks(self.family).list(&query).await?;
        Ok(page.into_iter().map(|task| self.wrap(task)).collect())
    }

    pub(crate) async fn task(&self, name: &str) -> Result<Option<Task>> {
        let query = self.task_query(self.require_id()?, Some(name));
        let page = self.client.tasks(self.family).list(&query).await?;
        Ok(page.into_first().map(|task| self.wrap(task)))
    }

    pub(crate) async fn wait_for_task(
        &self,
        name: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<Task> {
        let query = self.task_query(self.require_id()?, Some(name));
        let tasks = self.client.tasks(self.family);
        let task = poll::wait_for_task(&tasks, &query, name, timeout, interval).await?;
        Ok(self.wrap(task))
    }

    pub(crate) fn on_task<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers.register(name, handler);
    }

    pub(crate) async fn process_tasks(&self) -> Result<usize> {
        if self.handlers.is_empty() {
            return Ok(0);
        }
        let mut handled = 0;
        for task in self.tasks().await? {
            if self.handlers.dispatch(task).await? {
                handled += 1;
            }
        }
        debug!(kind = self.kind, handled, "processed open tasks");
        Ok(handled)
    }
}
