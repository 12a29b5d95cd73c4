//! Execution operations.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{Pagination, Query};
use crate::resources::into_list;
use crate::resources::variable_store::VariableStore;
use crate::response::{Page, RequestBody};
use crate::variables::{Variable, VariableScope};
use serde_json::{Map, Value, json};

const BASE: &str = "service/runtime/executions";
const QUERY: &str = "service/query/executions";

/// Filters for listing executions.
#[derive(Debug, Clone, Default)]
pub struct ExecutionQuery {
    /// Execution id.
    pub id: Option<String>,
    /// Activity the execution waits in.
    pub activity_id: Option<String>,
    /// Process definition key.
    pub process_definition_key: Option<String>,
    /// Process definition id.
    pub process_definition_id: Option<String>,
    /// Owning process instance.
    pub process_instance_id: Option<String>,
    /// Subscribed to this message.
    pub message_event_subscription_name: Option<String>,
    /// Subscribed to this signal.
    pub signal_event_subscription_name: Option<String>,
    /// Parent execution.
    pub parent_id: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl ExecutionQuery {
    /// Executions of one process instance.
    pub fn for_instance(process_instance_id: impl Into<String>) -> Self {
        Self {
            process_instance_id: Some(process_instance_id.into()),
            ..Default::default()
        }
    }

    fn to_query(&self) -> Query {
        Query::new()
            .opt("id", self.id.as_deref())
            .opt("activityId", self.activity_id.as_deref())
            .opt("processDefinitionKey", self.process_definition_key.as_deref())
            .opt("processDefinitionId", self.process_definition_id.as_deref())
            .opt("processInstanceId", self.process_instance_id.as_deref())
            .opt(
                "messageEventSubscriptionName",
                self.message_event_subscription_name.as_deref(),
            )
            .opt(
                "signalEventSubscriptionName",
                self.signal_event_subscription_name.as_deref(),
            )
            .opt("parentId", self.parent_id.as_deref())
            .opt("tenantId", self.tenant_id.as_deref())
            .page(&self.page)
    }
}

/// Action executed on a waiting execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    /// Signal a receive task or intermediate catch.
    Signal {
        /// Variables passed along. `None` omits the field.
        variables: Option<Vec<Variable>>,
    },
    /// Trigger a waiting execution.
    Trigger {
        /// Variables passed along. `None` omits the field.
        variables: Option<Vec<Variable>>,
    },
    /// Deliver a named signal event.
    SignalEventReceived {
        /// Signal name.
        signal_name: String,
        /// Variables passed along. `None` omits the field.
        variables: Option<Vec<Variable>>,
    },
    /// Deliver a named message event.
    MessageEventReceived {
        /// Message name.
        message_name: String,
        /// Variables passed along. `None` omits the field.
        variables: Option<Vec<Variable>>,
    },
}

impl ExecutionAction {
    fn body(&self) -> Result<Value> {
        let mut body = Map::new();
        let variables = match self {
            Self::Signal { variables } => {
                body.insert("action".to_string(), json!("signal"));
                variables
            }
            Self::Trigger { variables } => {
                body.insert("action".to_string(), json!("trigger"));
                variables
            }
            Self::SignalEventReceived {
                signal_name,
                variables,
            } => {
                body.insert("action".to_string(), json!("signalEventReceived"));
                body.insert("signalName".to_string(), json!(signal_name));
                variables
            }
            Self::MessageEventReceived {
                message_name,
                variables,
            } => {
                body.insert("action".to_string(), json!("messageEventReceived"));
                body.insert("messageName".to_string(), json!(message_name));
                variables
            }
        };
        if let Some(variables) = variables {
            body.insert("variables".to_string(), serde_json::to_value(variables)?);
        }
        Ok(Value::Object(body))
    }
}

/// BPMN executions.
#[derive(Debug, Clone, Copy)]
pub struct Executions<'a> {
    client: &'a Client,
}

impl<'a> Executions<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", BASE, segment(id))
    }

    /// List executions.
    pub async fn list(&self, query: &ExecutionQuery) -> Result<Page> {
        self.client.get_page(BASE, &query.to_query()).await
    }

    /// Get an execution by id.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.get_json(&Self::path(id), &Query::new()).await
    }

    /// Execute an action. Returns `Value::Bool(true)` when the execution
    /// ended and the server answered without content.
    pub async fn action(&self, id: &str, action: &ExecutionAction) -> Result<Value> {
        self.client.put_json(&Self::path(id), action.body()?).await
    }

    /// Signal a waiting execution.
    pub async fn signal(&self, id: &str, variables: Option<Vec<Variable>>) -> Result<Value> {
        self.action(id, &ExecutionAction::Signal { variables }).await
    }

    /// Trigger a waiting execution.
    pub async fn trigger(&self, id: &str, variables: Option<Vec<Variable>>) -> Result<Value> {
        self.action(id, &ExecutionAction::Trigger { variables }).await
    }

    /// Deliver a signal event to an execution.
    pub async fn signal_event_received(
        &self,
        id: &str,
        signal_name: &str,
        variables: Option<Vec<Variable>>,
    ) -> Result<Value> {
        let action = ExecutionAction::SignalEventReceived {
            signal_name: signal_name.to_string(),
            variables,
        };
        self.action(id, &action).await
    }

    /// Deliver a message event to an execution.
    pub async fn message_event_received(
        &self,
        id: &str,
        message_name: &str,
        variables: Option<Vec<Variable>>,
    ) -> Result<Value> {
        let action = ExecutionAction::MessageEventReceived {
            message_name: message_name.to_string(),
            variables,
        };
        self.action(id, &action).await
    }

    /// Ids of the activities the execution is active in.
    pub async fn activities(&self, id: &str) -> Result<Vec<Value>> {
        let path = format!("{}/activities", Self::path(id));
        into_list(self.client.get_json(&path, &Query::new()).await?)
    }

    fn store(&self, id: &str) -> VariableStore<'a> {
        VariableStore::new(self.client, &Self::path(id))
    }

    /// Variables visible to an execution.
    pub async fn variables(&self, id: &str, scope: Option<VariableScope>) -> Result<Vec<Value>> {
        self.store(id).list(scope).await
    }

    /// Create new variables on an execution.
    pub async fn create_variables(&self, id: &str, variables: &[Variable]) -> Result<Vec<Value>> {
        self.store(id).create(variables).await
    }

    /// Create or update variables on an execution.
    pub async fn update_variables(&self, id: &str, variables: &[Variable]) -> Result<Vec<Value>> {
        self.store(id).update_all(variables).await
    }

    /// Query executions with a JSON body.
    pub async fn query(&self, body: impl Into<RequestBody>) -> Result<Page> {
        self.client.post(QUERY, body).await?.deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_without_variables() {
        let body = ExecutionAction::Signal { variables: None }.body().unwrap();
        assert_eq!(body, json!({"action": "signal"}));
    }

    #[test]
    fn test_trigger_with_empty_variables() {
        let body = ExecutionAction::Trigger {
            variables: Some(Vec::new()),
        }
        .body()
        .unwrap();
        assert_eq!(body, json!({"action": "trigger", "variables": []}));
    }

    #[test]
    fn test_message_event_body() {
        let body = ExecutionAction::MessageEventReceived {
            message_name: "paymentReceived".to_string(),
            variables: Some(vec![Variable::new("amount", 12.5)]),
        }
        .body()
        .unwrap();
        assert_eq!(
            body,
            json!({
                "action": "messageEventReceived",
                "messageName": "paymentReceived",
                "variables": [{"name": "amount", "value": 12.5, "type": "double"}]
            })
        );
    }

    #[test]
    fn test_for_instance_query() {
        let query = ExecutionQuery::for_instance("pi-1").to_query();
        assert_eq!(query.get("processInstanceId"), Some("pi-1"));
        assert_eq!(query.pairs().len(), 1);
    }
}
