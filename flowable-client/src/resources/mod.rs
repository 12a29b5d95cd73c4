//! Thin wrappers over the Flowable REST resource groups.
//!
//! Each wrapper borrows the [`Client`](crate::Client) and owns one base path.
//! Methods map one-to-one onto REST endpoints.

mod case_definitions;
mod case_instances;
mod deployments;
mod executions;
mod history;
mod identity_links;
mod plan_items;
mod process_definitions;
mod process_instances;
mod tasks;
mod variable_store;

pub use case_definitions::{CaseDefinitionQuery, CaseDefinitions};
pub use case_instances::{CaseInstanceQuery, CaseInstances, StartCaseInstance};
pub use deployments::{DeploymentQuery, DeploymentUpload, Deployments};
pub use executions::{ExecutionAction, ExecutionQuery, Executions};
pub use history::{
    BpmnHistory, CmmnHistory, HistoricActivityQuery, HistoricInstanceQuery, HistoricTaskQuery,
    HistoricVariableQuery,
};
pub use plan_items::{PlanItemAction, PlanItemInstanceQuery, PlanItemInstances};
pub use process_definitions::{ProcessDefinitionQuery, ProcessDefinitions, SuspensionOptions};
pub use process_instances::{ProcessInstanceQuery, ProcessInstances, StartProcessInstance};
pub use tasks::{TaskAction, TaskQuery, TaskUpdate, Tasks};

use serde_json::Value;

/// Which engine API a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiFamily {
    /// Case management (`cmmn-api/...`).
    Cmmn,
    /// Process engine (`service/...`).
    Bpmn,
}

impl ApiFamily {
    /// Prefix of the repository API.
    pub fn repository(self) -> &'static str {
        match self {
            Self::Cmmn => "cmmn-api/cmmn-repository",
            Self::Bpmn => "service/repository",
        }
    }

    /// Prefix of the runtime API.
    pub fn runtime(self) -> &'static str {
        match self {
            Self::Cmmn => "cmmn-api/cmmn-runtime",
            Self::Bpmn => "service/runtime",
        }
    }

    /// Prefix of the history API.
    pub fn history(self) -> &'static str {
        match self {
            Self::Cmmn => "cmmn-api/cmmn-history",
            Self::Bpmn => "service/history",
        }
    }

    /// Prefix of the query API.
    pub fn query(self) -> &'static str {
        match self {
            Self::Cmmn => "cmmn-api/query",
            Self::Bpmn => "service/query",
        }
    }
}

/// Kind of identity in an identity link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// A single user.
    User,
    /// A group.
    Group,
}

impl IdentityKind {
    /// Path segment used by the identity link endpoints.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
        }
    }

    /// Body field naming the identity.
    pub(crate) fn body_field(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

/// Flatten a JSON answer that may be a single object or an array.
pub(crate) fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Expect a JSON array answer.
pub(crate) fn into_list(value: Value) -> crate::Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(crate::ClientError::InvalidResponse(format!(
            "expected a JSON array, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_family_prefixes() {
        assert_eq!(ApiFamily::Cmmn.repository(), "cmmn-api/cmmn-repository");
        assert_eq!(ApiFamily::Cmmn.runtime(), "cmmn-api/cmmn-runtime");
        assert_eq!(ApiFamily::Cmmn.history(), "cmmn-api/cmmn-history");
        assert_eq!(ApiFamily::Cmmn.query(), "cmmn-api/query");
        assert_eq!(ApiFamily::Bpmn.repository(), "service/repository");
        assert_eq!(ApiFamily::Bpmn.runtime(), "service/runtime");
        assert_eq!(ApiFamily::Bpmn.history(), "service/history");
        assert_eq!(ApiFamily::Bpmn.query(), "service/query");
    }

    #[test]
    fn test_flatten() {
        assert_eq!(flatten(json!({"name": "a"})), vec![json!({"name": "a"})]);
        assert_eq!(
            flatten(json!([{"name": "a"}, {"name": "b"}])),
            vec![json!({"name": "a"}), json!({"name": "b"})]
        );
        assert!(flatten(Value::Null).is_empty());
    }

    #[test]
    fn test_into_list_rejects_objects() {
        assert!(into_list(json!([])).unwrap().is_empty());
        assert!(into_list(json!({"data": []})).is_err());
    }
}
