//! Typed async client for the Flowable BPMN/CMMN REST API.
//!
//! This crate wraps the REST endpoints of a Flowable server (`flowable-rest`)
//! and adds a small workflow layer on top of them.
//!
//! # Features
//!
//! - Basic-auth transport with status-code based error taxonomy
//! - Variable marshaling with type inference (`long`, `double`, `boolean`,
//!   `date`, `string`)
//! - Deployments, definitions, case/process instances, plan items,
//!   executions, tasks and history for both engines
//! - Multipart deployment upload
//! - `Case`, `Process`, `Task` and `Stage` helpers with task polling and
//!   handler dispatch
//!
//! # Example
//!
//! ```no_run
//! use flowable_client::{Client, ClientConfig, DeploymentUpload, variables};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::builder().host("localhost").build())?;
//!
//! // Deploy a case model
//! let deployment = client
//!     .cmmn_deployments()
//!     .create("order.cmmn", &DeploymentUpload::named("Order Process"))
//!     .await?;
//! println!("Deployed: {}", deployment["id"]);
//!
//! // Start a case
//! let instance = client
//!     .case_instances()
//!     .start_by_key(
//!         "orderCase",
//!         Some(variables([("amount", 500), ("priority", 2)])),
//!         Some("order-42"),
//!     )
//!     .await?;
//! println!("Started: {}", instance["id"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Connection settings can also come from `FLOWABLE_*` environment variables:
//!
//! ```no_run
//! # use flowable_client::Client;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::from_env()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, ClientError>`:
//!
//! ```no_run
//! # use flowable_client::{Client, ClientConfig, ClientError};
//! # async fn example() -> Result<(), ClientError> {
//! # let client = Client::new(ClientConfig::default())?;
//! match client.case_instances().get("ci-1").await {
//!     Ok(instance) => println!("Found: {}", instance["caseDefinitionId"]),
//!     Err(ClientError::NotFound { .. }) => println!("Case has ended"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod query;
mod resources;
mod response;
mod variables;
mod workflow;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ClientError, Result};
pub use query::{DateParam, Pagination, Query, SortOrder};
pub use resources::{
    ApiFamily, BpmnHistory, CaseDefinitionQuery, CaseDefinitions, CaseInstanceQuery,
    CaseInstances, CmmnHistory, DeploymentQuery, DeploymentUpload, Deployments, ExecutionAction,
    ExecutionQuery, Executions, HistoricActivityQuery, HistoricInstanceQuery, HistoricTaskQuery,
    HistoricVariableQuery, IdentityKind, PlanItemAction, PlanItemInstanceQuery,
    PlanItemInstances, ProcessDefinitionQuery, ProcessDefinitions, ProcessInstanceQuery,
    ProcessInstances, StartCaseInstance, StartProcessInstance, SuspensionOptions, TaskAction,
    TaskQuery, TaskUpdate, Tasks,
};
pub use response::{ApiResponse, Page, RequestBody};
pub use variables::{
    Variable, VariableScope, VariableType, VariableValue, variables, variables_to_map,
};
pub use workflow::{Case, Process, SnapshotPolicy, Stage, Task};

// Re-export for callers that pass their own `reqwest::Method` to `Client::request`.
pub use reqwest::Method;
