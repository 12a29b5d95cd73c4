//! The `.../variables` collection below instances, executions and tasks.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::Query;
use crate::resources::{flatten, into_list};
use crate::variables::{Variable, VariableScope};
use bytes::Bytes;
use serde_json::Value;

pub(crate) struct VariableStore<'a> {
    client: &'a Client,
    path: String,
}

impl<'a> VariableStore<'a> {
    pub(crate) fn new(client: &'a Client, owner_path: &str) -> Self {
        Self {
            client,
            path: format!("{}/variables", owner_path),
        }
    }

    fn scoped(scope: Option<VariableScope>) -> Query {
        Query::new().opt("scope", scope.map(VariableScope::as_str))
    }

    fn item(&self, name: &str) -> String {
        format!("{}/{}", self.path, segment(name))
    }

    pub(crate) async fn list(&self, scope: Option<VariableScope>) -> Result<Vec<Value>> {
        into_list(self.client.get_json(&self.path, &Self::scoped(scope)).await?)
    }

    pub(crate) async fn get(&self, name: &str, scope: Option<VariableScope>) -> Result<Value> {
        self.client
            .get_json(&self.item(name), &Self::scoped(scope))
            .await
    }

    pub(crate) async fn data(&self, name: &str) -> Result<Bytes> {
        self.client
            .get_raw(&format!("{}/data", self.item(name)))
            .await
    }

    /// POST new variables. The server answers with one object or an array.
    pub(crate) async fn create(&self, variables: &[Variable]) -> Result<Vec<Value>> {
        let body = serde_json::to_value(variables)?;
        Ok(flatten(self.client.post_json(&self.path, body).await?))
    }

    /// PUT the whole collection, creating or updating each entry.
    pub(crate) async fn update_all(&self, variables: &[Variable]) -> Result<Vec<Value>> {
        let body = serde_json::to_value(variables)?;
        Ok(flatten(self.client.put_json(&self.path, body).await?))
    }

    /// PUT one existing variable.
    pub(crate) async fn update(&self, variable: &Variable) -> Result<Value> {
        let body = serde_json::to_value(variable)?;
        self.client.put_json(&self.item(&variable.name), body).await
    }

    pub(crate) async fn delete(&self, name: &str, scope: Option<VariableScope>) -> Result<()> {
        self.client
            .delete_empty(&self.item(name), &Self::scoped(scope))
            .await
    }

    pub(crate) async fn delete_all(&self) -> Result<()> {
        self.client.delete_empty(&self.path, &Query::new()).await
    }
}
