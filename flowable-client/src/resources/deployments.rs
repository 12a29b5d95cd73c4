//! Deployment management operations.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::{Pagination, Query};
use crate::resources::{ApiFamily, into_list};
use crate::response::Page;
use bytes::Bytes;
use serde_json::Value;
use std::path::Path;

/// Filters for listing deployments.
#[derive(Debug, Clone, Default)]
pub struct DeploymentQuery {
    /// Exact deployment name.
    pub name: Option<String>,
    /// Name pattern (`%` wildcards).
    pub name_like: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Exclude a category.
    pub category_not_equals: Option<String>,
    /// Parent deployment id.
    pub parent_deployment_id: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Only deployments without tenant.
    pub without_tenant_id: Option<bool>,
    /// Paging and sorting.
    pub page: Pagination,
}

impl DeploymentQuery {
    fn to_query(&self) -> Query {
        Query::new()
            .opt("name", self.name.as_deref())
            .opt("nameLike", self.name_like.as_deref())
            .opt("category", self.category.as_deref())
            .opt("categoryNotEquals", self.category_not_equals.as_deref())
            .opt("parentDeploymentId", self.parent_deployment_id.as_deref())
            .opt("tenantId", self.tenant_id.as_deref())
            .opt("withoutTenantId", self.without_tenant_id)
            .page(&self.page)
    }
}

/// Extra form fields sent along with a deployment file.
#[derive(Debug, Clone, Default)]
pub struct DeploymentUpload {
    /// Deployment name, sent as `deploymentName`.
    pub name: Option<String>,
    /// Tenant id.
    pub tenant_id: Option<String>,
    /// Deployment category.
    pub category: Option<String>,
}

impl DeploymentUpload {
    /// Upload with just a deployment name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        [
            ("deploymentName", &self.name),
            ("tenantId", &self.tenant_id),
            ("category", &self.category),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }
}

/// Deployments of either engine.
#[derive(Debug, Clone)]
pub struct Deployments<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> Deployments<'a> {
    pub(crate) fn new(client: &'a Client, family: ApiFamily) -> Self {
        Self {
            client,
            base: format!("{}/deployments", family.repository()),
        }
    }

    fn path(&self, id: &str) -> String {
        format!("{}/{}", self.base, segment(id))
    }

    /// List deployments.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list(&self, query: &DeploymentQuery) -> Result<Page> {
        self.client.get_page(&self.base, &query.to_query()).await
    }

    /// Get a single deployment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`](crate::ClientError::NotFound) if the
    /// deployment does not exist.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.client.get_json(&self.path(id), &Query::new()).await
    }

    /// Deploy a file (`.bpmn`, `.cmmn`, `.zip`, ...).
    ///
    /// The server's JSON answer is returned as is.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use flowable_client::{Client, ClientConfig, DeploymentUpload};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = Client::new(ClientConfig::default())?;
    /// let deployment = client
    ///     .cmmn_deployments()
    ///     .create("order.cmmn", &DeploymentUpload::named("Order Process"))
    ///     .await?;
    /// println!("Deployed {}", deployment["id"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(
        &self,
        file_path: impl AsRef<Path>,
        upload: &DeploymentUpload,
    ) -> Result<Value> {
        self.client
            .upload(&self.base, file_path, &upload.fields())
            .await?
            .into_json()
    }

    /// Delete a deployment.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete_empty(&self.path(id), &Query::new()).await
    }

    /// List the resources of a deployment.
    pub async fn resources(&self, id: &str) -> Result<Vec<Value>> {
        let path = format!("{}/resources", self.path(id));
        into_list(self.client.get_json(&path, &Query::new()).await?)
    }

    /// Metadata of one deployment resource.
    pub async fn resource(&self, id: &str, resource_id: &str) -> Result<Value> {
        let path = format!("{}/resources/{}", self.path(id), segment(resource_id));
        self.client.get_json(&path, &Query::new()).await
    }

    /// Raw content of one deployment resource.
    pub async fn resource_data(&self, id: &str, resource_id: &str) -> Result<Bytes> {
        let path = format!("{}/resourcedata/{}", self.path(id), segment(resource_id));
        self.client.get_raw(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_fields_only_set_values() {
        let upload = DeploymentUpload {
            name: Some("Order Process".to_string()),
            tenant_id: None,
            category: Some("sales".to_string()),
        };
        assert_eq!(
            upload.fields(),
            vec![
                ("deploymentName", "Order Process".to_string()),
                ("category", "sales".to_string()),
            ]
        );
        assert!(DeploymentUpload::default().fields().is_empty());
    }

    #[test]
    fn test_query_params() {
        let query = DeploymentQuery {
            name_like: Some("Order%".to_string()),
            without_tenant_id: Some(true),
            ..Default::default()
        }
        .to_query();
        assert_eq!(query.get("nameLike"), Some("Order%"));
        assert_eq!(query.get("withoutTenantId"), Some("true"));
        assert_eq!(query.pairs().len(), 2);
    }
}
