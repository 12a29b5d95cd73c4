//! Identity link endpoints shared by definitions, instances and tasks.

use crate::client::{Client, segment};
use crate::error::Result;
use crate::query::Query;
use crate::resources::{IdentityKind, into_list};
use serde_json::Value;

/// The `.../identitylinks` collection below one resource.
pub(crate) struct IdentityLinks<'a> {
    client: &'a Client,
    path: String,
}

impl<'a> IdentityLinks<'a> {
    pub(crate) fn new(client: &'a Client, owner_path: &str) -> Self {
        Self {
            client,
            path: format!("{}/identitylinks", owner_path),
        }
    }

    pub(crate) async fn list(&self) -> Result<Vec<Value>> {
        into_list(self.client.get_json(&self.path, &Query::new()).await?)
    }

    pub(crate) async fn list_kind(&self, kind: IdentityKind) -> Result<Vec<Value>> {
        let path = format!("{}/{}", self.path, kind.path_segment());
        into_list(self.client.get_json(&path, &Query::new()).await?)
    }

    pub(crate) async fn add(&self, body: Value) -> Result<Value> {
        self.client.post_json(&self.path, body).await
    }

    fn link_path(&self, kind: IdentityKind, identity_id: &str, link_type: Option<&str>) -> String {
        let mut path = format!(
            "{}/{}/{}",
            self.path,
            kind.path_segment(),
            segment(identity_id)
        );
        if let Some(link_type) = link_type {
            path.push('/');
            path.push_str(&segment(link_type));
        }
        path
    }

    /// Remove `.../identitylinks/{users|groups}/{identity}[/{type}]`.
    pub(crate) async fn remove(
        &self,
        kind: IdentityKind,
        identity_id: &str,
        link_type: Option<&str>,
    ) -> Result<()> {
        let path = self.link_path(kind, identity_id, link_type);
        self.client.delete_empty(&path, &Query::new()).await
    }

    pub(crate) async fn get(
        &self,
        kind: IdentityKind,
        identity_id: &str,
        link_type: Option<&str>,
    ) -> Result<Value> {
        let path = self.link_path(kind, identity_id, link_type);
        self.client.get_json(&path, &Query::new()).await
    }
}
