//! Core Flowable client implementation.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::query::Query;
use crate::resources::{
    ApiFamily, BpmnHistory, CaseDefinitions, CaseInstances, CmmnHistory, Deployments, Executions,
    PlanItemInstances, ProcessDefinitions, ProcessInstances, Tasks,
};
use crate::response::{ApiResponse, Page, RequestBody, extract_error_message};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, trace};

/// A client for interacting with the Flowable REST API.
///
/// The client owns its configuration and a pooled HTTP client, so cloning
/// it is cheap. Resource wrappers are obtained from accessor methods.
///
/// # Example
///
/// ```no_run
/// use flowable_client::{Client, ClientConfig, variables};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new(
///     ClientConfig::builder()
///         .host("localhost")
///         .port(8080)
///         .username("rest-admin")
///         .password("test")
///         .build(),
/// )?;
///
/// let instance = client
///     .case_instances()
///     .start_by_key("orderCase", Some(variables([("amount", 500)])), None)
///     .await?;
/// println!("Started {}", instance["id"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    /// Connection settings.
    config: ClientConfig,
    /// Root URL with trailing slash, derived from the config.
    base_url: String,
    /// HTTP client.
    http: HttpClient,
}

impl Client {
    /// Create a new Flowable client.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme is not http/https or the HTTP client
    /// cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.scheme() != "http" && config.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "scheme must be http or https, got: {}",
                config.scheme()
            )));
        }
        if config.host().is_empty() {
            return Err(ClientError::InvalidUrl("host must not be empty".to_string()));
        }

        let http = HttpClient::builder().timeout(config.timeout()).build()?;
        let base_url = config.base_url();

        Ok(Self {
            config,
            base_url,
            http,
        })
    }

    /// Create a client configured from `FLOWABLE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// CMMN deployments.
    pub fn cmmn_deployments(&self) -> Deployments<'_> {
        Deployments::new(self, ApiFamily::Cmmn)
    }

    /// BPMN deployments.
    pub fn bpmn_deployments(&self) -> Deployments<'_> {
        Deployments::new(self, ApiFamily::Bpmn)
    }

    /// CMMN case definitions.
    pub fn case_definitions(&self) -> CaseDefinitions<'_> {
        CaseDefinitions::new(self)
    }

    /// BPMN process definitions.
    pub fn process_definitions(&self) -> ProcessDefinitions<'_> {
        ProcessDefinitions::new(self)
    }

    /// Running CMMN case instances.
    pub fn case_instances(&self) -> CaseInstances<'_> {
        CaseInstances::new(self)
    }

    /// Running BPMN process instances.
    pub fn process_instances(&self) -> ProcessInstances<'_> {
        ProcessInstances::new(self)
    }

    /// CMMN plan item instances.
    pub fn plan_item_instances(&self) -> PlanItemInstances<'_> {
        PlanItemInstances::new(self)
    }

    /// Tasks of the given engine.
    pub fn tasks(&self, family: ApiFamily) -> Tasks<'_> {
        Tasks::new(self, family)
    }

    /// CMMN tasks.
    pub fn cmmn_tasks(&self) -> Tasks<'_> {
        self.tasks(ApiFamily::Cmmn)
    }

    /// BPMN tasks.
    pub fn bpmn_tasks(&self) -> Tasks<'_> {
        self.tasks(ApiFamily::Bpmn)
    }

    /// BPMN executions.
    pub fn executions(&self) -> Executions<'_> {
        Executions::new(self)
    }

    /// CMMN history.
    pub fn cmmn_history(&self) -> CmmnHistory<'_> {
        CmmnHistory::new(self)
    }

    /// BPMN history.
    pub fn bpmn_history(&self) -> BpmnHistory<'_> {
        BpmnHistory::new(self)
    }

    /// Build a full URL from a resource path.
    pub(crate) fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}{}", self.base_url, path)
    }

    /// Add authentication headers to a request.
    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(self.config.username(), Some(self.config.password()))
    }

    /// Execute a request and classify its response.
    ///
    /// Query parameters are only attached when non-empty. A raw string body is
    /// sent verbatim.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "sending request");

        let mut request = self.with_auth(self.http.request(method, &url));
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        request = match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Raw(raw)) => request
                .header(CONTENT_TYPE, "application/json")
                .body(raw),
            None => request,
        };

        let response = request.send().await.map_err(ClientError::Http)?;
        self.handle_response(response).await
    }

    /// Execute a GET request.
    pub async fn get(&self, path: &str, query: &Query) -> Result<ApiResponse> {
        self.request(Method::GET, path, query, None).await
    }

    /// Execute a POST request.
    pub async fn post(&self, path: &str, body: impl Into<RequestBody>) -> Result<ApiResponse> {
        self.request(Method::POST, path, &Query::new(), Some(body.into()))
            .await
    }

    /// Execute a PUT request.
    pub async fn put(&self, path: &str, body: impl Into<RequestBody>) -> Result<ApiResponse> {
        self.request(Method::PUT, path, &Query::new(), Some(body.into()))
            .await
    }

    /// Execute a DELETE request.
    pub async fn delete(&self, path: &str, query: &Query) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, query, None).await
    }

    /// GET a JSON document.
    pub(crate) async fn get_json(&self, path: &str, query: &Query) -> Result<Value> {
        self.get(path, query).await?.into_json()
    }

    /// GET a paginated list.
    pub(crate) async fn get_page(&self, path: &str, query: &Query) -> Result<Page> {
        self.get(path, query).await?.deserialize()
    }

    /// GET a binary or XML resource.
    pub(crate) async fn get_raw(&self, path: &str) -> Result<Bytes> {
        self.get(path, &Query::new()).await?.into_bytes()
    }

    /// POST and return the JSON answer.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
    ) -> Result<Value> {
        self.post(path, body).await?.into_json()
    }

    /// PUT and return the JSON answer.
    pub(crate) async fn put_json(&self, path: &str, body: impl Into<RequestBody>) -> Result<Value> {
        self.put(path, body).await?.into_json()
    }

    /// DELETE, discarding any body.
    pub(crate) async fn delete_empty(&self, path: &str, query: &Query) -> Result<()> {
        self.delete(path, query).await.map(|_| ())
    }

    /// Upload a file as `multipart/form-data`.
    ///
    /// The file goes into a part named `file`; every entry of `fields` becomes
    /// a text part.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the file cannot be read.
    pub async fn upload(
        &self,
        path: &str,
        file_path: impl AsRef<Path>,
        fields: &[(&str, String)],
    ) -> Result<ApiResponse> {
        let file_path = file_path.as_ref();
        let data = tokio::fs::read(file_path)
            .await
            .map_err(|source| ClientError::Io {
                path: file_path.display().to_string(),
                source,
            })?;

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = guess_content_type(file_path);

        let part = Part::bytes(data)
            .file_name(file_name.clone())
            .mime_str(&content_type)?;
        let mut form = Form::new().part("file", part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.clone());
        }

        let url = self.url(path);
        debug!(url = %url, file = %file_name, content_type = %content_type, "uploading file");

        let request = self.with_auth(self.http.post(&url)).multipart(form);
        let response = request.send().await.map_err(ClientError::Http)?;
        self.handle_response(response).await
    }

    /// Turn a response into an [`ApiResponse`] or a status error.
    pub(crate) async fn handle_response(&self, response: Response) -> Result<ApiResponse> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(ClientError::Http)?;

        if status.is_success() {
            trace!(status = status.as_u16(), bytes = body.len(), "received response");
            ApiResponse::classify(status.as_u16(), content_type.as_deref(), body)
        } else {
            let text = String::from_utf8_lossy(&body);
            let message = extract_error_message(&text, status.canonical_reason());
            debug!(status = status.as_u16(), message = %message, "request failed");
            Err(ClientError::from_status(status.as_u16(), message))
        }
    }
}

/// Encode an identifier for use as a single path segment.
pub(crate) fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// Content type for an uploaded deployment resource.
pub(crate) fn guess_content_type(path: &Path) -> String {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("bpmn" | "cmmn" | "dmn" | "xml") => "text/xml".to_string(),
        Some("zip" | "bar") => "application/zip".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = Client::new(ClientConfig::default()).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/flowable-rest/");
        assert_eq!(client.config().username(), "rest-admin");
    }

    #[test]
    fn test_client_invalid_scheme() {
        let result = Client::new(ClientConfig::builder().scheme("ftp").build());
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_client_empty_host() {
        let result = Client::new(ClientConfig::builder().host("").build());
        assert!(result.is_err());
    }

    #[test]
    fn test_url_building() {
        let client = Client::new(ClientConfig::default()).unwrap();
        assert_eq!(
            client.url("cmmn-api/cmmn-repository/deployments"),
            "http://localhost:8080/flowable-rest/cmmn-api/cmmn-repository/deployments"
        );
        assert_eq!(
            client.url("/service/runtime/tasks"),
            "http://localhost:8080/flowable-rest/service/runtime/tasks"
        );
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("abc-123"), "abc-123");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("order.cmmn")), "text/xml");
        assert_eq!(guess_content_type(Path::new("/tmp/Order.BPMN")), "text/xml");
        assert_eq!(guess_content_type(Path::new("bundle.bar")), "application/zip");
        assert_eq!(guess_content_type(Path::new("diagram.png")), "image/png");
        assert_eq!(
            guess_content_type(Path::new("no-extension")),
            "application/octet-stream"
        );
    }
}
