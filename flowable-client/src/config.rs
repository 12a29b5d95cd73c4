//! Connection settings for a Flowable REST server.

use crate::error::{ClientError, Result};
use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_SCHEME: &str = "http";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_USERNAME: &str = "rest-admin";
const DEFAULT_PASSWORD: &str = "test";
const DEFAULT_CONTEXT_ROOT: &str = "flowable-rest";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable connection settings used to build a [`Client`](crate::Client).
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    scheme: String,
    host: String,
    port: u16,
    username: String,
    password: String,
    context_root: String,
    timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"****")
            .field("context_root", &self.context_root)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            context_root: DEFAULT_CONTEXT_ROOT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FLOWABLE_SCHEME`: "http" or "https"
    /// - `FLOWABLE_HOST`, `FLOWABLE_PORT`
    /// - `FLOWABLE_USER`, `FLOWABLE_PASSWORD`
    /// - `FLOWABLE_CONTEXT_ROOT`: defaults to "flowable-rest"
    /// - `FLOWABLE_TIMEOUT_SECS`: request timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns an error if the port or timeout is not a number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(scheme) = lookup("FLOWABLE_SCHEME") {
            builder = builder.scheme(scheme);
        }
        if let Some(host) = lookup("FLOWABLE_HOST") {
            builder = builder.host(host);
        }
        if let Some(port) = lookup("FLOWABLE_PORT") {
            let port = port.trim().parse::<u16>().map_err(|_| {
                ClientError::InvalidUrl(format!("FLOWABLE_PORT is not a valid port: {}", port))
            })?;
            builder = builder.port(port);
        }
        if let Some(user) = lookup("FLOWABLE_USER") {
            builder = builder.username(user);
        }
        if let Some(password) = lookup("FLOWABLE_PASSWORD") {
            builder = builder.password(password);
        }
        if let Some(root) = lookup("FLOWABLE_CONTEXT_ROOT") {
            builder = builder.context_root(root);
        }
        if let Some(secs) = lookup("FLOWABLE_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                ClientError::InvalidUrl(format!(
                    "FLOWABLE_TIMEOUT_SECS is not a number of seconds: {}",
                    secs
                ))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(builder.build())
    }

    /// URL scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Server host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Basic-auth user.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Basic-auth password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Web application context root, without slashes.
    pub fn context_root(&self) -> &str {
        &self.context_root
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Root URL every resource path is appended to, with a trailing slash.
    pub fn base_url(&self) -> String {
        let root = self.context_root.trim_matches('/');
        if root.is_empty() {
            format!("{}://{}:{}/", self.scheme, self.host, self.port)
        } else {
            format!("{}://{}:{}/{}/", self.scheme, self.host, self.port, root)
        }
    }
}

/// Builder for ClientConfig.
#[derive(Clone, Default)]
pub struct ClientConfigBuilder {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    context_root: Option<String>,
    timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("context_root", &self.context_root)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfigBuilder {
    /// Set the URL scheme ("http" or "https").
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Set the server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the Basic-auth user.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the Basic-auth password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the context root (e.g. "flowable-rest", or "" for none).
    pub fn context_root(mut self, root: impl Into<String>) -> Self {
        self.context_root = Some(root.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            scheme: self.scheme.unwrap_or(defaults.scheme),
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            username: self.username.unwrap_or(defaults.username),
            password: self.password.unwrap_or(defaults.password),
            context_root: self.context_root.unwrap_or(defaults.context_root),
            timeout: self.timeout.unwrap_or(defaults.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_debug_hides_password() {
        let config = ClientConfig::builder()
            .username("kermit")
            .password("s3cret-frog")
            .build();

        let printed = format!("{:?}", config);
        assert!(printed.contains("kermit"));
        assert!(!printed.contains("s3cret-frog"));

        let builder = ClientConfig::builder().password("s3cret-frog");
        assert!(!format!("{:?}", builder).contains("s3cret-frog"));

        let client = crate::Client::new(config).unwrap();
        assert!(!format!("{:?}", client).contains("s3cret-frog"));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8080/flowable-rest/");
        assert_eq!(config.username(), "rest-admin");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::builder()
            .scheme("https")
            .host("flowable.internal")
            .port(443)
            .context_root("/engine/")
            .build();
        assert_eq!(config.base_url(), "https://flowable.internal:443/engine/");
    }

    #[test]
    fn test_empty_context_root() {
        let config = ClientConfig::builder().context_root("").build();
        assert_eq!(config.base_url(), "http://localhost:8080/");
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("FLOWABLE_HOST", "flow.example.com"),
            ("FLOWABLE_PORT", "9090"),
            ("FLOWABLE_USER", "kermit"),
            ("FLOWABLE_PASSWORD", "kermit"),
            ("FLOWABLE_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let config =
            ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.host(), "flow.example.com");
        assert_eq!(config.port(), 9090);
        assert_eq!(config.username(), "kermit");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.scheme(), "http");
    }

    #[test]
    fn test_from_lookup_invalid_port() {
        let result = ClientConfig::from_lookup(|key| {
            (key == "FLOWABLE_PORT").then(|| "eighty".to_string())
        });
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }
}
