use std::time::Duration;

use crate::errors::ClientError;
use crate::model::HandlerId;

const DEFAULT_API_ORIGIN: &str = "http://localhost:4501";
const DEFAULT_UPLOAD_SERVER: &str = "http://localhost:8000";

/// Environment variable holding the deployment name.
pub const DEPLOYMENT_NAME_ENV: &str = "LLAMA_DEPLOY_DEPLOYMENT_NAME";
/// Environment variable overriding the API origin.
pub const API_ORIGIN_ENV: &str = "LLAMA_DEPLOY_API_ORIGIN";

/// Configuration for the deployment-scoped workflow client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Scheme and host of the API server, without a trailing path.
    pub api_origin: String,
    /// Deployment the workflows are served from.
    pub deployment_name: String,
    /// HTTP timeout for handler creation and status requests.
    ///
    /// Event subscriptions are not bounded by this timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a config for the given deployment with default origin and timeout.
    pub fn new(deployment_name: impl Into<String>) -> Self {
        Self {
            api_origin: DEFAULT_API_ORIGIN.to_string(),
            deployment_name: deployment_name.into(),
            timeout: Duration::from_secs(600),
        }
    }

    /// Builds a config from `LLAMA_DEPLOY_DEPLOYMENT_NAME` and the optional
    /// `LLAMA_DEPLOY_API_ORIGIN`.
    pub fn from_env() -> Result<Self, ClientError> {
        let name = std::env::var(DEPLOYMENT_NAME_ENV).unwrap_or_default();
        let mut config = Self::new(name);
        if let Ok(origin) = std::env::var(API_ORIGIN_ENV)
            && !origin.trim().is_empty()
        {
            config.api_origin = origin;
        }
        config.validate()?;
        Ok(config)
    }

    /// Overrides the API origin.
    pub fn api_origin(mut self, origin: impl Into<String>) -> Self {
        self.api_origin = origin.into();
        self
    }

    /// Overrides the deployment name.
    pub fn deployment_name(mut self, name: impl Into<String>) -> Self {
        self.deployment_name = name.into();
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.deployment_name.trim().is_empty() {
            return Err(ClientError::Config(format!(
                "missing {DEPLOYMENT_NAME_ENV} for the workflow client"
            )));
        }
        if self.api_origin.trim().is_empty() {
            return Err(ClientError::Config("api origin must not be empty".into()));
        }
        Ok(())
    }

    /// `<origin>/deployments/<name>`
    pub fn base_url(&self) -> String {
        format!(
            "{}/deployments/{}",
            self.api_origin.trim_end_matches('/'),
            self.deployment_name.trim()
        )
    }

    pub(crate) fn workflow_run_url(&self, workflow: &str) -> String {
        format!("{}/workflows/{workflow}/run-nowait", self.base_url())
    }

    pub(crate) fn events_url(&self, handler: &HandlerId) -> String {
        format!("{}/events/{handler}?sse=true", self.base_url())
    }

    pub(crate) fn handler_url(&self, handler: &HandlerId) -> String {
        format!("{}/handlers/{handler}", self.base_url())
    }
}

/// Configuration for the plain upload form.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Server hosting the `/sheets` and `/presentations` routes.
    pub server_url: String,
    pub timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_UPLOAD_SERVER.to_string(),
            timeout: Duration::from_secs(600),
        }
    }
}

impl UploadConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url.trim_end_matches('/'))
    }
}
