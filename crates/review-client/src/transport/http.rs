use futures::StreamExt as _;
use tracing::debug;

use crate::client::{EventStream, WorkflowClient};
use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::model::{HandlerId, HandlerStatus, RunInput};

use super::sse::{ByteStream, event_stream};

/// Workflow client for a deployment served over HTTP.
///
/// Runs are started with `run-nowait` and observed through the server-sent
/// event stream of their handler.
pub struct HttpWorkflowClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpWorkflowClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a client from `LLAMA_DEPLOY_DEPLOYMENT_NAME`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(ClientError::Http {
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn build_run_body(input: &RunInput) -> serde_json::Value {
    serde_json::json!({ "start_event": input })
}

pub(crate) fn parse_handler_id(body: &serde_json::Value) -> Result<HandlerId, ClientError> {
    body.get("handler_id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.trim().is_empty())
        .map(HandlerId::new)
        .ok_or_else(|| ClientError::protocol("run response is missing handler_id"))
}

#[async_trait::async_trait]
impl WorkflowClient for HttpWorkflowClient {
    async fn create_handler(
        &self,
        workflow: &str,
        input: RunInput,
    ) -> Result<HandlerId, ClientError> {
        let url = self.config.workflow_run_url(workflow);
        debug!(
            event = "workflow.create_handler",
            domain = "workflow",
            workflow = workflow,
            file_extension = %input.file_extension,
            input_bytes = input.file_input.len() as u64,
            "creating workflow handler"
        );
        let response = self
            .client
            .post(url)
            .timeout(self.config.timeout)
            .json(&build_run_body(&input))
            .send()
            .await
            .map_err(|e| ClientError::transport(format!("run request failed: {e}")))?;
        let response = error_for_status(response).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::protocol(format!("invalid run response: {e}")))?;
        parse_handler_id(&body)
    }

    async fn subscribe(&self, handler: &HandlerId) -> Result<EventStream, ClientError> {
        debug!(
            event = "workflow.subscribe",
            domain = "workflow",
            handler_id = %handler,
            "opening event stream"
        );
        let response = self
            .client
            .get(self.config.events_url(handler))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ClientError::transport(format!("event stream request failed: {e}")))?;
        let response = error_for_status(response).await?;
        let bytes_stream: ByteStream = Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| ClientError::transport(format!("event stream read failed: {e}")))
        }));
        Ok(Box::pin(event_stream(bytes_stream)))
    }

    async fn handler_status(
        &self,
        handler: &HandlerId,
    ) -> Result<Option<HandlerStatus>, ClientError> {
        let response = self
            .client
            .get(self.config.handler_url(handler))
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ClientError::transport(format!("status request failed: {e}")))?;
        let response = error_for_status(response).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::protocol(format!("invalid status response: {e}")))?;
        Ok(body
            .get("status")
            .and_then(|v| v.as_str())
            .map(HandlerStatus::parse))
    }
}
