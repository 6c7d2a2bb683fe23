use std::pin::Pin;

use crate::errors::ClientError;
use crate::model::{HandlerId, HandlerStatus, RunInput, WorkflowEvent, is_stop_event};

/// Event stream returned by [`WorkflowClient::subscribe`].
pub type EventStream =
    Pin<Box<dyn futures::Stream<Item = Result<WorkflowEvent, ClientError>> + Send + 'static>>;

/// Capability used by a run session to drive a remote workflow.
///
/// `HttpWorkflowClient` talks to a deployment; tests use in-memory fakes.
#[async_trait::async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Starts a run of `workflow` and returns its handler id.
    async fn create_handler(
        &self,
        workflow: &str,
        input: RunInput,
    ) -> Result<HandlerId, ClientError>;

    /// Opens the event stream of a run. Dropping the stream unsubscribes.
    async fn subscribe(&self, handler: &HandlerId) -> Result<EventStream, ClientError>;

    /// Classifies the terminal event of a run.
    fn is_stop(&self, event: &WorkflowEvent) -> bool {
        is_stop_event(event)
    }

    /// Current handler status, when the service exposes one.
    async fn handler_status(
        &self,
        _handler: &HandlerId,
    ) -> Result<Option<HandlerStatus>, ClientError> {
        Ok(None)
    }
}

#[async_trait::async_trait]
impl<T: WorkflowClient + ?Sized> WorkflowClient for std::sync::Arc<T> {
    async fn create_handler(
        &self,
        workflow: &str,
        input: RunInput,
    ) -> Result<HandlerId, ClientError> {
        (**self).create_handler(workflow, input).await
    }

    async fn subscribe(&self, handler: &HandlerId) -> Result<EventStream, ClientError> {
        (**self).subscribe(handler).await
    }

    fn is_stop(&self, event: &WorkflowEvent) -> bool {
        (**self).is_stop(event)
    }

    async fn handler_status(
        &self,
        handler: &HandlerId,
    ) -> Result<Option<HandlerStatus>, ClientError> {
        (**self).handler_status(handler).await
    }
}
