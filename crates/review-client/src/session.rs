use futures::StreamExt as _;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::client::{EventStream, WorkflowClient};
use crate::errors::ClientError;
use crate::model::{HandlerId, HandlerStatus, RunInput, WorkflowEvent};

const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// Lifecycle of a run session.
///
/// `Idle` until [`RunSession::start`] creates a handler, `Running` until a stop
/// event has been delivered, then `Completed`. There is no way back to `Idle`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

/// Live subscription to one handler's events.
///
/// Dropping it signals the pump task, which then drops the underlying stream.
struct Subscription {
    rx: mpsc::Receiver<Result<WorkflowEvent, ClientError>>,
    unsubscribe: watch::Sender<bool>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.unsubscribe.send(true);
    }
}

/// One streamed workflow run over a selected file.
pub struct RunSession<C> {
    client: C,
    session_id: uuid::Uuid,
    workflow: String,
    file_bytes: Vec<u8>,
    file_extension: String,
    handler_id: Option<HandlerId>,
    events: Vec<WorkflowEvent>,
    stop_index: Option<usize>,
    external_status: Option<HandlerStatus>,
    subscription: Option<Subscription>,
    buffer_capacity: usize,
}

impl<C: WorkflowClient> RunSession<C> {
    pub fn new(
        client: C,
        workflow: impl Into<String>,
        file_bytes: Vec<u8>,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            client,
            session_id: uuid::Uuid::new_v4(),
            workflow: workflow.into(),
            file_bytes,
            file_extension: file_extension.into(),
            handler_id: None,
            events: Vec::new(),
            stop_index: None,
            external_status: None,
            subscription: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Sets the bounded buffer between the subscription task and the session.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    pub fn handler_id(&self) -> Option<&HandlerId> {
        self.handler_id.as_ref()
    }

    /// Events in delivery order.
    pub fn events(&self) -> &[WorkflowEvent] {
        &self.events
    }

    /// First delivered stop event, if any.
    pub fn stop_event(&self) -> Option<&WorkflowEvent> {
        self.stop_index.map(|idx| &self.events[idx])
    }

    pub fn state(&self) -> RunState {
        match (&self.handler_id, self.stop_index) {
            (None, _) => RunState::Idle,
            (Some(_), None) => RunState::Running,
            (Some(_), Some(_)) => RunState::Completed,
        }
    }

    /// A handler exists and no stop event has been observed yet.
    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// `Completed` once stopped, otherwise the last status reported by the service.
    pub fn status_label(&self) -> &str {
        if self.stop_index.is_some() {
            return "Completed";
        }
        self.external_status
            .as_ref()
            .map(HandlerStatus::as_str)
            .unwrap_or("running")
    }

    /// Pretty-printed payload of the stop event.
    pub fn result_json(&self) -> Option<String> {
        self.stop_event().map(|event| {
            serde_json::to_string_pretty(&event.data).unwrap_or_else(|_| event.data.to_string())
        })
    }

    /// Creates a new handler for the selected file and subscribes to its events.
    ///
    /// The previous run's events and subscription are replaced only once the
    /// new handler is created and subscribed. On error the session is left as
    /// it was.
    pub async fn start(&mut self) -> Result<&HandlerId, ClientError> {
        let input = RunInput::from_bytes(&self.file_bytes, self.file_extension.as_str());
        let handler = self.client.create_handler(&self.workflow, input).await?;
        info!(
            event = "session.handler_created",
            domain = "session",
            session_id = %self.session_id,
            workflow = %self.workflow,
            handler_id = %handler,
            "workflow run started"
        );

        let stream = match self.client.subscribe(&handler).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(
                    event = "session.subscribe_failed",
                    domain = "session",
                    session_id = %self.session_id,
                    handler_id = %handler,
                    error = %err,
                    "could not open event stream"
                );
                return Err(err);
            }
        };

        self.unsubscribe();
        self.events.clear();
        self.stop_index = None;
        self.external_status = None;

        let (tx, rx) = mpsc::channel(self.buffer_capacity);
        let (unsubscribe, unsubscribe_rx) = watch::channel(false);
        tokio::spawn(pump(stream, tx, unsubscribe_rx));
        self.subscription = Some(Subscription { rx, unsubscribe });

        Ok(self.handler_id.insert(handler))
    }

    /// Waits for the next event and appends it to the log.
    ///
    /// Returns `Ok(None)` when there is no subscription or the stream ended.
    /// A stream error ends the subscription.
    pub async fn next_event(&mut self) -> Result<Option<&WorkflowEvent>, ClientError> {
        let Some(subscription) = self.subscription.as_mut() else {
            return Ok(None);
        };
        let received = subscription.rx.recv().await;
        match received {
            Some(Ok(event)) => Ok(Some(self.push_event(event))),
            Some(Err(err)) => {
                warn!(
                    event = "session.stream_failed",
                    domain = "session",
                    session_id = %self.session_id,
                    error = %err,
                    "event stream failed"
                );
                self.subscription = None;
                Err(err)
            }
            None => {
                debug!(
                    event = "session.stream_closed",
                    domain = "session",
                    session_id = %self.session_id,
                    events = self.events.len() as u64
                );
                self.subscription = None;
                Ok(None)
            }
        }
    }

    /// Consumes events until a stop event arrives or the stream ends, calling
    /// `on_event` for each one in delivery order.
    pub async fn follow<F>(&mut self, mut on_event: F) -> Result<RunState, ClientError>
    where
        F: FnMut(&WorkflowEvent),
    {
        while self.stop_index.is_none() {
            match self.next_event().await? {
                Some(event) => on_event(event),
                None => break,
            }
        }
        Ok(self.state())
    }

    pub async fn run_to_completion(&mut self) -> Result<RunState, ClientError> {
        self.follow(|_| {}).await
    }

    /// Fetches the handler status from the service.
    pub async fn refresh_status(&mut self) -> Result<Option<&HandlerStatus>, ClientError> {
        let Some(handler) = self.handler_id.as_ref() else {
            return Ok(None);
        };
        if let Some(status) = self.client.handler_status(handler).await? {
            self.external_status = Some(status);
        }
        Ok(self.external_status.as_ref())
    }

    /// Stops receiving events. Already delivered events are kept.
    pub fn unsubscribe(&mut self) {
        if self.subscription.take().is_some() {
            debug!(
                event = "session.unsubscribed",
                domain = "session",
                session_id = %self.session_id
            );
        }
    }

    fn push_event(&mut self, event: WorkflowEvent) -> &WorkflowEvent {
        let is_stop = self.client.is_stop(&event);
        self.events.push(event);
        let idx = self.events.len() - 1;
        debug!(
            event = "session.event_received",
            domain = "session",
            session_id = %self.session_id,
            seq = idx as u64,
            is_stop = is_stop
        );
        if is_stop && self.stop_index.is_none() {
            self.stop_index = Some(idx);
            info!(
                event = "session.completed",
                domain = "session",
                session_id = %self.session_id,
                events = self.events.len() as u64,
                "workflow run completed"
            );
        }
        &self.events[idx]
    }
}

async fn pump(
    mut stream: EventStream,
    tx: mpsc::Sender<Result<WorkflowEvent, ClientError>>,
    mut unsubscribe_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = unsubscribe_rx.changed() => {
                if changed.is_err() || *unsubscribe_rx.borrow() {
                    return;
                }
            }
            next = stream.next() => {
                let Some(item) = next else {
                    return;
                };
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    return;
                }
            }
        }
    }
}
