//! Plain-text rendering of run sessions and upload results.
use std::fmt;

use crate::client::WorkflowClient;
use crate::session::RunSession;
use crate::upload::UploadOutcome;

pub const EMPTY_LOG: &str = "No events received yet. Press start to begin.";

/// Label of the start button for the current state.
pub fn start_button_label<C: WorkflowClient>(session: &RunSession<C>) -> &'static str {
    if session.is_running() {
        "Running..."
    } else {
        "Start & Stream"
    }
}

/// Streaming view of a session: header, status, event log, result, footer.
pub struct SessionView<'a, C>(pub &'a RunSession<C>);

impl<C: WorkflowClient> fmt::Display for SessionView<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.0;
        writeln!(f, "Workflow Stream")?;
        writeln!(f, "{}", session.workflow_name())?;
        writeln!(f, "[{}]", start_button_label(session))?;

        if session.handler_id().is_some() {
            writeln!(f, "Status: {}", session.status_label())?;
        }

        writeln!(f, "Event Logs")?;
        if session.events().is_empty() {
            writeln!(f, "  {EMPTY_LOG}")?;
        }
        for event in session.events() {
            writeln!(f, "> {}", event.display_line())?;
        }

        if let Some(result) = session.result_json() {
            writeln!(f, "Workflow Finished")?;
            writeln!(f, "{result}")?;
        }

        match session.events().len() {
            0 => Ok(()),
            count => writeln!(f, "{count} total events processed"),
        }
    }
}

pub fn render_session<C: WorkflowClient>(session: &RunSession<C>) -> String {
    SessionView(session).to_string()
}

/// Renders the upload result panel or the error panel.
pub fn render_upload(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Completed { final_result } => format!("Final response:\n{final_result}\n"),
        UploadOutcome::Failed { status, detail } => {
            format!("An error occurred (status {status}): {detail}\n")
        }
    }
}
