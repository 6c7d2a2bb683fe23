use std::path::{Path, PathBuf};

use tracing::debug;

use crate::client::WorkflowClient;
use crate::errors::ClientError;
use crate::session::RunSession;
use crate::workflow::WorkflowKind;

/// Workflow and file chosen for a streamed run.
///
/// The two fields change independently; a session can be mounted only once
/// both are set.
#[derive(Clone, Debug, Default)]
pub struct Selector {
    workflow: Option<WorkflowKind>,
    file_bytes: Option<Vec<u8>>,
    file_path: Option<PathBuf>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow(&self) -> Option<WorkflowKind> {
        self.workflow
    }

    pub fn file_bytes(&self) -> Option<&[u8]> {
        self.file_bytes.as_deref()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Changes the workflow; file bytes are left untouched.
    pub fn set_workflow(&mut self, workflow: Option<WorkflowKind>) {
        self.workflow = workflow;
    }

    /// Parses a workflow name, where an empty string clears the selection.
    pub fn set_workflow_name(&mut self, name: &str) -> Result<(), ClientError> {
        let workflow = if name.trim().is_empty() {
            None
        } else {
            Some(name.parse()?)
        };
        self.set_workflow(workflow);
        Ok(())
    }

    /// Reads the chosen file, or clears the bytes when `path` is `None`.
    ///
    /// On a read error the previous bytes are cleared as well.
    pub async fn select_file(&mut self, path: Option<&Path>) -> Result<(), ClientError> {
        self.file_bytes = None;
        self.file_path = None;
        let Some(path) = path else {
            return Ok(());
        };
        let bytes = tokio::fs::read(path).await?;
        debug!(
            event = "selector.file_read",
            domain = "selector",
            path = %path.display(),
            bytes = bytes.len() as u64
        );
        self.file_bytes = Some(bytes);
        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Sets file content that is already in memory.
    pub fn set_file_bytes(&mut self, bytes: Option<Vec<u8>>) {
        self.file_bytes = bytes;
        self.file_path = None;
    }

    /// Extensions the file picker should offer for the current workflow.
    pub fn accept_filter(&self) -> &'static str {
        match self.workflow {
            Some(WorkflowKind::Sheets) => WorkflowKind::Sheets.accept_filter(),
            _ => WorkflowKind::Presentations.accept_filter(),
        }
    }

    /// Extension passed to the run for the current workflow.
    pub fn file_extension(&self) -> &'static str {
        match self.workflow {
            Some(WorkflowKind::Sheets) => WorkflowKind::Sheets.file_extension(),
            _ => WorkflowKind::Presentations.file_extension(),
        }
    }

    /// Returns false when a selected file does not match the accept filter.
    pub fn file_matches_filter(&self) -> bool {
        match (self.workflow, self.file_path.as_deref()) {
            (Some(workflow), Some(path)) => workflow.accepts(path),
            _ => true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.workflow.is_some() && self.file_bytes.is_some()
    }

    /// Creates a run session when both a workflow and file bytes are selected.
    pub fn mount<C: WorkflowClient>(&self, client: C) -> Option<RunSession<C>> {
        let workflow = self.workflow?;
        let bytes = self.file_bytes.clone()?;
        Some(RunSession::new(
            client,
            workflow.name(),
            bytes,
            self.file_extension(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EventStream;
    use crate::model::{HandlerId, RunInput};
    use std::io::Write as _;

    struct NoopClient;

    #[async_trait::async_trait]
    impl WorkflowClient for NoopClient {
        async fn create_handler(
            &self,
            _workflow: &str,
            _input: RunInput,
        ) -> Result<HandlerId, ClientError> {
            unreachable!("not used in this test")
        }

        async fn subscribe(&self, _handler: &HandlerId) -> Result<EventStream, ClientError> {
            unreachable!("not used in this test")
        }
    }

    fn temp_file(suffix: &str, content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("tempfile");
        file.write_all(content).expect("write");
        file
    }

    #[test]
    fn nothing_mounts_until_both_fields_are_set() {
        let mut selector = Selector::new();
        assert!(selector.mount(NoopClient).is_none());

        selector.set_file_bytes(Some(vec![1, 2]));
        assert!(selector.mount(NoopClient).is_none());

        selector.set_workflow(Some(WorkflowKind::Presentations));
        let session = selector.mount(NoopClient).expect("mounted");
        assert_eq!(session.workflow_name(), "presentations");
        assert_eq!(session.file_extension(), ".pdf");

        selector.set_workflow_name("").expect("clear");
        assert!(selector.mount(NoopClient).is_none());
        assert_eq!(selector.file_bytes(), Some(&[1u8, 2][..]));
    }

    #[tokio::test]
    async fn selecting_sheets_file_mounts_with_xlsx_extension() {
        let file = temp_file(".xlsx", b"sheet-bytes");
        let mut selector = Selector::new();
        selector.set_workflow_name("sheets").expect("workflow");
        selector
            .select_file(Some(file.path()))
            .await
            .expect("read file");

        assert_eq!(selector.accept_filter(), ".xlsx,.xls");
        assert!(selector.file_matches_filter());
        let session = selector.mount(NoopClient).expect("mounted");
        assert_eq!(session.file_extension(), ".xlsx");
        assert_eq!(selector.file_bytes(), Some(&b"sheet-bytes"[..]));
    }

    #[tokio::test]
    async fn clearing_file_keeps_workflow() {
        let file = temp_file(".pdf", b"%PDF-1.7");
        let mut selector = Selector::new();
        selector.set_workflow(Some(WorkflowKind::Sheets));
        selector.select_file(Some(file.path())).await.expect("read");
        assert!(!selector.file_matches_filter());

        selector.select_file(None).await.expect("clear");
        assert_eq!(selector.workflow(), Some(WorkflowKind::Sheets));
        assert!(selector.file_bytes().is_none());
        assert!(!selector.is_ready());
    }

    #[tokio::test]
    async fn unreadable_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut selector = Selector::new();
        selector.set_file_bytes(Some(vec![9]));
        let err = selector
            .select_file(Some(&dir.path().join("missing.xlsx")))
            .await
            .expect_err("missing file");
        assert!(matches!(err, ClientError::Io(_)));
        assert!(selector.file_bytes().is_none());
    }

    #[test]
    fn accept_filter_defaults_to_pdf_without_workflow() {
        let selector = Selector::new();
        assert_eq!(selector.accept_filter(), ".pdf");
        assert_eq!(selector.file_extension(), ".pdf");
    }

    #[test]
    fn unknown_workflow_name_is_rejected() {
        let mut selector = Selector::new();
        assert!(selector.set_workflow_name("docs").is_err());
        assert!(selector.workflow().is_none());
    }
}
