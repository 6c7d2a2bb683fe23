//! Plain multipart upload to the `/sheets` and `/presentations` routes.
use std::path::{Path, PathBuf};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::UploadConfig;
use crate::errors::UploadError;
use crate::workflow::FileType;

/// Multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "upload_file";

/// Submit button state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Loading,
}

/// Result of a submitted upload, interpreted from a single body read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UploadOutcome {
    /// The workflow finished and returned its `final_result`.
    Completed { final_result: String },
    /// The server rejected the upload or the workflow reported an error.
    Failed { status: u16, detail: String },
}

impl UploadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Interprets a response body that has already been read in full.
///
/// Non-success bodies are surfaced as raw text and never parsed as JSON.
pub fn interpret_response(status: u16, body: &str) -> UploadOutcome {
    if !(200..300).contains(&status) {
        return UploadOutcome::Failed {
            status,
            detail: error_detail(body),
        };
    }
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            return UploadOutcome::Failed {
                status,
                detail: format!("invalid JSON response: {e}"),
            };
        }
    };
    if let Some(final_result) = value.get("final_result").and_then(|v| v.as_str()) {
        return UploadOutcome::Completed {
            final_result: final_result.to_string(),
        };
    }
    let detail = value
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("response did not contain final_result");
    UploadOutcome::Failed {
        status,
        detail: detail.to_string(),
    }
}

/// Error bodies are shown as text; a JSON `detail` field is unwrapped when present.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(ToOwned::to_owned))
        .unwrap_or_else(|| body.to_string())
}

/// Publishes `Loading` on creation and `Idle` when dropped.
struct LoadingGuard<'a>(&'a watch::Sender<FormState>);

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a watch::Sender<FormState>) -> Self {
        state.send_replace(FormState::Loading);
        Self(state)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(FormState::Idle);
    }
}

/// File and file type chosen in the upload form.
#[derive(Debug)]
pub struct UploadForm {
    pub file: Option<PathBuf>,
    pub file_type: Option<FileType>,
    state: watch::Sender<FormState>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl UploadForm {
    pub fn new(file: Option<PathBuf>, file_type: Option<FileType>) -> Self {
        let (state, _) = watch::channel(FormState::Idle);
        Self {
            file,
            file_type,
            state,
        }
    }

    pub fn state(&self) -> FormState {
        *self.state.borrow()
    }

    /// Receiver that observes `Loading`/`Idle` transitions while a submit runs.
    pub fn state_updates(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    /// Checks the selection without sending anything.
    pub fn validate(&self) -> Result<(&Path, FileType), UploadError> {
        let file = self.file.as_deref().ok_or(UploadError::MissingFile)?;
        let file_type = self.file_type.ok_or(UploadError::MissingFileType)?;
        Ok((file, file_type))
    }

    /// Posts the file to `"/" + type + "s"` and interprets the response.
    ///
    /// The form is `Loading` while the request is in flight and back to `Idle`
    /// afterwards, whatever the outcome.
    pub async fn submit(&self, config: &UploadConfig) -> Result<UploadOutcome, UploadError> {
        let (file, file_type) = self.validate()?;
        let _loading = LoadingGuard::new(&self.state);
        send_upload(file, file_type, config).await
    }
}

async fn send_upload(
    file: &Path,
    file_type: FileType,
    config: &UploadConfig,
) -> Result<UploadOutcome, UploadError> {
    let bytes = tokio::fs::read(file).await?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let url = config.endpoint_url(&file_type.endpoint_path());
    info!(
        event = "upload.request_sent",
        domain = "upload",
        file_type = %file_type,
        file_bytes = bytes.len() as u64,
        url = %url,
        "uploading file"
    );

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(file_type.mime_type())
        .map_err(|e| UploadError::Transport(e.to_string()))?;
    let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| UploadError::Transport(e.to_string()))?;
    let response = client
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| UploadError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| UploadError::Transport(e.to_string()))?;
    let outcome = interpret_response(status, &body);
    debug!(
        event = "upload.response_received",
        domain = "upload",
        status = status,
        response_bytes = body.len() as u64,
        completed = outcome.is_completed()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Reply, serve};
    use std::io::Write as _;
    use tokio::sync::oneshot;

    fn temp_sheet() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".xlsx")
            .tempfile()
            .expect("tempfile");
        file.write_all(b"sheet-content").expect("write");
        file
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_request() {
        let form = UploadForm::new(None, Some(FileType::Sheet));
        let updates = form.state_updates();
        let err = form
            .submit(&UploadConfig::new("http://127.0.0.1:9"))
            .await
            .expect_err("no file");
        assert_eq!(err, UploadError::MissingFile);
        assert_eq!(err.to_string(), "Please select a file");
        assert_eq!(form.state(), FormState::Idle);
        assert!(!updates.has_changed().expect("sender alive"));
    }

    #[tokio::test]
    async fn missing_type_fails_before_any_request() {
        let file = temp_sheet();
        let form = UploadForm::new(Some(file.path().to_path_buf()), None);
        let err = form
            .submit(&UploadConfig::new("http://127.0.0.1:9"))
            .await
            .expect_err("no type");
        assert_eq!(err, UploadError::MissingFileType);
    }

    #[tokio::test]
    async fn posts_multipart_file_to_plural_endpoint() {
        let (server, handle) = serve(vec![Reply::json(
            "200 OK",
            r#"{"final_result":"Trend is up","error":null}"#,
        )])
        .await;
        let file = temp_sheet();
        let form = UploadForm::new(Some(file.path().to_path_buf()), Some(FileType::Sheet));

        let outcome = form
            .submit(&UploadConfig::new(server))
            .await
            .expect("submit");
        assert_eq!(
            outcome,
            UploadOutcome::Completed {
                final_result: "Trend is up".into()
            }
        );
        assert_eq!(form.state(), FormState::Idle);

        let requests = handle.await.expect("server task");
        assert!(requests[0].starts_with("POST /sheets HTTP/1.1"), "{}", requests[0]);
        assert!(requests[0].contains("name=\"upload_file\""), "{}", requests[0]);
        assert!(requests[0].contains("sheet-content"));
    }

    #[tokio::test]
    async fn form_reports_loading_while_the_request_is_in_flight() {
        let (release_tx, release_rx) = oneshot::channel();
        let (server, handle) = serve(vec![
            Reply::json("200 OK", r#"{"final_result":"done"}"#).after(release_rx),
        ])
        .await;
        let file = temp_sheet();
        let form = UploadForm::new(Some(file.path().to_path_buf()), Some(FileType::Sheet));
        let mut updates = form.state_updates();
        let config = UploadConfig::new(server);

        let watcher = async move {
            loop {
                let state = *updates.borrow_and_update();
                if state == FormState::Loading {
                    break;
                }
                updates.changed().await.expect("sender alive");
            }
            release_tx.send(()).expect("server waiting");
            updates
        };
        let (outcome, mut updates) = tokio::join!(form.submit(&config), watcher);

        assert!(outcome.expect("submit").is_completed());
        assert_eq!(form.state(), FormState::Idle);
        assert_eq!(*updates.borrow_and_update(), FormState::Idle);
        handle.await.expect("server task");
    }

    #[tokio::test]
    async fn server_error_body_is_shown_as_text() {
        let (server, handle) =
            serve(vec![Reply::text("500 Internal Server Error", "Internal Error")]).await;
        let file = temp_sheet();
        let form = UploadForm::new(
            Some(file.path().to_path_buf()),
            Some(FileType::Presentation),
        );

        let outcome = form
            .submit(&UploadConfig::new(server))
            .await
            .expect("submit");
        assert_eq!(
            outcome,
            UploadOutcome::Failed {
                status: 500,
                detail: "Internal Error".into()
            }
        );
        assert_eq!(form.state(), FormState::Idle);
        let requests = handle.await.expect("server task");
        assert!(requests[0].starts_with("POST /presentations HTTP/1.1"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error_and_restores_state() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let file = temp_sheet();
        let form = UploadForm::new(Some(file.path().to_path_buf()), Some(FileType::Sheet));
        let err = form
            .submit(&UploadConfig::new(format!("http://{addr}")))
            .await
            .expect_err("connection refused");
        assert!(matches!(err, UploadError::Transport(_)));
        assert!(err.to_string().starts_with("Upload failed: "));
        assert_eq!(form.state(), FormState::Idle);
    }
    #[test]
    fn interpret_unwraps_error_detail_and_workflow_errors() {
        assert_eq!(
            interpret_response(500, r#"{"detail":"Internal server error: boom"}"#),
            UploadOutcome::Failed {
                status: 500,
                detail: "Internal server error: boom".into()
            }
        );
        assert_eq!(
            interpret_response(200, r#"{"final_result":null,"error":"Could not parse sheet file"}"#),
            UploadOutcome::Failed {
                status: 200,
                detail: "Could not parse sheet file".into()
            }
        );
        assert!(matches!(
            interpret_response(200, "not json"),
            UploadOutcome::Failed { status: 200, detail } if detail.starts_with("invalid JSON")
        ));
    }
}
