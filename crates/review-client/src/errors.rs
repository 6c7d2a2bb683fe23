/// Errors returned by the workflow client and the run session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration (for example a missing deployment name).
    #[error("config error: {0}")]
    Config(String),
    /// Invalid user input (unknown workflow name, empty file, ...).
    #[error("validation error: {0}")]
    Validation(String),
    /// Network or stream I/O failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The workflow service answered with a non-success status.
    #[error("workflow service returned status {status}: {body}")]
    Http { status: u16, body: String },
    /// Response shape or event framing was invalid.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Local file access failed.
    #[error("io error: {0}")]
    Io(String),
}

impl ClientError {
    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a protocol-level error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the HTTP status for `Http` errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// Errors from the plain upload form.
///
/// `MissingFile` and `MissingFileType` are raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Please select a file")]
    MissingFile,
    #[error("Please select a file type")]
    MissingFileType,
    /// Request could not be sent or the body could not be read.
    #[error("Upload failed: {0}")]
    Transport(String),
    /// The selected file could not be read.
    #[error("Upload failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for UploadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}
