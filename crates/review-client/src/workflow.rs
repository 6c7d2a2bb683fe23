//! Workflow names and file types known to the investments review service.
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::ClientError;

const SPREADSHEET_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const PDF_MIME: &str = "application/pdf";

/// Server-defined workflow selectable for a streamed run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum WorkflowKind {
    Sheets,
    Presentations,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 2] = [WorkflowKind::Sheets, WorkflowKind::Presentations];

    /// Name used by the workflow service.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sheets => "sheets",
            Self::Presentations => "presentations",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sheets => "Excel Sheet",
            Self::Presentations => "PDF Presentation",
        }
    }

    /// Comma-separated extensions accepted by the file picker.
    pub fn accept_filter(self) -> &'static str {
        match self {
            Self::Sheets => ".xlsx,.xls",
            Self::Presentations => ".pdf",
        }
    }

    /// Extension sent along with the file content.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Sheets => ".xlsx",
            Self::Presentations => ".pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Sheets => SPREADSHEET_MIME,
            Self::Presentations => PDF_MIME,
        }
    }

    /// Returns true when the file name ends with one of the accepted extensions.
    pub fn accepts(self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let name = name.to_ascii_lowercase();
        self.accept_filter()
            .split(',')
            .any(|ext| name.ends_with(ext))
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkflowKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sheets" => Ok(Self::Sheets),
            "presentations" => Ok(Self::Presentations),
            other => Err(ClientError::validation(format!(
                "unknown workflow: {other:?} (expected sheets or presentations)"
            ))),
        }
    }
}

/// File type chosen in the plain upload form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FileType {
    Sheet,
    Presentation,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sheet => "sheet",
            Self::Presentation => "presentation",
        }
    }

    /// `"/" + type + "s"`
    pub fn endpoint_path(self) -> String {
        format!("/{}s", self.as_str())
    }

    pub fn mime_type(self) -> &'static str {
        self.workflow().mime_type()
    }

    /// Workflow served behind this file type's endpoint.
    pub fn workflow(self) -> WorkflowKind {
        match self {
            Self::Sheet => WorkflowKind::Sheets,
            Self::Presentation => WorkflowKind::Presentations,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sheet" => Ok(Self::Sheet),
            "presentation" => Ok(Self::Presentation),
            other => Err(ClientError::validation(format!(
                "unknown file type: {other:?} (expected sheet or presentation)"
            ))),
        }
    }
}
