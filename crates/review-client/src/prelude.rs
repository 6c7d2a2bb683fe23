//! Common imports for typical client usage.
pub use crate::{
    ClientConfig, ClientError, HandlerId, HttpWorkflowClient, RunSession, RunState, Selector,
    UploadConfig, UploadError, UploadForm, UploadOutcome, WorkflowClient, WorkflowEvent,
    WorkflowKind,
};
