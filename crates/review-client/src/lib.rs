//! Client for the investments review workflows.
//!
//! Two ways to get a file reviewed:
//! - [`UploadForm`] posts the file to the server's `/sheets` or `/presentations`
//!   route and waits for the final result.
//! - [`RunSession`] starts a run on a deployed workflow and follows its event
//!   stream until the stop event arrives.
//!
//! ```no_run
//! use review_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = HttpWorkflowClient::new(ClientConfig::new("investments"))?;
//! let mut selector = Selector::new();
//! selector.set_workflow(Some(WorkflowKind::Sheets));
//! selector.select_file(Some(std::path::Path::new("portfolio.xlsx"))).await?;
//!
//! if let Some(mut session) = selector.mount(client) {
//!     session.start().await?;
//!     session.follow(|event| println!("{}", event.display_line())).await?;
//!     println!("{}", session.result_json().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

/// Workflow client boundary.
pub mod client;
/// Client and upload configuration.
pub mod config;
/// Base64 conversion of file content.
pub mod encoding;
/// Public error types.
pub mod errors;
/// Handler ids, run input and opaque workflow events.
pub mod model;
/// Logging setup.
pub mod observability;
pub mod prelude;
/// Text rendering of sessions and upload results.
pub mod render;
/// File and workflow selection.
pub mod selector;
/// Streamed run state machine.
pub mod session;
#[cfg(test)]
mod test_support;
/// HTTP transport for deployed workflows.
pub mod transport;
/// Plain upload form.
pub mod upload;
/// Workflow names and file types.
pub mod workflow;

pub use client::{EventStream, WorkflowClient};
pub use config::{ClientConfig, UploadConfig};
pub use errors::{ClientError, UploadError};
pub use model::{HandlerId, HandlerStatus, RunInput, WorkflowEvent, is_stop_event};
pub use observability::{LogConfig, LogTarget, init_observability};
pub use selector::Selector;
pub use session::{RunSession, RunState};
pub use transport::HttpWorkflowClient;
pub use upload::{FormState, UploadForm, UploadOutcome};
pub use workflow::{FileType, WorkflowKind};
