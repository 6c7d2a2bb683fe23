//! HTTP integration with a deployed workflow service.
mod http;
pub(crate) mod sse;

pub use http::HttpWorkflowClient;
