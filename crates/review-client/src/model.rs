use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the workflow service assigns to one invoked run.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(pub String);

impl HandlerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Start-event payload for a streamed run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    /// Base64-encoded file content.
    pub file_input: String,
    pub file_extension: String,
    /// `true` when `file_input` carries content rather than a server-side path.
    pub is_source_content: bool,
}

impl RunInput {
    /// Builds a payload carrying the given file content.
    pub fn from_bytes(bytes: &[u8], file_extension: impl Into<String>) -> Self {
        Self {
            file_input: crate::encoding::encode_file_input(bytes),
            file_extension: file_extension.into(),
            is_source_content: true,
        }
    }
}

/// Opaque event delivered by a run's event stream.
///
/// Only the qualified type name is interpreted, to classify stop events.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowEvent {
    /// Qualified event class (`qualified_name` or `type` on the wire).
    pub type_name: Option<String>,
    /// Event payload (`value` or `data` on the wire).
    pub data: serde_json::Value,
    /// Class hierarchy when the service reports one.
    pub types: Vec<String>,
    raw: serde_json::Value,
}

impl WorkflowEvent {
    /// Wraps one decoded JSON event frame.
    pub fn from_json(raw: serde_json::Value) -> Self {
        let type_name = raw
            .get("qualified_name")
            .or_else(|| raw.get("type"))
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned);
        let data = raw
            .get("value")
            .or_else(|| raw.get("data"))
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let types = raw
            .get("types")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(ToOwned::to_owned))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            type_name,
            data,
            types,
            raw,
        }
    }

    /// Wraps a frame that was not JSON.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            type_name: None,
            data: serde_json::Value::Null,
            types: Vec::new(),
            raw: serde_json::Value::String(text.into()),
        }
    }

    /// The event exactly as delivered.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// One-line log form: string events verbatim, everything else as compact JSON.
    pub fn display_line(&self) -> String {
        match &self.raw {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

fn names_stop_event(name: &str) -> bool {
    name == "StopEvent" || name.ends_with(".StopEvent")
}

/// Returns true when the event marks the run's terminal state.
pub fn is_stop_event(event: &WorkflowEvent) -> bool {
    event.type_name.as_deref().is_some_and(names_stop_event)
        || event.types.iter().any(|t| names_stop_event(t))
}

/// Handler state reported by the workflow service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HandlerStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl HandlerStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Other(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_input_serializes_expected_fields() {
        let input = RunInput::from_bytes(b"abc", ".xlsx");
        assert_eq!(
            serde_json::to_value(&input).expect("serialize"),
            json!({"file_input": "YWJj", "file_extension": ".xlsx", "is_source_content": true})
        );
    }

    #[test]
    fn classifies_stop_events_by_qualified_name_or_hierarchy() {
        let plain = WorkflowEvent::from_json(json!({"type": "StopEvent", "data": {"x": 1}}));
        let qualified = WorkflowEvent::from_json(json!({
            "qualified_name": "workflows.events.StopEvent",
            "value": {"final_result": "ok"}
        }));
        let subclass = WorkflowEvent::from_json(json!({
            "qualified_name": "investments_review.sheets.workflow.OutputEvent",
            "types": ["workflows.events.StopEvent", "workflows.events.Event"],
            "value": {}
        }));
        let progress = WorkflowEvent::from_json(json!({
            "qualified_name": "investments_review.shared.FileUploadedEvent",
            "value": {"file_id": "f-1"}
        }));
        assert!(is_stop_event(&plain));
        assert!(is_stop_event(&qualified));
        assert!(is_stop_event(&subclass));
        assert!(!is_stop_event(&progress));
        assert!(!is_stop_event(&WorkflowEvent::text("StopEvent")));
    }

    #[test]
    fn payload_is_read_from_value_or_data() {
        let event = WorkflowEvent::from_json(json!({"type": "StopEvent", "data": {"x": 1}}));
        assert_eq!(event.data, json!({"x": 1}));
        let event = WorkflowEvent::from_json(json!({"qualified_name": "E", "value": [1, 2]}));
        assert_eq!(event.data, json!([1, 2]));
    }

    #[test]
    fn display_line_keeps_strings_verbatim() {
        assert_eq!(WorkflowEvent::text("heartbeat").display_line(), "heartbeat");
        let event = WorkflowEvent::from_json(json!({"type": "E1"}));
        assert_eq!(event.display_line(), r#"{"type":"E1"}"#);
    }

    #[test]
    fn handler_status_parses_known_values() {
        assert_eq!(HandlerStatus::parse("Running"), HandlerStatus::Running);
        assert_eq!(
            HandlerStatus::parse("queued"),
            HandlerStatus::Other("queued".into())
        );
        assert_eq!(HandlerStatus::Failed.as_str(), "failed");
    }
}
