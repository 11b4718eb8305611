// ABOUTME: Events emitted by an agent run and recorded in session history.
// ABOUTME: Carries content, state deltas, and the final-response rule used by the bridge.

use crate::content::{Content, FunctionCall, FunctionResponse, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Side effects attached to an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    /// Session state changes applied when the event is appended
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub state_delta: Map<String, Value>,
    /// A tool asked for its response to be shown as-is
    #[serde(default)]
    pub skip_summarization: bool,
    /// Artifact filename -> saved version
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub artifact_delta: HashMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    /// "user" or the name of the agent that produced the event
    pub author: String,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Streaming fragment that is not persisted
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub actions: EventActions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub long_running_tool_ids: Vec<String>,
}

impl Event {
    pub fn new(invocation_id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            invocation_id: invocation_id.into(),
            author: author.into(),
            timestamp: now_timestamp(),
            content: None,
            partial: false,
            actions: EventActions::default(),
            long_running_tool_ids: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn parts(&self) -> &[Part] {
        self.content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts()
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn function_responses(&self) -> Vec<&FunctionResponse> {
        self.parts()
            .iter()
            .filter_map(|p| match p {
                Part::FunctionResponse(response) => Some(response),
                _ => None,
            })
            .collect()
    }

    /// Whether this event ends the agent's turn.
    ///
    /// Tool responses flagged to skip summarization and long-running tool
    /// calls end the turn. Otherwise the turn ends on a complete event with
    /// no function calls or responses.
    pub fn is_final_response(&self) -> bool {
        if self.actions.skip_summarization || !self.long_running_tool_ids.is_empty() {
            return true;
        }
        self.function_calls().is_empty() && self.function_responses().is_empty() && !self.partial
    }
}

pub(crate) fn now_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call_part() -> Part {
        Part::FunctionCall(FunctionCall {
            id: Some("c1".to_string()),
            name: "lookup".to_string(),
            args: json!({}),
        })
    }

    #[test]
    fn test_plain_text_event_is_final() {
        let event = Event::new("inv", "agent").with_content(Content::model(vec![Part::text("done")]));
        assert!(event.is_final_response());
    }

    #[test]
    fn test_partial_event_is_not_final() {
        let event = Event::new("inv", "agent")
            .with_content(Content::model(vec![Part::text("do")]))
            .with_partial(true);
        assert!(!event.is_final_response());
    }

    #[test]
    fn test_function_call_event_is_not_final_unless_long_running() {
        let mut event = Event::new("inv", "agent").with_content(Content::model(vec![call_part()]));
        assert!(!event.is_final_response());
        event.long_running_tool_ids.push("c1".to_string());
        assert!(event.is_final_response());
    }

    #[test]
    fn test_skip_summarization_makes_tool_response_final() {
        let mut event = Event::new("inv", "agent").with_content(Content::user(vec![
            Part::FunctionResponse(FunctionResponse {
                id: None,
                name: "lookup".to_string(),
                response: json!({"ok": true}),
            }),
        ]));
        assert!(!event.is_final_response());
        event.actions.skip_summarization = true;
        assert!(event.is_final_response());
    }
}
