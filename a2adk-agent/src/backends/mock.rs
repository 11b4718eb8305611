// ABOUTME: Mock backend for testing - plays back scripted steps for matching prompts.
// ABOUTME: Tool-call steps go through the real tool so state and updates behave as in production.
//!
//! # Example
//!
//! ```no_run
//! use a2adk_agent::backends::mock::{MockBackend, MockStep};
//! use serde_json::json;
//!
//! let mock = MockBackend::new()
//!     .on_prompt("hello").respond_text("Hi there!")
//!     .on_prompt("weather").respond_with(vec![
//!         MockStep::Partial("Looking it up".to_string()),
//!         MockStep::CallTool {
//!             name: "lookup".to_string(),
//!             args: json!({"city": "Oslo"}),
//!         },
//!         MockStep::Text("Sunny".to_string()),
//!     ]);
//! ```

use crate::content::{Content, FunctionCall, Part};
use crate::context::InvocationContext;
use crate::event::Event;
use crate::registry::BackendFactory;
use crate::traits::AgentBackend;
use anyhow::{anyhow, Result};
use futures::stream::BoxStream;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One scripted step of a mock run
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Streaming text fragment (partial event)
    Partial(String),
    /// Complete text reply; ends the turn
    Text(String),
    /// Model asks for a tool; the call and its response are both emitted
    CallTool { name: String, args: Value },
    /// Emit an event as-is
    Event(Event),
    /// Abort the run with an error
    Fail(String),
}

struct Expectation {
    pattern: String,
    steps: Vec<MockStep>,
}

/// Mock backend for testing
#[derive(Clone)]
pub struct MockBackend {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl MockBackend {
    /// Create a new mock backend with no expectations
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Set up an expectation for a prompt containing the given pattern
    pub fn on_prompt(self, pattern: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            backend: self,
            pattern: pattern.to_string(),
        }
    }

    /// Factory function for the registry
    pub fn factory() -> BackendFactory {
        Box::new(|_config| Ok(Arc::new(MockBackend::new())))
    }

    /// Take the steps for `text`: the front expectation if it matches,
    /// otherwise the first matching one further back
    fn take_steps(&self, text: &str) -> Option<Vec<MockStep>> {
        let mut exp = self.expectations.lock().unwrap_or_else(|e| e.into_inner());
        let front_matches = exp.front().is_some_and(|e| text.contains(&e.pattern));
        if front_matches {
            return exp.pop_front().map(|e| e.steps);
        }
        exp.iter()
            .position(|e| text.contains(&e.pattern))
            .and_then(|i| exp.remove(i))
            .map(|e| e.steps)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn model_event(ctx: &InvocationContext, parts: Vec<Part>) -> Event {
    Event::new(ctx.invocation_id.clone(), ctx.agent_name.clone()).with_content(Content::model(parts))
}

impl AgentBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn run<'a>(&'a self, mut ctx: InvocationContext) -> BoxStream<'a, Result<Event>> {
        Box::pin(async_stream::try_stream! {
            let prompt = ctx.user_content.text();
            let steps = self.take_steps(&prompt).unwrap_or_else(|| {
                vec![MockStep::Text(format!("Mock: no expectation for '{}'", prompt))]
            });

            for step in steps {
                match step {
                    MockStep::Partial(text) => {
                        yield model_event(&ctx, vec![Part::text(text)]).with_partial(true);
                    }
                    MockStep::Text(text) => {
                        yield model_event(&ctx, vec![Part::text(text)]);
                    }
                    MockStep::CallTool { name, args } => {
                        let call = FunctionCall {
                            id: Some(format!("call-{}", Uuid::new_v4())),
                            name,
                            args,
                        };
                        let mut event = model_event(&ctx, vec![Part::FunctionCall(call.clone())]);
                        if ctx.find_tool(&call.name).is_some_and(|t| t.is_long_running()) {
                            event.long_running_tool_ids = call.id.iter().cloned().collect();
                        }
                        yield event;
                        let response = ctx.call_tool(&call).await?;
                        yield response;
                    }
                    MockStep::Event(event) => {
                        yield event;
                    }
                    MockStep::Fail(message) => {
                        Err::<(), _>(anyhow!(message))?;
                    }
                }
            }
        })
    }
}

/// Builder for setting up mock expectations with a fluent API
pub struct ExpectationBuilder {
    backend: MockBackend,
    pattern: String,
}

impl ExpectationBuilder {
    /// Respond with a list of steps
    pub fn respond_with(self, steps: Vec<MockStep>) -> MockBackend {
        self.backend
            .expectations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Expectation {
                pattern: self.pattern,
                steps,
            });
        self.backend
    }

    /// Respond with a single final text reply
    pub fn respond_text(self, text: &str) -> MockBackend {
        self.respond_with(vec![MockStep::Text(text.to_string())])
    }

    /// Fail the run with an error
    pub fn respond_error(self, message: &str) -> MockBackend {
        self.respond_with(vec![MockStep::Fail(message.to_string())])
    }
}
