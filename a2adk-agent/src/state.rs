// ABOUTME: Session state view used by tools: reads see pending writes, writes are recorded as a delta.
// ABOUTME: The delta is attached to the tool's response event and applied when it is appended.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct State {
    base: Map<String, Value>,
    delta: Map<String, Value>,
}

impl State {
    pub fn new(base: Map<String, Value>) -> Self {
        Self {
            base,
            delta: Map::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.delta.get(key).or_else(|| self.base.get(key))
    }

    /// String value for `key`; null and non-strings read as absent
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Boolean value for `key`; anything but `true` reads as false
    pub fn get_flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.delta.insert(key.into(), value);
    }

    pub fn delta(&self) -> &Map<String, Value> {
        &self.delta
    }

    pub fn into_delta(self) -> Map<String, Value> {
        self.delta
    }
}
