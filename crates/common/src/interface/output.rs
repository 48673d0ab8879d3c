use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The document a tracer hands back once the transaction is traced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceOutput {
    /// The serialized trace.
    pub result: Value,
    /// Why tracing was interrupted, if it was. The result is still the best effort
    /// accumulated up to that point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceOutput {
    /// Creates a new [`TraceOutput`].
    pub fn new(result: Value, error: Option<String>) -> Self {
        Self { result, error }
    }

    /// Whether the trace was interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.error.is_some()
    }
}
