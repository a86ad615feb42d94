use serde_json::{Map, Value};

use crate::error::ToolError;
use crate::types::ToolCallResult;

/// A named, schema-described callable exposed through `tools/call`.
pub trait Tool: Send + Sync {
    /// Exact name clients call the tool by.
    fn name(&self) -> &'static str;

    /// Human-readable title.
    fn title(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the `arguments` object.
    fn input_schema(&self) -> Value;

    /// Run the tool against the `arguments` object of a `tools/call`.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] for invalid arguments or a failed evaluation.
    /// Callers reshape it into an `isError` result.
    fn call(&self, arguments: &Map<String, Value>) -> Result<ToolCallResult, ToolError>;
}

/// The typed result of a tool, rendered both as text and as structured
/// content.
pub trait ToolOutput {
    fn text(&self) -> String;

    fn structured(&self) -> Value;
}
