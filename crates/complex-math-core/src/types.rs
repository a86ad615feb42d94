use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::format_float;
use crate::traits::ToolOutput;

/// A block of tool output content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// The `result` payload of a `tools/call` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolCallResult {
    /// Shape a successful tool output: one text block plus structured content.
    pub fn success(output: &impl ToolOutput) -> Self {
        Self {
            content: vec![ContentBlock::text(output.text())],
            structured_content: Some(output.structured()),
            is_error: None,
        }
    }

    /// Shape a tool-level failure: a single `error: <message>` text block.
    pub fn failure(message: impl fmt::Display) -> Self {
        Self {
            content: vec![ContentBlock::text(format!("error: {message}"))],
            structured_content: None,
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// A numeric result that keeps integer-ness where the inputs had it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Interpret a JSON value as a number. Booleans count as `0` and `1`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::Bool(b) => Some(Self::Int(i64::from(*b))),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => i.fmt(f),
            Self::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}
