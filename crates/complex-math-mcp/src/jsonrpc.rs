use serde::{Deserialize, Serialize};
use serde_json::Value;

use complex_math_core::format::display_value;

/// A JSON-RPC 2.0 request.
///
/// Every field is optional on the wire: an absent `id` reads as `null` and
/// still gets a response, and a missing or non-string `method` is routed as
/// an unknown method.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Value,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub method: Value,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// The method name, or the text of whatever was sent in its place
    /// (`None` when it is missing).
    pub fn method_name(&self) -> String {
        display_value(&self.method)
    }
}

/// A JSON-RPC 2.0 response. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// The `error` member of a response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// JSON-RPC error code for an unknown method, also used for unknown tools.
pub const METHOD_NOT_FOUND: i32 = -32601;
