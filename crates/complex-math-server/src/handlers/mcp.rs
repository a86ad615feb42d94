use serde_json::{Map, Value};

use complex_math_core::format::display_value;
use complex_math_core::ToolCallResult;
use complex_math_mcp::jsonrpc::METHOD_NOT_FOUND;
use complex_math_mcp::{JsonRpcRequest, JsonRpcResponse};

use crate::app_state::AppState;

/// A `tools/call` named a tool the registry does not have.
#[derive(Debug, thiserror::Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

/// Handle one MCP JSON-RPC request.
///
/// Every request gets exactly one response carrying its `id`, including
/// requests without one (answered with `id: null`).
pub fn handle_request(state: &AppState, req: &JsonRpcRequest) -> JsonRpcResponse {
    let method = req.method_name();
    tracing::debug!(%method, id = %req.id, "handling request");

    match method.as_str() {
        "initialize" => handle_initialize(state, req),
        "tools/list" => handle_tools_list(state, req),
        "tools/call" => handle_tools_call(state, req),
        _ => JsonRpcResponse::error(
            req.id.clone(),
            METHOD_NOT_FOUND,
            format!("Unknown method: {method}"),
        ),
    }
}

/// Run a tool by name.
///
/// Tool failures come back as an `isError` result, not as an `Err`.
///
/// # Errors
///
/// Returns [`UnknownTool`] when no tool has that exact name.
pub fn call_tool(
    state: &AppState,
    name: &str,
    arguments: &Map<String, Value>,
) -> Result<ToolCallResult, UnknownTool> {
    let tool = state
        .tools
        .get(name)
        .ok_or_else(|| UnknownTool(name.to_string()))?;

    Ok(tool.call(arguments).unwrap_or_else(|err| {
        tracing::debug!(tool = name, %err, "tool call failed");
        ToolCallResult::failure(err)
    }))
}

fn handle_initialize(state: &AppState, req: &JsonRpcRequest) -> JsonRpcResponse {
    let info = &state.server_info;
    JsonRpcResponse::success(
        req.id.clone(),
        serde_json::json!({
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "protocolVersion": info.protocol_version,
            "serverInfo": {
                "name": info.name,
                "version": info.version,
                "title": info.title
            }
        }),
    )
}

fn handle_tools_list(state: &AppState, req: &JsonRpcRequest) -> JsonRpcResponse {
    JsonRpcResponse::success(
        req.id.clone(),
        serde_json::json!({ "tools": state.tools.definitions() }),
    )
}

fn handle_tools_call(state: &AppState, req: &JsonRpcRequest) -> JsonRpcResponse {
    let params = req.params.as_ref().and_then(Value::as_object);

    let tool_name = display_value(params.and_then(|p| p.get("name")).unwrap_or(&Value::Null));

    let arguments = params
        .and_then(|p| p.get("arguments"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    match call_tool(state, &tool_name, &arguments) {
        Ok(result) => JsonRpcResponse::success(req.id.clone(), serde_json::json!(result)),
        Err(err) => JsonRpcResponse::error(req.id.clone(), METHOD_NOT_FOUND, err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> JsonRpcRequest {
        serde_json::from_value(value).unwrap()
    }

    fn call(name: &str, arguments: Value) -> JsonRpcResponse {
        let state = AppState::default();
        handle_request(
            &state,
            &request(json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {"name": name, "arguments": arguments}
            })),
        )
    }

    #[test]
    fn initialize_is_fixed() {
        let state = AppState::default();
        let first = handle_request(&state, &request(json!({"id": 1, "method": "initialize"})));
        let second = handle_request(
            &state,
            &request(json!({"id": 1, "method": "initialize", "params": {"anything": [1, 2]}})),
        );

        let result = first.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-06-18");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["serverInfo"]["name"], "complex_math");
        assert_eq!(Some(result), second.result);
    }

    #[test]
    fn tools_list_returns_three_schemas() {
        let state = AppState::default();
        let resp = handle_request(&state, &request(json!({"id": "x", "method": "tools/list"})));
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0]["name"], "calculate");
        assert_eq!(tools[1]["inputSchema"]["required"], json!(["a", "b", "c"]));
        assert_eq!(resp.id, json!("x"));
    }

    #[test]
    fn calculate_succeeds() {
        let resp = call("calculate", json!({"expr": "2+2"}));
        assert!(resp.error.is_none());
        assert_eq!(
            resp.result.unwrap(),
            json!({
                "content": [{"type": "text", "text": "result: 4.0"}],
                "structuredContent": {"result": 4.0}
            })
        );
    }

    #[test]
    fn tool_failures_are_successful_responses() {
        let resp = call("calculate", json!({"expr": "__import__('os')"}));
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "error: function not allowed: __import__"
        );

        let resp = call("matrix_det", json!({"matrix": [[1, 2, 3], [4, 5]]}));
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "error: matrix must be square (2x2 or 3x3)"
        );
    }

    #[test]
    fn unknown_tool_is_a_protocol_error() {
        let resp = call("delete_everything", json!({}));
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.message, "Unknown tool: delete_everything");
        assert_eq!(resp.id, json!(7));
    }

    #[test]
    fn missing_tool_name() {
        let state = AppState::default();
        let resp = handle_request(&state, &request(json!({"id": 2, "method": "tools/call"})));
        assert_eq!(resp.error.unwrap().message, "Unknown tool: None");

        let resp = call_named(json!(false));
        assert_eq!(resp.error.unwrap().message, "Unknown tool: False");
    }

    fn call_named(name: Value) -> JsonRpcResponse {
        let state = AppState::default();
        handle_request(
            &state,
            &request(json!({"id": 2, "method": "tools/call", "params": {"name": name}})),
        )
    }

    #[test]
    fn missing_method() {
        let state = AppState::default();
        let resp = handle_request(&state, &request(json!({"id": 4})));
        assert_eq!(resp.error.unwrap().message, "Unknown method: None");
    }

    #[test]
    fn missing_arguments_default_to_empty() {
        let state = AppState::default();
        let resp = handle_request(
            &state,
            &request(json!({
                "id": 3,
                "method": "tools/call",
                "params": {"name": "quadratic_solve", "arguments": null}
            })),
        );
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "error: missing required argument: a");
    }

    #[test]
    fn unknown_method() {
        let state = AppState::default();
        let resp = handle_request(&state, &request(json!({"id": null, "method": "foo/bar"})));
        assert!(resp.id.is_null());
        let err = resp.error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.message, "Unknown method: foo/bar");
    }
}
