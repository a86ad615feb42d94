use serde_json::{json, Value};

use complex_math_server::app_state::AppState;
use complex_math_server::transport::{self, ServeSummary};

/// Feed `input` through the transport loop and return the raw output.
async fn run(input: &str) -> (String, ServeSummary) {
    let state = AppState::default();
    let mut output = Vec::new();
    let summary = transport::serve(&state, input.as_bytes(), &mut output)
        .await
        .unwrap();
    (String::from_utf8(output).unwrap(), summary)
}

async fn exchange(requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    let (output, _) = run(&input).await;
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

#[tokio::test]
async fn handshake() {
    let responses = exchange(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    ])
    .await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(responses[0]["result"]["serverInfo"]["title"], "Complex Math Helper");

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, ["calculate", "quadratic_solve", "matrix_det"]);
}

#[tokio::test]
async fn calculate_end_to_end() {
    let responses = exchange(&[
        tool_call(1, "calculate", json!({"expr": "2+2"})),
        tool_call(2, "calculate", json!({"expr": "sqrt(16)"})),
        tool_call(3, "calculate", json!({"expr": "__import__('os')"})),
        tool_call(4, "calculate", json!({"expr": "().__class__.__bases__[0]"})),
    ])
    .await;

    assert_eq!(
        responses[0]["result"],
        json!({
            "content": [{"type": "text", "text": "result: 4.0"}],
            "structuredContent": {"result": 4.0}
        })
    );
    assert_eq!(responses[1]["result"]["structuredContent"], json!({"result": 4.0}));

    for rejected in &responses[2..] {
        assert!(rejected.get("error").is_none());
        assert_eq!(rejected["result"]["isError"], true);
        assert!(rejected["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("error: "));
    }
}

#[tokio::test]
async fn quadratic_end_to_end() {
    let responses = exchange(&[
        tool_call(1, "quadratic_solve", json!({"a": 1, "b": 0, "c": 1})),
        tool_call(2, "quadratic_solve", json!({"a": 1, "b": -3, "c": 2})),
    ])
    .await;

    assert_eq!(
        responses[0]["result"]["structuredContent"]["roots"],
        json!(["0.0+1.0i", "0.0-1.0i"])
    );
    assert_eq!(
        responses[0]["result"]["content"][0]["text"],
        "roots: 0.0+1.0i, 0.0-1.0i (complex)"
    );
    assert_eq!(
        responses[1]["result"]["structuredContent"]["roots"],
        json!([2.0, 1.0])
    );
}

#[tokio::test]
async fn matrix_end_to_end() {
    let responses = exchange(&[
        tool_call(1, "matrix_det", json!({"matrix": [[1, 2], [3, 4]]})),
        tool_call(2, "matrix_det", json!({"matrix": [[1, 2, 3], [4, 5, 6], [7, 8, 10]]})),
        tool_call(3, "matrix_det", json!({"matrix": [[1, 2, 3], [4, 5]]})),
    ])
    .await;

    assert_eq!(responses[0]["result"]["structuredContent"]["det"], -2);
    assert_eq!(responses[1]["result"]["structuredContent"]["det"], -3);
    assert_eq!(responses[2]["result"]["isError"], true);
    assert!(responses[2]["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("square"));
}

#[tokio::test]
async fn routing_errors() {
    let responses = exchange(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "foo/bar"}),
        tool_call(2, "no_such_tool", json!({})),
    ])
    .await;

    assert_eq!(responses[0]["error"]["code"], -32601);
    assert_eq!(responses[0]["error"]["message"], "Unknown method: foo/bar");
    assert!(responses[0].get("result").is_none());

    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["error"]["code"], -32601);
    assert_eq!(responses[1]["error"]["message"], "Unknown tool: no_such_tool");
}

#[tokio::test]
async fn ids_are_echoed() {
    let responses = exchange(&[
        json!({"id": "req-1", "method": "tools/list"}),
        json!({"id": null, "method": "tools/list"}),
        json!({"method": "initialize"}),
        json!({"id": {"nested": [1]}, "method": "initialize"}),
    ])
    .await;

    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0]["id"], "req-1");
    assert!(responses[1]["id"].is_null());
    assert!(responses[2].as_object().unwrap().contains_key("id"));
    assert!(responses[2]["id"].is_null());
    assert_eq!(responses[3]["id"], json!({"nested": [1]}));
}

#[tokio::test]
async fn large_and_fractional_ids_are_echoed_exactly() {
    let input = concat!(
        r#"{"id":123456789012345678901234567890,"method":"tools/list"}"#,
        "\n",
        r#"{"id":1.50,"method":"tools/list"}"#,
        "\n",
    );
    let (output, _) = run(input).await;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(r#""id":123456789012345678901234567890"#));
    assert!(lines[1].contains(r#""id":1.50"#));
}

#[tokio::test]
async fn blank_and_malformed_lines_produce_nothing() {
    let (output, summary) = run("\n   \n{oops\n[1,2]\n").await;
    assert!(output.is_empty());
    assert_eq!(summary, ServeSummary { lines: 4, responses: 0 });
}

#[tokio::test]
async fn one_compact_line_per_response() {
    let input = concat!(
        "\n",
        r#"{"id":1,"method":"tools/list"}"#,
        "\nnot json\n",
        r#"{"id":2,"method":"initialize"}"#,
    );
    let (output, summary) = run(input).await;

    assert_eq!(summary.lines, 4);
    assert_eq!(summary.responses, 2);
    assert!(output.ends_with('\n'));

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        let value: Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        // Compact re-serialization has the same length whatever the key order.
        assert_eq!(line.len(), serde_json::to_string(&value).unwrap().len());
    }
}

#[tokio::test]
async fn read_only_calls_are_byte_identical() {
    let list = r#"{"jsonrpc":"2.0","id":9,"method":"tools/list"}"#;
    let calc = concat!(
        r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","#,
        r#""params":{"name":"calculate","arguments":{"expr":"sin(pi/7)*e**2"}}}"#,
    );
    let (output, _) = run(&format!("{list}\n{list}\n{calc}\n{calc}\n")).await;

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], lines[1]);
    assert_eq!(lines[2], lines[3]);
}
