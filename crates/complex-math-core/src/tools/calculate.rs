use serde_json::{json, Map, Value};

use crate::error::{EvalError, ToolError};
use crate::eval::evaluate;
use crate::format::{display_value, format_float};
use crate::traits::{Tool, ToolOutput};
use crate::types::ToolCallResult;

/// Result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calculation {
    pub result: f64,
}

impl ToolOutput for Calculation {
    fn text(&self) -> String {
        format!("result: {}", format_float(self.result))
    }

    fn structured(&self) -> Value {
        json!({ "result": self.result })
    }
}

/// Evaluate `expr` with the restricted expression evaluator.
///
/// # Errors
///
/// Propagates the evaluator's rejection.
pub fn calculate(expr: &str) -> Result<Calculation, EvalError> {
    evaluate(expr).map(|result| Calculation { result })
}

/// The `calculate` tool.
pub struct Calculate;

impl Tool for Calculate {
    fn name(&self) -> &'static str {
        "calculate"
    }

    fn title(&self) -> &'static str {
        "Evaluate Math Expression"
    }

    fn description(&self) -> &'static str {
        "Safely evaluate a mathematical expression supporting +, -, *, /, **, \
         parentheses, and common functions: sin, cos, tan, log, exp, sqrt, abs, pow."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expr": {
                    "type": "string",
                    "description": "Expression to evaluate"
                }
            },
            "required": ["expr"]
        })
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        // A non-string expression is evaluated from its rendered text.
        let expr = arguments.get("expr").map(display_value).unwrap_or_default();
        let calculation = calculate(&expr)?;
        Ok(ToolCallResult::success(&calculation))
    }
}
