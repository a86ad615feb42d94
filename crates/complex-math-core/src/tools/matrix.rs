use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::traits::{Tool, ToolOutput};
use crate::types::{Number, ToolCallResult};

/// Determinant of a 2x2 or 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Determinant(pub Number);

impl ToolOutput for Determinant {
    fn text(&self) -> String {
        format!("determinant: {}", self.0)
    }

    fn structured(&self) -> Value {
        json!({ "det": self.0 })
    }
}

/// Validate `matrix` and compute its determinant.
///
/// Shape checks run in a fixed order: array of arrays, then dimension, then
/// squareness. Integer matrices keep integer arithmetic unless it overflows.
///
/// # Errors
///
/// Returns the [`ToolError`] of the first failed check.
pub fn determinant(matrix: &Value) -> Result<Determinant, ToolError> {
    let rows = matrix
        .as_array()
        .filter(|rows| !rows.is_empty())
        .ok_or(ToolError::NotAMatrix)?
        .iter()
        .map(|row| row.as_array().ok_or(ToolError::NotAMatrix))
        .collect::<Result<Vec<_>, _>>()?;

    let n = rows.len();
    if n != 2 && n != 3 {
        return Err(ToolError::UnsupportedDimension);
    }
    if rows.iter().any(|row| row.len() != n) {
        return Err(ToolError::NotSquare);
    }

    let cells = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| Number::from_json(cell).ok_or(ToolError::NonNumericEntry))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ints: Option<Vec<Vec<i64>>> = cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Number::Int(i) => Some(*i),
                    Number::Float(_) => None,
                })
                .collect()
        })
        .collect();

    if let Some(det) = ints.as_deref().and_then(int_det) {
        return Ok(Determinant(Number::Int(det)));
    }

    let floats: Vec<Vec<f64>> = cells
        .iter()
        .map(|row| row.iter().map(|cell| cell.as_f64()).collect())
        .collect();
    Ok(Determinant(Number::Float(float_det(&floats))))
}

fn float_det(m: &[Vec<f64>]) -> f64 {
    if m.len() == 2 {
        return m[0][0] * m[1][1] - m[0][1] * m[1][0];
    }
    let (a, b, c) = (m[0][0], m[0][1], m[0][2]);
    let (d, e, f) = (m[1][0], m[1][1], m[1][2]);
    let (g, h, i) = (m[2][0], m[2][1], m[2][2]);
    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}

/// Exact integer determinant, `None` on overflow.
fn int_det(m: &[Vec<i64>]) -> Option<i64> {
    let minor = |w: i64, x: i64, y: i64, z: i64| w.checked_mul(z)?.checked_sub(x.checked_mul(y)?);

    if m.len() == 2 {
        return minor(m[0][0], m[0][1], m[1][0], m[1][1]);
    }
    let (a, b, c) = (m[0][0], m[0][1], m[0][2]);
    let (d, e, f) = (m[1][0], m[1][1], m[1][2]);
    let (g, h, i) = (m[2][0], m[2][1], m[2][2]);
    a.checked_mul(minor(e, f, h, i)?)?
        .checked_sub(b.checked_mul(minor(d, f, g, i)?)?)?
        .checked_add(c.checked_mul(minor(d, e, g, h)?)?)
}

/// The `matrix_det` tool.
pub struct MatrixDet;

impl Tool for MatrixDet {
    fn name(&self) -> &'static str {
        "matrix_det"
    }

    fn title(&self) -> &'static str {
        "Matrix Determinant"
    }

    fn description(&self) -> &'static str {
        "Compute determinant of a 2x2 or 3x3 matrix."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "matrix": {
                    "type": "array",
                    "items": {"type": "array", "items": {"type": "number"}},
                    "description": "2x2 or 3x3 matrix as nested arrays"
                }
            },
            "required": ["matrix"]
        })
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let matrix = arguments.get("matrix").unwrap_or(&Value::Null);
        Ok(ToolCallResult::success(&determinant(matrix)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentBlock;

    fn det(matrix: Value) -> Result<Number, ToolError> {
        determinant(&matrix).map(|d| d.0)
    }

    #[test]
    fn two_by_two() {
        assert_eq!(det(json!([[1, 2], [3, 4]])).unwrap(), Number::Int(-2));
    }

    #[test]
    fn three_by_three() {
        assert_eq!(
            det(json!([[1, 2, 3], [4, 5, 6], [7, 8, 10]])).unwrap(),
            Number::Int(-3)
        );
    }

    #[test]
    fn float_entries_give_float_determinant() {
        assert_eq!(det(json!([[1.5, 2], [3, 4]])).unwrap(), Number::Float(0.0));
        assert_eq!(det(json!([[2.0, 0], [0, 2]])).unwrap(), Number::Float(4.0));
    }

    #[test]
    fn integer_overflow_falls_back_to_floats() {
        let big = i64::MAX;
        let Number::Float(value) = det(json!([[big, 0], [0, big]])).unwrap() else {
            panic!("expected float determinant");
        };
        assert!(value > 8.5e37);
    }

    #[test]
    fn tool_output_shape() {
        let args = json!({"matrix": [[1, 2], [3, 4]]});
        let result = MatrixDet.call(args.as_object().unwrap()).unwrap();
        assert_eq!(result.content[0], ContentBlock::text("determinant: -2"));
        assert_eq!(result.structured_content, Some(json!({"det": -2})));
    }

    #[test]
    fn validation_order() {
        assert!(matches!(det(json!(null)), Err(ToolError::NotAMatrix)));
        assert!(matches!(det(json!([])), Err(ToolError::NotAMatrix)));
        assert!(matches!(det(json!([1, 2])), Err(ToolError::NotAMatrix)));
        assert!(matches!(det(json!([[1]])), Err(ToolError::UnsupportedDimension)));
        assert!(matches!(
            det(json!([[1, 2, 3, 4], [1, 2, 3, 4], [1, 2, 3, 4], [1, 2, 3, 4]])),
            Err(ToolError::UnsupportedDimension)
        ));
        assert!(matches!(det(json!([[1, 2, 3], [4, 5]])), Err(ToolError::NotSquare)));
        assert!(matches!(det(json!([[1, "x"], [3, 4]])), Err(ToolError::NonNumericEntry)));
    }

    #[test]
    fn squareness_message() {
        let err = det(json!([[1, 2, 3], [4, 5]])).unwrap_err();
        assert_eq!(err.to_string(), "matrix must be square (2x2 or 3x3)");
    }
}
