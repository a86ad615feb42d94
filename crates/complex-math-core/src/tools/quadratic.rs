use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::format::format_float;
use crate::traits::{Tool, ToolOutput};
use crate::types::{Number, ToolCallResult};

/// Roots of `ax^2 + bx + c = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuadraticRoots {
    Real(f64, f64),
    /// The conjugate pair `re ± im·i`.
    Complex { re: f64, im: f64 },
}

impl QuadraticRoots {
    fn complex_strings(re: f64, im: f64) -> (String, String) {
        let (re, im) = (format_float(re), format_float(im));
        (format!("{re}+{im}i"), format!("{re}-{im}i"))
    }
}

impl ToolOutput for QuadraticRoots {
    fn text(&self) -> String {
        match *self {
            Self::Real(x1, x2) => {
                format!("roots: {}, {} (real)", format_float(x1), format_float(x2))
            }
            Self::Complex { re, im } => {
                let (first, second) = Self::complex_strings(re, im);
                format!("roots: {first}, {second} (complex)")
            }
        }
    }

    /// Real roots are numbers, complex roots are strings.
    fn structured(&self) -> Value {
        match *self {
            Self::Real(x1, x2) => json!({ "roots": [x1, x2] }),
            Self::Complex { re, im } => {
                let (first, second) = Self::complex_strings(re, im);
                json!({ "roots": [first, second] })
            }
        }
    }
}

/// Solve `ax^2 + bx + c = 0`.
///
/// `a == 0` is not special-cased; the division yields `inf` or `nan`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> QuadraticRoots {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant >= 0.0 {
        let root = discriminant.sqrt();
        QuadraticRoots::Real((-b + root) / (2.0 * a), (-b - root) / (2.0 * a))
    } else {
        // Adding zero turns a `-0.0` real part into `0.0`.
        let re = -b / (2.0 * a) + 0.0;
        let im = (-discriminant).sqrt() / (2.0 * a);
        QuadraticRoots::Complex { re, im }
    }
}

/// Read a required coefficient: a JSON number, a numeric string or a
/// boolean.
fn coefficient(arguments: &Map<String, Value>, key: &'static str) -> Result<f64, ToolError> {
    let value = arguments
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or(ToolError::MissingArgument(key))?;
    if let Some(number) = Number::from_json(value) {
        return Ok(number.as_f64());
    }
    value
        .as_str()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or(ToolError::NotANumber(key))
}

/// The `quadratic_solve` tool.
pub struct QuadraticSolve;

impl Tool for QuadraticSolve {
    fn name(&self) -> &'static str {
        "quadratic_solve"
    }

    fn title(&self) -> &'static str {
        "Solve Quadratic"
    }

    fn description(&self) -> &'static str {
        "Solve ax^2 + bx + c = 0 for real or complex roots."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"},
                "c": {"type": "number"}
            },
            "required": ["a", "b", "c"]
        })
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<ToolCallResult, ToolError> {
        let a = coefficient(arguments, "a")?;
        let b = coefficient(arguments, "b")?;
        let c = coefficient(arguments, "c")?;
        Ok(ToolCallResult::success(&solve_quadratic(a, b, c)))
    }
}
