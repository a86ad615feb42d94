use crate::ast::{BinaryOp, Expr, Function, UnaryOp};
use crate::error::EvalError;
use crate::syntax;

/// Parse, validate and evaluate an arithmetic expression.
///
/// Arithmetic follows IEEE 754: division by zero and domain errors produce
/// `inf` or `nan` rather than failing.
///
/// # Errors
///
/// Returns an [`EvalError`] when the text is not an expression or uses any
/// construct outside the whitelist.
pub fn evaluate(source: &str) -> Result<f64, EvalError> {
    let node = syntax::parse(source)?;
    let expr = Expr::lower(&node)?;
    Ok(expr.eval())
}

impl Expr {
    /// Evaluate the tree bottom-up. A lowered tree is always evaluable.
    pub fn eval(&self) -> f64 {
        match self {
            Self::Number(value) => *value,
            Self::Constant(constant) => constant.value(),
            Self::Unary { op, operand } => {
                let value = operand.eval();
                match op {
                    UnaryOp::Plus => value,
                    UnaryOp::Minus => -value,
                }
            }
            Self::Binary { op, left, right } => {
                let (left, right) = (left.eval(), right.eval());
                match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div => left / right,
                    BinaryOp::Pow => left.powf(right),
                    BinaryOp::Mod => floored_rem(left, right),
                }
            }
            Self::Call { function, args } => {
                let args: Vec<f64> = args.iter().map(Self::eval).collect();
                match (function, args.as_slice()) {
                    (Function::Sin, [x]) => x.sin(),
                    (Function::Cos, [x]) => x.cos(),
                    (Function::Tan, [x]) => x.tan(),
                    (Function::Log, [x]) => x.ln(),
                    (Function::Exp, [x]) => x.exp(),
                    (Function::Sqrt, [x]) => x.sqrt(),
                    (Function::Abs, [x]) => x.abs(),
                    (Function::Pow, [x, y]) => x.powf(*y),
                    // Lowering checks arity, so this arm is unreachable.
                    _ => f64::NAN,
                }
            }
        }
    }
}

/// Remainder whose sign follows the divisor, as in `-7 % 3 == 2`.
fn floored_rem(left: f64, right: f64) -> f64 {
    let rem = left % right;
    if rem == 0.0 {
        0.0_f64.copysign(right)
    } else if (rem < 0.0) != (right < 0.0) {
        rem + right
    } else {
        rem
    }
}
