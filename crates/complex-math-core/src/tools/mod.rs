mod calculate;
mod matrix;
mod quadratic;

pub use calculate::{calculate, Calculate, Calculation};
pub use matrix::{determinant, Determinant, MatrixDet};
pub use quadratic::{solve_quadratic, QuadraticRoots, QuadraticSolve};

use crate::traits::Tool;

/// The built-in tools, in the order `tools/list` reports them.
pub fn builtin() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(Calculate),
        Box::new(QuadraticSolve),
        Box::new(MatrixDet),
    ]
}
