//! The evaluable expression tree.
//!
//! [`Expr`] is closed over exactly the constructs `calculate` may run:
//! numeric literals, the named constants, unary `+`/`-`, the six arithmetic
//! operators and calls to the whitelisted functions. Lowering from the
//! general [`Node`] tree fails on every other node kind.

use std::f64::consts;

use crate::error::EvalError;
use crate::syntax::{BinaryOperator, Node, NodeKind, UnaryOperator};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Constant(Constant),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
    Tau,
}

impl Constant {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pi" => Some(Self::Pi),
            "e" => Some(Self::E),
            "tau" => Some(Self::Tau),
            _ => None,
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Self::Pi => consts::PI,
            Self::E => consts::E,
            Self::Tau => consts::TAU,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Log,
    Exp,
    Sqrt,
    Abs,
    Pow,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "log" => Some(Self::Log),
            "exp" => Some(Self::Exp),
            "sqrt" => Some(Self::Sqrt),
            "abs" => Some(Self::Abs),
            "pow" => Some(Self::Pow),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Pow => "pow",
        }
    }

    /// Number of positional arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Pow => 2,
            _ => 1,
        }
    }
}

impl Expr {
    /// Lower a syntax tree into an evaluable expression.
    ///
    /// Rejections are reported in evaluation order: left operand before
    /// right, callee before arguments.
    ///
    /// # Errors
    ///
    /// Returns the [`EvalError`] describing the first construct outside the
    /// whitelist.
    pub fn lower(node: &Node) -> Result<Self, EvalError> {
        match &node.kind {
            NodeKind::Number(value) => Ok(Self::Number(*value)),
            NodeKind::Str(_) => Err(EvalError::NonNumericConstant),
            NodeKind::Name(name) => match name.as_str() {
                "True" | "False" | "None" => Err(EvalError::NonNumericConstant),
                _ => Constant::from_name(name)
                    .map(Self::Constant)
                    .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
            },
            NodeKind::Unary { op, operand } => {
                let op = match op {
                    UnaryOperator::Plus => UnaryOp::Plus,
                    UnaryOperator::Minus => UnaryOp::Minus,
                    UnaryOperator::Invert | UnaryOperator::Not => {
                        return Err(EvalError::Unsupported)
                    }
                };
                Ok(Self::Unary {
                    op,
                    operand: Box::new(Self::lower(operand)?),
                })
            }
            NodeKind::Binary { op, left, right } => {
                let op = match op {
                    BinaryOperator::Add => BinaryOp::Add,
                    BinaryOperator::Sub => BinaryOp::Sub,
                    BinaryOperator::Mul => BinaryOp::Mul,
                    BinaryOperator::Div => BinaryOp::Div,
                    BinaryOperator::Pow => BinaryOp::Pow,
                    BinaryOperator::Mod => BinaryOp::Mod,
                    _ => return Err(EvalError::Unsupported),
                };
                Ok(Self::Binary {
                    op,
                    left: Box::new(Self::lower(left)?),
                    right: Box::new(Self::lower(right)?),
                })
            }
            NodeKind::Call {
                callee,
                args,
                keywords,
            } => {
                let NodeKind::Name(name) = &callee.kind else {
                    return Err(EvalError::InvalidCall);
                };
                let function = Function::from_name(name)
                    .ok_or_else(|| EvalError::FunctionNotAllowed(name.clone()))?;
                let args = args.iter().map(Self::lower).collect::<Result<Vec<_>, _>>()?;
                if !keywords.is_empty() {
                    return Err(EvalError::KeywordArguments);
                }
                if args.len() != function.arity() {
                    return Err(EvalError::Arity {
                        function: function.name(),
                        expected: function.arity(),
                        given: args.len(),
                    });
                }
                Ok(Self::Call { function, args })
            }
            NodeKind::Imaginary
            | NodeKind::Compare { .. }
            | NodeKind::Attribute { .. }
            | NodeKind::Subscript { .. }
            | NodeKind::Collection(_)
            | NodeKind::Other(_) => Err(EvalError::Unsupported),
        }
    }
}
