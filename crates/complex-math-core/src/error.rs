/// Rejection raised while parsing or lowering a `calculate` expression.
///
/// The `Display` text of each variant is what callers see after the
/// `error: ` prefix, so the wording is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("invalid syntax")]
    InvalidSyntax,

    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("function not allowed: {0}")]
    FunctionNotAllowed(String),

    #[error("invalid function call")]
    InvalidCall,

    #[error("keyword args not allowed")]
    KeywordArguments,

    #[error("constants other than numbers are not allowed")]
    NonNumericConstant,

    #[error(
        "{function}() takes exactly {expected} {noun} ({given} given)",
        noun = argument_noun(.expected)
    )]
    Arity {
        function: &'static str,
        expected: usize,
        given: usize,
    },

    #[error("unsupported expression")]
    Unsupported,

    #[error("expression too deeply nested")]
    TooDeep,
}

fn argument_noun(count: &usize) -> &'static str {
    if *count == 1 {
        "argument"
    } else {
        "arguments"
    }
}

/// Failure of a tool invocation. Surfaced as an `isError` tool result,
/// never as a JSON-RPC error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("argument {0} must be a number")]
    NotANumber(&'static str),

    #[error("matrix must be an array of arrays")]
    NotAMatrix,

    #[error("only 2x2 or 3x3 supported")]
    UnsupportedDimension,

    #[error("matrix must be square (2x2 or 3x3)")]
    NotSquare,

    #[error("matrix entries must be numbers")]
    NonNumericEntry,
}
