pub mod ast;
pub mod error;
pub mod eval;
pub mod format;
pub mod lexer;
pub mod syntax;
pub mod tools;
pub mod traits;
pub mod types;

pub use error::{EvalError, ToolError};
pub use eval::evaluate;
pub use traits::{Tool, ToolOutput};
pub use types::{ContentBlock, Number, ToolCallResult};
