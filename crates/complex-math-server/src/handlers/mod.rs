mod mcp;

pub use mcp::{call_tool, handle_request, UnknownTool};
