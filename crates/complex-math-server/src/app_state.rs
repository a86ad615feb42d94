use complex_math_mcp::ToolRegistry;

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Static identity reported in the `initialize` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub version: &'static str,
    pub protocol_version: &'static str,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "complex_math",
            title: "Complex Math Helper",
            version: "1.0.0",
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

/// Process-wide state, built once at start-up and read-only afterwards.
#[derive(Default)]
pub struct AppState {
    pub tools: ToolRegistry,
    pub server_info: ServerInfo,
}
