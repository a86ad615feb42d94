use serde::{Deserialize, Serialize};
use serde_json::Value;

use complex_math_core::{tools, Tool};

/// Definition of an MCP tool as reported by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            title: tool.title().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        }
    }
}

/// Registry of the tools the server exposes.
///
/// Built once at start-up and only read afterwards.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        let definitions = tools.iter().map(|tool| ToolDefinition::of(tool.as_ref())).collect();
        Self { tools, definitions }
    }

    /// The tool definitions for the MCP `tools/list` method.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Look up a tool by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(tools::builtin())
    }
}
