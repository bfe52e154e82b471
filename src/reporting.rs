// Reply formatting for MCP tool results
// A reply is one text content block holding indented JSON, or an error
// message with `isError` set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// `tools/call` result envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReply {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ToolReply {
    /// Text payload of the single content block
    pub fn text(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or("")
    }
}

/// Wrap an API response as pretty-printed JSON text
pub fn format_result(value: &Value) -> ToolReply {
    // Serializing a Value cannot fail; fall back to compact form regardless.
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    ToolReply {
        content: vec![ContentBlock::text(text)],
        is_error: false,
    }
}

/// Error reply shown to the calling agent
pub fn format_error(err: &ToolError) -> ToolReply {
    ToolReply {
        content: vec![ContentBlock::text(format!("Error: {}", err))],
        is_error: true,
    }
}
