use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::llm::provider::{Message, TokenUsage};
use crate::tools::definition::{ToolDefinition, ToolResult};

pub const DEFAULT_CONTEXT: &str = "You are a helpful assistant. Provide concise and accurate responses.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_context")]
    pub context: String,
    #[serde(default = "default_true")]
    pub enable_functions: bool,
    /// Full history including the system turn. Replaces `context` + `message` when non-empty.
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_calls: Option<Vec<ToolResult>>,
    pub has_function_calls: bool,
    pub usage: TokenUsage,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsResponse {
    pub functions: Vec<String>,
    pub function_definitions: BTreeMap<String, ToolDefinition>,
}

impl FunctionsResponse {
    pub fn from_definitions(defs: &[ToolDefinition]) -> Self {
        Self {
            functions: defs.iter().map(|d| d.name.clone()).collect(),
            function_definitions: defs.iter().map(|d| (d.name.clone(), d.clone())).collect(),
        }
    }
}

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

fn default_true() -> bool {
    true
}
