//! Provider-agnostic types for LLM chat with tool calls

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A function the model may call, as advertised to the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tools executed on the provider side rather than by us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltInTool {
    /// Search grounding performed by the model backend
    GoogleSearch,
}

impl BuiltInTool {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GoogleSearch => "google_search",
        }
    }
}

/// Provider-agnostic chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: ChatMessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Content of a chat message — either plain text or structured blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessageContent {
    Text(String),
    Blocks(Vec<ChatBlock>),
}

/// A single block within a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatBlock {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

/// Provider-agnostic response from an LLM
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub blocks: Vec<ChatResponseBlock>,
    pub stop_reason: StopReason,
    pub usage: ChatUsage,
}

/// A block in the response
#[derive(Debug, Clone)]
pub enum ChatResponseBlock {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        input: Value,
    },
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Unknown,
}

/// Token usage from a single API call
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait that all LLM providers implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini")
    fn provider_name(&self) -> &str;

    /// Model identifier (e.g. "gemini-2.0-flash")
    fn model(&self) -> &str;

    /// Send a chat request with function tools, provider-side tools and a system prompt
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        builtins: &[BuiltInTool],
        system: &str,
    ) -> Result<ChatResponse>;
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: ChatMessageContent::Text(text.into()),
        }
    }

    pub fn assistant_blocks(blocks: Vec<ChatBlock>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: ChatMessageContent::Blocks(blocks),
        }
    }

    pub fn tool_results(blocks: Vec<ChatBlock>) -> Self {
        Self {
            role: ChatRole::User,
            content: ChatMessageContent::Blocks(blocks),
        }
    }
}

impl StopReason {
    /// Whether the model wants to call tools
    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse)
    }

    /// Whether the model finished its turn
    pub fn is_end_turn(&self) -> bool {
        matches!(self, Self::EndTurn)
    }
}

impl ChatResponse {
    /// Concatenated text blocks of the response
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ChatResponseBlock::Text { text } => Some(text.as_str()),
                ChatResponseBlock::ToolCall { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.blocks.iter().filter_map(|b| match b {
            ChatResponseBlock::ToolCall { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            ChatResponseBlock::Text { .. } => None,
        })
    }
}

impl From<ChatResponseBlock> for ChatBlock {
    fn from(block: ChatResponseBlock) -> Self {
        match block {
            ChatResponseBlock::Text { text } => ChatBlock::Text { text },
            ChatResponseBlock::ToolCall { id, name, input } => {
                ChatBlock::ToolCall { id, name, input }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_display() {
        assert_eq!(ChatRole::User.to_string(), "user");
        assert_eq!(ChatRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_stop_reason_predicates() {
        assert!(StopReason::ToolUse.is_tool_use());
        assert!(!StopReason::EndTurn.is_tool_use());
        assert!(StopReason::EndTurn.is_end_turn());
        assert!(!StopReason::MaxTokens.is_end_turn());
    }

    #[test]
    fn test_builtin_tool_name() {
        assert_eq!(BuiltInTool::GoogleSearch.name(), "google_search");
        let json = serde_json::to_value(BuiltInTool::GoogleSearch).unwrap();
        assert_eq!(json, "google_search");
    }

    #[test]
    fn test_response_text_and_calls() {
        let resp = ChatResponse {
            blocks: vec![
                ChatResponseBlock::Text { text: "Planning ".to_string() },
                ChatResponseBlock::ToolCall {
                    id: "call_0".to_string(),
                    name: "generate_search_terms".to_string(),
                    input: serde_json::json!({"query": "q", "reason": "r"}),
                },
                ChatResponseBlock::Text { text: "now".to_string() },
            ],
            stop_reason: StopReason::ToolUse,
            usage: ChatUsage::default(),
        };
        assert_eq!(resp.text(), "Planning now");
        let calls: Vec<_> = resp.tool_calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "generate_search_terms");
    }

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, ChatRole::User);
        match msg.content {
            ChatMessageContent::Text(t) => assert_eq!(t, "hello"),
            ChatMessageContent::Blocks(_) => panic!("expected text"),
        }
        let msg = ChatMessage::assistant_blocks(vec![ChatBlock::Text { text: "x".to_string() }]);
        assert_eq!(msg.role, ChatRole::Assistant);
    }
}
