//! LLM provider abstraction
//!
//! Providers implement the [`LlmProvider`] trait. Only Google Gemini ships
//! here; tests drive the runner with scripted providers instead.

pub mod gemini;
pub mod types;

pub use gemini::GeminiProvider;
pub use types::{
    BuiltInTool, ChatBlock, ChatMessage, ChatMessageContent, ChatResponse, ChatResponseBlock,
    ChatRole, ChatUsage, LlmProvider, StopReason, ToolDefinition,
};
