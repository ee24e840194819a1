//! A2A (Agent-to-Agent) protocol support for Scout
//!
//! Serves a sample agent over Google's Agent-to-Agent protocol and provides a
//! small client for talking to such servers.

pub mod client;
pub mod protocol;
pub mod server;
pub mod task_manager;

pub use client::A2aClient;
pub use protocol::{
    A2aError, AgentCapabilities, AgentCard, AgentSkill, Task, TaskEvent, TaskSendParams, TaskState,
};
pub use server::A2aServer;
pub use task_manager::{AgentTaskManager, TaskManager};

#[cfg(test)]
pub(crate) mod testing {
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use scout_core::SearchPlannerAgent;
    use scout_core::providers::{
        BuiltInTool, ChatMessage, ChatResponse, ChatResponseBlock, ChatUsage, LlmProvider,
        StopReason, ToolDefinition,
    };

    use crate::protocol::{AgentCapabilities, AgentCard};

    struct Replay(Mutex<Vec<ChatResponse>>);

    #[async_trait]
    impl LlmProvider for Replay {
        fn provider_name(&self) -> &str {
            "replay"
        }

        fn model(&self) -> &str {
            "replay-1"
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
            _builtins: &[BuiltInTool],
            _system: &str,
        ) -> Result<ChatResponse> {
            let mut replies = self.0.lock().unwrap();
            if replies.is_empty() {
                return Err(anyhow!("no reply scripted"));
            }
            Ok(replies.remove(0))
        }
    }

    pub fn text_reply(text: &str) -> ChatResponse {
        ChatResponse {
            blocks: vec![ChatResponseBlock::Text {
                text: text.to_string(),
            }],
            stop_reason: StopReason::EndTurn,
            usage: ChatUsage::default(),
        }
    }

    pub fn planner_with(replies: Vec<ChatResponse>) -> SearchPlannerAgent {
        SearchPlannerAgent::new(Arc::new(Replay(Mutex::new(replies))))
    }

    pub fn planner_card(host: &str, port: u16) -> AgentCard {
        AgentCard {
            name: "Search Planner Agent".to_string(),
            description: None,
            url: format!("http://{}:{}/", host, port),
            provider: None,
            version: "1.0.0".to_string(),
            documentation_url: None,
            capabilities: AgentCapabilities {
                streaming: true,
                ..Default::default()
            },
            authentication: None,
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills: vec![],
        }
    }
}
