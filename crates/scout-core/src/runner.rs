//! Agent runner — drives a model through tool calls over in-memory sessions

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::agent::LlmAgent;
use crate::providers::{BuiltInTool, ChatBlock, ChatMessage, LlmProvider, ToolDefinition};
use crate::tools::{ToolExecutor, ToolRegistry};

/// Upper bound on model calls within one run
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Progress reported by [`Runner::stream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Working { message: String },
    Completed { text: String },
    Failed { error: String },
}

impl RunEvent {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Working { .. })
    }
}

type SessionKey = (String, String);

/// One conversation; its lock is held for the length of a run
type Session = Arc<Mutex<Vec<ChatMessage>>>;

/// Executes one agent against one provider
pub struct Runner {
    app_name: String,
    agent: LlmAgent,
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    definitions: Vec<ToolDefinition>,
    builtins: Vec<BuiltInTool>,
    sessions: RwLock<HashMap<SessionKey, Session>>,
    max_turns: usize,
}

impl Runner {
    pub fn new(agent: LlmAgent, provider: Arc<dyn LlmProvider>) -> Self {
        let registry = agent.registry();
        let definitions = agent.tool_definitions();
        let builtins = agent.builtin_tools();
        info!(
            "Runner for {} using {}/{} ({} tools)",
            agent.name,
            provider.provider_name(),
            provider.model(),
            agent.tools.len()
        );
        Self {
            app_name: agent.name.clone(),
            agent,
            provider,
            registry,
            definitions,
            builtins,
            sessions: RwLock::new(HashMap::new()),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn agent(&self) -> &LlmAgent {
        &self.agent
    }

    fn key(user_id: &str, session_id: &str) -> SessionKey {
        (user_id.to_string(), session_id.to_string())
    }

    async fn session(&self, user_id: &str, session_id: &str) -> Session {
        let key = Self::key(user_id, session_id);
        if let Some(session) = self.sessions.read().await.get(&key) {
            return Arc::clone(session);
        }
        Arc::clone(self.sessions.write().await.entry(key).or_default())
    }

    /// Conversation so far for a session, empty if unknown
    pub async fn history(&self, user_id: &str, session_id: &str) -> Vec<ChatMessage> {
        let session = self
            .sessions
            .read()
            .await
            .get(&Self::key(user_id, session_id))
            .cloned();
        match session {
            Some(session) => session.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Run one user turn to completion and return the model's final text
    ///
    /// Runs within the same session are serialised so each one sees the
    /// turns stored by the previous.
    pub async fn run(&self, user_id: &str, session_id: &str, text: &str) -> Result<String> {
        let session = self.session(user_id, session_id).await;
        let mut stored = session.lock().await;
        let mut history = stored.clone();
        history.push(ChatMessage::user(text));
        debug!(
            "{}: run in session {} ({} prior messages)",
            self.app_name,
            session_id,
            history.len() - 1
        );

        for turn in 0..self.max_turns {
            let response = self
                .provider
                .chat(
                    &history,
                    &self.definitions,
                    &self.builtins,
                    &self.agent.instruction,
                )
                .await?;

            let calls: Vec<(String, String, serde_json::Value)> = response
                .tool_calls()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();
            let final_text = response.text();
            history.push(ChatMessage::assistant_blocks(
                response.blocks.into_iter().map(ChatBlock::from).collect(),
            ));

            if calls.is_empty() {
                if !response.stop_reason.is_end_turn() {
                    warn!(
                        "{}: model stopped with {:?} on turn {}",
                        self.app_name, response.stop_reason, turn
                    );
                }
                *stored = history;
                return Ok(final_text);
            }

            let mut results = Vec::with_capacity(calls.len());
            for (id, name, input) in calls {
                let content = match self.registry.execute(&name, input).await {
                    Ok(output) => output,
                    Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
                };
                results.push(ChatBlock::ToolResult {
                    tool_call_id: id,
                    name,
                    content,
                });
            }
            history.push(ChatMessage::tool_results(results));
        }

        Err(anyhow!(
            "{} exceeded {} model turns without finishing",
            self.app_name,
            self.max_turns
        ))
    }

    /// Run in the background, reporting progress over a channel
    pub fn stream(
        self: &Arc<Self>,
        user_id: &str,
        session_id: &str,
        text: &str,
        processing_message: &str,
    ) -> mpsc::Receiver<RunEvent> {
        let (tx, rx) = mpsc::channel(8);
        let runner = Arc::clone(self);
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        let text = text.to_string();
        let processing_message = processing_message.to_string();

        tokio::spawn(async move {
            let _ = tx
                .send(RunEvent::Working {
                    message: processing_message,
                })
                .await;
            let event = match runner.run(&user_id, &session_id, &text).await {
                Ok(text) => RunEvent::Completed { text },
                Err(e) => RunEvent::Failed {
                    error: e.to_string(),
                },
            };
            if tx.send(event).await.is_err() {
                debug!("Stream receiver for session {} dropped", session_id);
            }
        });

        rx
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::providers::ChatMessageContent;
    use crate::tools::GenerateSearchTermsTool;

    fn planner(provider: ScriptedProvider) -> (Arc<Runner>, Arc<GenerateSearchTermsTool>) {
        let tool = Arc::new(GenerateSearchTermsTool::new());
        let agent = LlmAgent::builder("planner")
            .model("scripted-1")
            .instruction("plan")
            .tool(tool.clone())
            .build();
        (Arc::new(Runner::new(agent, Arc::new(provider))), tool)
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let (runner, _) = planner(ScriptedProvider::new(vec![text("1. a\n2. b")]));
        let out = runner.run("u", "s1", "plan it").await.unwrap();
        assert_eq!(out, "1. a\n2. b");
        assert_eq!(runner.history("u", "s1").await.len(), 2);
        assert_eq!(runner.app_name(), "planner");
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let (runner, tool) = planner(ScriptedProvider::new(vec![
            call(
                "generate_search_terms",
                serde_json::json!({"query": "fusion", "reason": "overview"}),
            ),
            text("done"),
        ]));

        let out = runner.run("u", "s1", "fusion energy").await.unwrap();
        assert_eq!(out, "done");
        assert_eq!(tool.ledger().len().await, 1);

        // user, model call, tool result, model answer
        let history = runner.history("u", "s1").await;
        assert_eq!(history.len(), 4);
        match &history[2].content {
            ChatMessageContent::Blocks(blocks) => match &blocks[0] {
                ChatBlock::ToolResult { content, name, .. } => {
                    assert_eq!(name, "generate_search_terms");
                    assert!(content.contains("plan_id_"));
                }
                other => panic!("unexpected block {:?}", other),
            },
            ChatMessageContent::Text(_) => panic!("expected blocks"),
        }
    }

    #[tokio::test]
    async fn test_tool_error_is_fed_back() {
        let (runner, tool) = planner(ScriptedProvider::new(vec![
            call("generate_search_terms", serde_json::json!({"query": "x"})),
            text("recovered"),
        ]));
        let out = runner.run("u", "s1", "x").await.unwrap();
        assert_eq!(out, "recovered");
        assert!(tool.ledger().is_empty().await);

        let history = runner.history("u", "s1").await;
        match &history[2].content {
            ChatMessageContent::Blocks(blocks) => match &blocks[0] {
                ChatBlock::ToolResult { content, .. } => assert!(content.contains("error")),
                other => panic!("unexpected block {:?}", other),
            },
            ChatMessageContent::Text(_) => panic!("expected blocks"),
        }
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_and_accumulate() {
        let provider = ScriptedProvider::new(vec![text("one"), text("two"), text("three")]);
        let (runner, _) = planner(provider);
        runner.run("u", "a", "first").await.unwrap();
        runner.run("u", "a", "second").await.unwrap();
        runner.run("u", "b", "other").await.unwrap();
        assert_eq!(runner.history("u", "a").await.len(), 4);
        assert_eq!(runner.history("u", "b").await.len(), 2);
        assert!(runner.history("someone", "a").await.is_empty());
    }

    struct SlowProvider;

    #[async_trait::async_trait]
    impl LlmProvider for SlowProvider {
        fn provider_name(&self) -> &str {
            "slow"
        }

        fn model(&self) -> &str {
            "slow-1"
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
            _builtins: &[BuiltInTool],
            _system: &str,
        ) -> Result<crate::providers::ChatResponse> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(text("ok"))
        }
    }

    #[tokio::test]
    async fn test_concurrent_runs_keep_both_exchanges() {
        let agent = LlmAgent::builder("slow").build();
        let runner = Runner::new(agent, Arc::new(SlowProvider));

        let (a, b) = tokio::join!(
            runner.run("u", "s", "first"),
            runner.run("u", "s", "second")
        );
        a.unwrap();
        b.unwrap();

        let history = runner.history("u", "s").await;
        assert_eq!(history.len(), 4);
        let users: Vec<_> = history
            .iter()
            .filter_map(|m| match (&m.role, &m.content) {
                (crate::providers::ChatRole::User, ChatMessageContent::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(users.len(), 2);
        assert!(users.contains(&"first") && users.contains(&"second"));
    }

    #[tokio::test]
    async fn test_turn_limit() {
        let replies = (0..3)
            .map(|_| call("generate_search_terms", serde_json::json!({"query": "q", "reason": "r"})))
            .collect();
        let tool = Arc::new(GenerateSearchTermsTool::new());
        let agent = LlmAgent::builder("looping").tool(tool).build();
        let runner = Runner::new(agent, Arc::new(ScriptedProvider::new(replies))).with_max_turns(2);

        let err = runner.run("u", "s", "loop").await.unwrap_err();
        assert!(err.to_string().contains("exceeded 2 model turns"));
        assert!(runner.history("u", "s").await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let (runner, _) = planner(ScriptedProvider::new(vec![]));
        let err = runner.run("u", "s", "hi").await.unwrap_err();
        assert!(err.to_string().contains("script exhausted"));
    }

    #[tokio::test]
    async fn test_stream_events() {
        let (runner, _) = planner(ScriptedProvider::new(vec![text("streamed")]));
        let mut rx = runner.stream("u", "s", "go", "Planning...");

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first,
            RunEvent::Working {
                message: "Planning...".to_string()
            }
        );
        assert!(!first.is_final());
        let last = rx.recv().await.unwrap();
        assert_eq!(
            last,
            RunEvent::Completed {
                text: "streamed".to_string()
            }
        );
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_failure() {
        let (runner, _) = planner(ScriptedProvider::new(vec![]));
        let mut rx = runner.stream("u", "s", "go", "Planning...");
        rx.recv().await.unwrap();
        match rx.recv().await.unwrap() {
            RunEvent::Failed { error } => assert!(error.contains("script exhausted")),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
