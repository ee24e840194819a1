//! A2A client — talks JSON-RPC to a running agent

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::protocol::*;

/// A2A client for a single agent endpoint
#[derive(Clone)]
pub struct A2aClient {
    http: Client,
    base_url: String,
    next_id: Arc<AtomicU64>,
}

impl A2aClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the agent's capability card
    pub async fn fetch_agent_card(&self) -> Result<AgentCard> {
        let url = format!("{}/.well-known/agent.json", self.base_url);
        debug!("Fetching agent card from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to agent at {}", url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Agent card request failed: HTTP {}", resp.status()));
        }

        let card: AgentCard = resp.json().await.context("Failed to parse agent card")?;
        info!("Fetched agent card: {} ({} skills)", card.name, card.skills.len());
        Ok(card)
    }

    /// Send a task and wait for the agent's answer
    pub async fn send_task(&self, params: TaskSendParams) -> Result<Task> {
        let task: Task = self.call(methods::SEND, serde_json::to_value(&params)?).await?;
        info!("Task {} finished with status {}", task.id, task.status.state);
        Ok(task)
    }

    pub async fn get_task(&self, task_id: &str, history_length: Option<usize>) -> Result<Task> {
        let params = TaskQueryParams {
            id: task_id.to_string(),
            history_length,
            metadata: None,
        };
        self.call(methods::GET, serde_json::to_value(&params)?).await
    }

    pub async fn cancel_task(&self, task_id: &str) -> Result<Task> {
        let params = TaskIdParams {
            id: task_id.to_string(),
            metadata: None,
        };
        self.call(methods::CANCEL, serde_json::to_value(&params)?).await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(Value::from(id), method, params);
        debug!("A2A {} -> {}", method, self.base_url);

        let resp = self
            .http
            .post(format!("{}/", self.base_url))
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to call {} at {}", method, self.base_url))?;

        let status = resp.status();
        let body: JsonRpcResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response (HTTP {})", method, status))?;

        if let Some(err) = body.error {
            return Err(anyhow!("{} failed: {} (code {})", method, err.message, err.code));
        }
        let result = body
            .result
            .ok_or_else(|| anyhow!("{} returned neither result nor error", method))?;
        serde_json::from_value(result).with_context(|| format!("Unexpected {} result", method))
    }
}
