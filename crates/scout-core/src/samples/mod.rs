//! Sample agents served over A2A
//!
//! Each sample owns a [`Runner`] over its agent configuration and exposes the
//! hooks a task manager needs: accepted content types, a progress message, and
//! blocking or streaming invocation.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::agent::LlmAgent;
use crate::runner::{RunEvent, Runner};

pub mod planner;
pub mod search;

pub use planner::SearchPlannerAgent;
pub use search::SearchAgent;

/// Content types both samples accept and produce
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["text", "text/plain"];

/// User id every remote request runs under
pub const REMOTE_USER_ID: &str = "remote_agent";

/// An agent that can sit behind a task manager
#[async_trait]
pub trait SampleAgent: Send + Sync + 'static {
    fn runner(&self) -> &Arc<Runner>;

    /// Status text shown while a streamed request is in flight
    fn processing_message(&self) -> &str;

    fn supported_content_types(&self) -> &'static [&'static str] {
        SUPPORTED_CONTENT_TYPES
    }

    fn agent(&self) -> &LlmAgent {
        self.runner().agent()
    }

    async fn invoke(&self, query: &str, session_id: &str) -> Result<String> {
        self.runner().run(REMOTE_USER_ID, session_id, query).await
    }

    fn stream(&self, query: &str, session_id: &str) -> mpsc::Receiver<RunEvent> {
        self.runner()
            .stream(REMOTE_USER_ID, session_id, query, self.processing_message())
    }
}
