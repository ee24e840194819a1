//! Web search agent — searches for a term and summarises the results

use std::sync::Arc;

use super::SampleAgent;
use crate::agent::{BuiltInTool, LlmAgent};
use crate::providers::LlmProvider;
use crate::runner::Runner;

pub const SEARCH_AGENT_MODEL: &str = "gemini-2.0-flash";
pub const SEARCH_AGENT_NAME: &str = "search_agent";

const DESCRIPTION: &str =
    "This agent searches the web for a term and produces a concise summary of the results.";

const INSTRUCTION: &str = "\
You are a research assistant. Given a search term, you search the web for that term and produce a concise summary of the results.
The summary must 2-3 paragraphs and less than 300 words. Capture the main points. Write succinctly, no need to have complete sentences
or good grammar. This will be consumed by someone synthesizing a report, so its vital you capture the essence and ignore any fluff.
Do not include any additional commentary other than the summary itself.
";

/// Grounds its answers through Gemini's own web search; registers no function tools
pub struct SearchAgent {
    runner: Arc<Runner>,
}

impl SearchAgent {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            runner: Arc::new(Runner::new(Self::build_agent(), provider)),
        }
    }

    fn build_agent() -> LlmAgent {
        LlmAgent::builder(SEARCH_AGENT_NAME)
            .model(SEARCH_AGENT_MODEL)
            .description(DESCRIPTION)
            .instruction(INSTRUCTION)
            .builtin(BuiltInTool::GoogleSearch)
            .build()
    }
}

impl SampleAgent for SearchAgent {
    fn runner(&self) -> &Arc<Runner> {
        &self.runner
    }

    fn processing_message(&self) -> &str {
        "Searching the web to answer your query..."
    }
}
