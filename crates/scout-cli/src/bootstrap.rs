//! Agent cards, skills and server assembly for each sample agent

use clap::ValueEnum;
use std::sync::Arc;
use tracing::info;

use scout_a2a::{A2aServer, AgentCapabilities, AgentCard, AgentSkill, AgentTaskManager};
use scout_core::providers::{GeminiProvider, LlmProvider};
use scout_core::samples::SUPPORTED_CONTENT_TYPES;
use scout_core::samples::planner::SEARCH_PLANNER_MODEL;
use scout_core::samples::search::SEARCH_AGENT_MODEL;
use scout_core::{Credentials, SearchAgent, SearchPlannerAgent};

pub const CARD_VERSION: &str = "1.0.0";

/// Which sample agent to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    /// Plans a set of web searches for a research query
    Planner,
    /// Searches the web for a term and summarises the results
    Search,
}

impl AgentKind {
    pub fn model(&self) -> &'static str {
        match self {
            Self::Planner => SEARCH_PLANNER_MODEL,
            Self::Search => SEARCH_AGENT_MODEL,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn skill(kind: AgentKind) -> AgentSkill {
    match kind {
        AgentKind::Planner => AgentSkill {
            id: "plan_web_searches".to_string(),
            name: "Web Search Planner Tool".to_string(),
            description: Some(
                "Given a query, comes up with a set of web searches to perform to best answer the query."
                    .to_string(),
            ),
            tags: strings(&["search", "research", "web"]),
            examples: strings(&[
                "What are the latest developments in quantum computing?",
                "How does climate change affect marine ecosystems?",
            ]),
            input_modes: None,
            output_modes: None,
        },
        AgentKind::Search => AgentSkill {
            id: "search_web".to_string(),
            name: "Web Search Tool".to_string(),
            description: Some(
                "Given a search term, searches the web and produces a concise summary of the results."
                    .to_string(),
            ),
            tags: strings(&["search", "web", "summary"]),
            examples: strings(&[
                "Recent breakthroughs in quantum computing 2025",
                "Ocean acidification effects on coral reefs",
            ]),
            input_modes: None,
            output_modes: None,
        },
    }
}

pub fn agent_card(kind: AgentKind, host: &str, port: u16) -> AgentCard {
    let (name, description) = match kind {
        AgentKind::Planner => (
            "Search Planner Agent",
            "A helpful research assistant that plans a set of web searches to answer your query. Given a query, it provides 5 to 20 search terms to help you find the best answer.",
        ),
        AgentKind::Search => (
            "Search Agent",
            "A research assistant that searches the web for a term and produces a concise summary of the results.",
        ),
    };

    AgentCard {
        name: name.to_string(),
        description: Some(description.to_string()),
        url: format!("http://{}:{}/", host, port),
        provider: None,
        version: CARD_VERSION.to_string(),
        documentation_url: None,
        capabilities: AgentCapabilities {
            streaming: true,
            ..Default::default()
        },
        authentication: None,
        default_input_modes: strings(SUPPORTED_CONTENT_TYPES),
        default_output_modes: strings(SUPPORTED_CONTENT_TYPES),
        skills: vec![skill(kind)],
    }
}

/// Assemble the server for one agent over the given model provider
pub fn build_server(
    kind: AgentKind,
    host: &str,
    port: u16,
    provider: Arc<dyn LlmProvider>,
) -> A2aServer {
    let card = agent_card(kind, host, port);
    info!(
        "Serving '{}' v{} at {} ({} skill)",
        card.name,
        card.version,
        card.url,
        card.skills.len()
    );

    match kind {
        AgentKind::Planner => A2aServer::new(
            card,
            Arc::new(AgentTaskManager::new(SearchPlannerAgent::new(provider))),
            host,
            port,
        ),
        AgentKind::Search => A2aServer::new(
            card,
            Arc::new(AgentTaskManager::new(SearchAgent::new(provider))),
            host,
            port,
        ),
    }
}

pub fn provider_for(kind: AgentKind, credentials: &Credentials) -> Arc<dyn LlmProvider> {
    Arc::new(GeminiProvider::from_credentials(kind.model(), credentials))
}
