//! Search planner agent — turns a research query into web search terms

use std::sync::Arc;

use super::SampleAgent;
use crate::agent::LlmAgent;
use crate::providers::LlmProvider;
use crate::runner::Runner;
use crate::tools::{GenerateSearchTermsTool, Ledger, PlanRecord};

pub const SEARCH_PLANNER_MODEL: &str = "gemini-2.0-flash-001";
pub const SEARCH_PLANNER_NAME: &str = "search_planner_agent";

const DESCRIPTION: &str = "This agent plans a set of web searches to best answer user queries by generating relevant search terms.";

const INSTRUCTION: &str = r#"
You are a helpful research assistant. Given a query, come up with a set of web searches to perform to best answer the query. Output between 5 and 20 terms to query for.

For example, if the user asks "What are the latest developments in quantum computing?", you might suggest searches such as:
  1. "Recent breakthroughs in quantum computing 2025"
  2. "Quantum supremacy latest achievements"
  3. "Quantum error correction advances"
  4. "Top quantum computing companies research"
  5. "Quantum computing applications in real world"
  6. "Quantum bits vs classical bits comparison"
  7. "Quantum computing hardware improvements"
  8. "Quantum algorithm developments"

Your goal is to help users conduct comprehensive research by suggesting diverse and targeted search terms that cover different aspects of their query.

When responding, organize the search terms in a clear numbered list and briefly explain why each term would be helpful for the user's research.
"#;

pub struct SearchPlannerAgent {
    runner: Arc<Runner>,
    plans: Ledger<PlanRecord>,
}

impl SearchPlannerAgent {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let tool = GenerateSearchTermsTool::new();
        let plans = tool.ledger().clone();
        Self {
            runner: Arc::new(Runner::new(Self::build_agent(tool), provider)),
            plans,
        }
    }

    fn build_agent(tool: GenerateSearchTermsTool) -> LlmAgent {
        LlmAgent::builder(SEARCH_PLANNER_NAME)
            .model(SEARCH_PLANNER_MODEL)
            .description(DESCRIPTION)
            .instruction(INSTRUCTION)
            .tool(Arc::new(tool))
            .build()
    }

    pub fn search_plans(&self) -> &Ledger<PlanRecord> {
        &self.plans
    }
}

impl SampleAgent for SearchPlannerAgent {
    fn runner(&self) -> &Arc<Runner> {
        &self.runner
    }

    fn processing_message(&self) -> &str {
        "Planning web searches to answer your query..."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunEvent;
    use crate::runner::testing::{ScriptedProvider, call, text};

    #[test]
    fn test_configuration() {
        let agent = SearchPlannerAgent::new(Arc::new(ScriptedProvider::new(vec![])));
        let config = agent.agent();
        assert_eq!(config.model, "gemini-2.0-flash-001");
        assert_eq!(config.name, "search_planner_agent");
        assert_eq!(config.description, DESCRIPTION);
        assert!(config.instruction.contains("between 5 and 20 terms"));
        assert!(config.builtin_tools().is_empty());
        let names: Vec<_> = config.tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["generate_search_terms"]);
    }

    #[tokio::test]
    async fn test_stream_records_plan() {
        let provider = ScriptedProvider::new(vec![
            call(
                "generate_search_terms",
                serde_json::json!({"query": "marine ecosystems", "reason": "climate impact"}),
            ),
            text("1. \"Ocean acidification coral reefs\""),
        ]);
        let agent = SearchPlannerAgent::new(Arc::new(provider));

        let mut rx = agent.stream("How does climate change affect marine ecosystems?", "s");
        assert_eq!(
            rx.recv().await.unwrap(),
            RunEvent::Working {
                message: "Planning web searches to answer your query...".to_string()
            }
        );
        match rx.recv().await.unwrap() {
            RunEvent::Completed { text } => assert!(text.contains("Ocean acidification")),
            other => panic!("unexpected event {:?}", other),
        }

        let entries = agent.search_plans().snapshot().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].0.starts_with("plan_id_"));
        assert_eq!(entries[0].1.reason, "climate impact");
        assert_eq!(entries[0].1.status, "generated");
    }
}
