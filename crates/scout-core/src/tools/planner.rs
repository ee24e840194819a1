//! `generate_search_terms` tool — records a search plan in the plan ledger

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{Ledger, ToolHandler, json_schema, required_str};

/// Identifier prefix for recorded plans
pub const PLAN_ID_PREFIX: &str = "plan_id_";

/// Status stamped on every recorded plan
pub const PLAN_STATUS_GENERATED: &str = "generated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub query: String,
    pub reason: String,
    pub status: String,
}

/// Generate a set of search terms for a query
pub struct GenerateSearchTermsTool {
    plans: Ledger<PlanRecord>,
}

impl GenerateSearchTermsTool {
    pub fn new() -> Self {
        Self::with_ledger(Ledger::new(PLAN_ID_PREFIX))
    }

    pub fn with_ledger(plans: Ledger<PlanRecord>) -> Self {
        Self { plans }
    }

    pub fn ledger(&self) -> &Ledger<PlanRecord> {
        &self.plans
    }
}

impl Default for GenerateSearchTermsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for GenerateSearchTermsTool {
    fn name(&self) -> &str {
        "generate_search_terms"
    }

    fn description(&self) -> &str {
        "Generate a set of search terms for a given query. \
         Returns a plan id together with the query and the reasoning behind it."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            serde_json::json!({
                "query": {
                    "type": "string",
                    "description": "The user's research query"
                },
                "reason": {
                    "type": "string",
                    "description": "Your reasoning for why this search is important to the query"
                }
            }),
            vec!["query", "reason"],
        )
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let query = required_str(&input, "query")?;
        let reason = required_str(&input, "reason")?;

        let plan_id = self
            .plans
            .record(PlanRecord {
                query: query.to_string(),
                reason: reason.to_string(),
                status: PLAN_STATUS_GENERATED.to_string(),
            })
            .await;
        debug!("Recorded plan {} for '{}'", plan_id, query);

        Ok(serde_json::json!({
            "plan_id": plan_id,
            "query": query,
            "reason": reason,
        })
        .to_string())
    }
}
