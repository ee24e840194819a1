//! `perform_search` tool — records a web search request in the search ledger

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{Ledger, ToolHandler, json_schema, required_str};

/// Identifier prefix for recorded searches
pub const SEARCH_ID_PREFIX: &str = "search_id_";

/// Status stamped on every recorded search
pub const SEARCH_STATUS_SUBMITTED: &str = "submitted";

/// A search request as kept in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    pub status: String,
}

/// Record a web search for a query
pub struct PerformSearchTool {
    results: Ledger<SearchRecord>,
}

impl PerformSearchTool {
    pub fn new() -> Self {
        Self::with_ledger(Ledger::new(SEARCH_ID_PREFIX))
    }

    pub fn with_ledger(results: Ledger<SearchRecord>) -> Self {
        Self { results }
    }

    pub fn ledger(&self) -> &Ledger<SearchRecord> {
        &self.results
    }
}

impl Default for PerformSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for PerformSearchTool {
    fn name(&self) -> &str {
        "perform_search"
    }

    fn description(&self) -> &str {
        "Perform a web search for a query. Returns the search id and the query that was submitted."
    }

    fn input_schema(&self) -> Value {
        json_schema(
            serde_json::json!({
                "query": {
                    "type": "string",
                    "description": "The search term to look up"
                }
            }),
            vec!["query"],
        )
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let query = required_str(&input, "query")?;

        let search_id = self
            .results
            .record(SearchRecord {
                query: query.to_string(),
                status: SEARCH_STATUS_SUBMITTED.to_string(),
            })
            .await;
        debug!("Recorded search {} for '{}'", search_id, query);

        Ok(serde_json::json!({
            "search_id": search_id,
            "query": query,
        })
        .to_string())
    }
}
