//! scout-core — agent configuration, tools, and the Gemini-backed runner
//!
//! Holds the two sample agents (web search and search planning), the ledger
//! tools they register, and the runtime that drives a model through tool calls.

pub mod agent;
pub mod credentials;
pub mod providers;
pub mod runner;
pub mod samples;
pub mod tools;

pub use agent::{AgentTool, BuiltInTool, LlmAgent};
pub use credentials::{Credentials, CredentialsError};
pub use runner::{RunEvent, Runner};
pub use samples::{SampleAgent, SearchAgent, SearchPlannerAgent};
