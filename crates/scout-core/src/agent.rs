//! LLM agent configuration — model, identity, instruction and tools

use std::sync::Arc;

use crate::providers::ToolDefinition;
use crate::tools::{ToolHandler, ToolRegistry, definition_of};

pub use crate::providers::BuiltInTool;

/// A tool an agent may use
#[derive(Clone)]
pub enum AgentTool {
    /// Executed locally through the tool registry
    Function(Arc<dyn ToolHandler>),
    /// Executed by the model backend
    BuiltIn(BuiltInTool),
}

impl AgentTool {
    pub fn name(&self) -> &str {
        match self {
            Self::Function(handler) => handler.name(),
            Self::BuiltIn(builtin) => builtin.name(),
        }
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function(handler) => f.debug_tuple("Function").field(&handler.name()).finish(),
            Self::BuiltIn(builtin) => f.debug_tuple("BuiltIn").field(builtin).finish(),
        }
    }
}

/// Static description of an LLM agent
#[derive(Debug, Clone)]
pub struct LlmAgent {
    pub model: String,
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub tools: Vec<AgentTool>,
}

impl LlmAgent {
    pub fn builder(name: impl Into<String>) -> LlmAgentBuilder {
        LlmAgentBuilder {
            agent: LlmAgent {
                model: String::new(),
                name: name.into(),
                description: String::new(),
                instruction: String::new(),
                tools: Vec::new(),
            },
        }
    }

    pub fn function_tools(&self) -> impl Iterator<Item = &Arc<dyn ToolHandler>> {
        self.tools.iter().filter_map(|t| match t {
            AgentTool::Function(handler) => Some(handler),
            AgentTool::BuiltIn(_) => None,
        })
    }

    pub fn builtin_tools(&self) -> Vec<BuiltInTool> {
        self.tools
            .iter()
            .filter_map(|t| match t {
                AgentTool::BuiltIn(builtin) => Some(*builtin),
                AgentTool::Function(_) => None,
            })
            .collect()
    }

    /// Declarations for the locally executed tools, in registration order
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.function_tools()
            .map(|handler| definition_of(handler.as_ref()))
            .collect()
    }

    /// Registry over the agent's function tools
    pub fn registry(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for handler in self.function_tools() {
            registry.register(Arc::clone(handler));
        }
        registry
    }
}

pub struct LlmAgentBuilder {
    agent: LlmAgent,
}

impl LlmAgentBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.agent.model = model.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.agent.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.agent.instruction = instruction.into();
        self
    }

    pub fn tool(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.agent.tools.push(AgentTool::Function(handler));
        self
    }

    pub fn builtin(mut self, builtin: BuiltInTool) -> Self {
        self.agent.tools.push(AgentTool::BuiltIn(builtin));
        self
    }

    pub fn build(self) -> LlmAgent {
        self.agent
    }
}
