use async_trait::async_trait;

use crate::agent::output_types::RawAgentOutput;
use crate::error::AgentError;

/// Interface for an agent that answers natural-language questions
/// by querying a database
#[async_trait]
pub trait SqlAgent: Send + Sync {
    /// Ask the agent a question.
    ///
    /// # Arguments
    /// * `message` - The user's question
    ///
    /// # Returns
    /// The agent's raw answer, whatever shape it came in
    async fn invoke(&self, message: &str) -> Result<RawAgentOutput, AgentError>;
}

/// Builds a fresh agent for every chat request
pub trait AgentProvider: Send + Sync {
    fn create_agent(&self) -> Result<Box<dyn SqlAgent>, AgentError>;
}
