use std::sync::Arc;

use crate::agent::{AgentFactory, AgentProvider};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub agents: Arc<dyn AgentProvider>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let factory = AgentFactory::new(config.agent.clone())?;
        Ok(Self::with_provider(config, Arc::new(factory)))
    }

    pub fn with_provider(config: Config, agents: Arc<dyn AgentProvider>) -> Self {
        Self {
            config: Arc::new(config),
            agents,
        }
    }
}
