use reqwest::Client;
use std::time::Duration;
use tracing::info;

use crate::agent::interface::{AgentProvider, SqlAgent};
use crate::agent::remote_sql_agent::{InvokeConfig, RemoteSqlAgent};
use crate::config::{normalize_database_url, AgentConfig};
use crate::error::AgentError;

/// Factory for creating agent instances
pub struct AgentFactory {
    config: AgentConfig,
    client: Client,
}

impl AgentFactory {
    /// # Arguments
    /// * `config` - Agent settings
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Create an agent based on the configuration.
    ///
    /// # Arguments
    /// * `config` - Agent settings; `agent_type` selects the implementation
    /// * `client` - Shared HTTP client
    pub fn build_agent(
        config: &AgentConfig,
        client: Client,
    ) -> Result<Box<dyn SqlAgent>, AgentError> {
        info!("Initializing agent: {}", config.agent_type);

        match config.agent_type.as_str() {
            "remote_sql_agent" => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| {
                        AgentError::Construction(
                            "DATABASE_URL environment variable not set".to_string(),
                        )
                    })?;

                Ok(Box::new(RemoteSqlAgent::new(
                    client,
                    config.service_url.clone(),
                    InvokeConfig {
                        model: config.model.clone(),
                        project_id: config.project_id.clone(),
                        location: config.location.clone(),
                        temperature: config.temperature,
                        database_url: normalize_database_url(database_url),
                    },
                )))
            }
            other => Err(AgentError::Construction(format!(
                "Unsupported agent type: {}",
                other
            ))),
        }
    }
}

impl AgentProvider for AgentFactory {
    fn create_agent(&self) -> Result<Box<dyn SqlAgent>, AgentError> {
        AgentFactory::build_agent(&self.config, self.client.clone())
    }
}
