use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::agent::interface::SqlAgent;
use crate::agent::output_types::RawAgentOutput;
use crate::error::AgentError;

/// Model and database settings forwarded with every invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeConfig {
    pub model: String,
    pub project_id: Option<String>,
    pub location: String,
    pub temperature: f32,
    pub database_url: String,
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    input: &'a str,
    config: &'a InvokeConfig,
}

/// SQL agent hosted by a separate agent service.
/// The service owns the LLM and the database connection; this client
/// only ships the question over and hands back the raw output.
pub struct RemoteSqlAgent {
    client: Client,
    service_url: String,
    config: InvokeConfig,
}

impl RemoteSqlAgent {
    pub fn new(client: Client, service_url: String, config: InvokeConfig) -> Self {
        info!(
            "Initialized RemoteSqlAgent: model={}, service_url={}",
            config.model, service_url
        );
        Self {
            client,
            service_url: service_url.trim_end_matches('/').to_string(),
            config,
        }
    }
}

#[async_trait]
impl SqlAgent for RemoteSqlAgent {
    async fn invoke(&self, message: &str) -> Result<RawAgentOutput, AgentError> {
        let url = format!("{}/agent/invoke", self.service_url);
        let request = InvokeRequest {
            input: message,
            config: &self.config,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or(body);
            return Err(AgentError::Invocation(format!(
                "agent service returned {}: {}",
                status, reason
            )));
        }

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            AgentError::Invocation(format!("agent service returned invalid JSON: {}", e))
        })?;

        if let Some(reason) = payload.get("error").and_then(|v| v.as_str()) {
            return Err(AgentError::Invocation(reason.to_string()));
        }

        let output = match payload {
            Value::Object(mut map) => map.remove("output").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        let output = RawAgentOutput::from(output);
        debug!("Agent returned output of kind '{}'", output.kind());
        Ok(output)
    }
}

fn error_message(payload: &Value) -> Option<String> {
    ["detail", "error"]
        .iter()
        .find_map(|key| payload.get(key))
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
}
