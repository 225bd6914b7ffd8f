use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings for constructing the SQL agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_agent_type() -> String {
    "remote_sql_agent".to_string()
}

fn default_service_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_location() -> String {
    "global".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Host and port as accepted by `TcpListener::bind`; hostnames and IPv6 literals resolve too
    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_type: default_agent_type(),
            service_url: default_service_url(),
            database_url: None,
            model: default_model(),
            project_id: None,
            location: default_location(),
            temperature: 0.0,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }
        let content = substitute_env_vars(&fs::read_to_string(path)?)?;

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Apply environment overrides on top of file or default values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(url) = lookup("AGENT_SERVICE_URL") {
            self.agent.service_url = url;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.agent.database_url = Some(url);
        }
        if let Some(project) = lookup("GOOGLE_CLOUD_PROJECT") {
            self.agent.project_id = Some(project);
        }
        if let Some(location) = lookup("GOOGLE_CLOUD_LOCATION") {
            self.agent.location = location;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.agent.model = model;
        }
    }
}

/// Replace `${VAR_NAME}` with the variable's value; unset variables stay as written
pub fn substitute_env_vars(content: &str) -> Result<String> {
    substitute_with(content, |name| std::env::var(name).ok())
}

fn substitute_with(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    static ENV_VAR_PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let pattern = ENV_VAR_PATTERN
        .get_or_init(|| Regex::new(r"\$\{(\w+)\}"))
        .as_ref()
        .map_err(Clone::clone)?;
    Ok(pattern
        .replace_all(content, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned())
}

/// SQL drivers expect `postgresql://`; hosted databases often hand out `postgres://`
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{}", rest),
        None => url.to_string(),
    }
}
