use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agent::{finalize, AgentProvider, RawAgentOutput};
use crate::error::{AgentError, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/chat", post(chat))
}

/// Full application: routes, CORS, request tracing and state
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({"message": "SQL Chatbot API is running"}))
}

async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    info!(
        "Chat request received ({} chars) for model {}",
        request.message.len(),
        state.config.agent.model
    );

    let output = match ask_agent(state.agents.as_ref(), &request.message).await {
        Ok(output) => output,
        Err(e) => {
            error!("Chat request failed: {}", e);
            return Err(e.into());
        }
    };

    Ok(Json(ChatResponse {
        response: finalize(&output),
    }))
}

async fn ask_agent(
    agents: &dyn AgentProvider,
    message: &str,
) -> Result<RawAgentOutput, AgentError> {
    let agent = agents.create_agent()?;
    agent.invoke(message).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{SqlAgent, FALLBACK_RESPONSE};
    use crate::config::Config;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BODY_LIMIT: usize = 64 * 1024;

    enum Behavior {
        Answer(Value),
        FailInvoke(&'static str),
        FailConstruct(&'static str),
    }

    struct ScriptedAgent(Value);

    #[async_trait]
    impl SqlAgent for ScriptedAgent {
        async fn invoke(&self, _message: &str) -> Result<RawAgentOutput, AgentError> {
            Ok(RawAgentOutput::from(self.0.clone()))
        }
    }

    struct FailingAgent(&'static str);

    #[async_trait]
    impl SqlAgent for FailingAgent {
        async fn invoke(&self, _message: &str) -> Result<RawAgentOutput, AgentError> {
            Err(AgentError::Invocation(self.0.to_string()))
        }
    }

    struct ScriptedProvider(Behavior);

    impl AgentProvider for ScriptedProvider {
        fn create_agent(&self) -> Result<Box<dyn SqlAgent>, AgentError> {
            match &self.0 {
                Behavior::Answer(value) => Ok(Box::new(ScriptedAgent(value.clone()))),
                Behavior::FailInvoke(msg) => Ok(Box::new(FailingAgent(*msg))),
                Behavior::FailConstruct(msg) => Err(AgentError::Construction(msg.to_string())),
            }
        }
    }

    fn app_with(behavior: Behavior) -> Router {
        build_app(AppState::with_provider(
            Config::default(),
            Arc::new(ScriptedProvider(behavior)),
        ))
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("parse json")
    }

    #[tokio::test]
    async fn chat_returns_normalized_answer() {
        let app = app_with(Behavior::Answer(json!([
            {"type": "text", "text": "Top customer is Acme.", "thought_signature": "c2ln"}
        ])));

        let response = app
            .oneshot(chat_request(json!({"message": "who buys most?"})))
            .await
            .expect("router call");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"response": "Top customer is Acme."})
        );
    }

    #[tokio::test]
    async fn chat_substitutes_fallback_for_metadata_only_output() {
        let app = app_with(Behavior::Answer(json!({"type": "x"})));

        let response = app
            .oneshot(chat_request(json!({"message": "anything"})))
            .await
            .expect("router call");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["response"], FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn invocation_failure_is_a_server_error() {
        let app = app_with(Behavior::FailInvoke("model unavailable"));

        let response = app
            .oneshot(chat_request(json!({"message": "hi"})))
            .await
            .expect("router call");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"detail": "model unavailable"}));
    }

    #[tokio::test]
    async fn construction_failure_is_a_server_error() {
        let app = app_with(Behavior::FailConstruct(
            "DATABASE_URL environment variable not set",
        ));

        let response = app
            .oneshot(chat_request(json!({"message": "hi"})))
            .await
            .expect("router call");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["detail"],
            "DATABASE_URL environment variable not set"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let app = app_with(Behavior::Answer(json!("unused")));

        let response = app
            .oneshot(chat_request(json!({"text": "no message field"})))
            .await
            .expect("router call");
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let app = app_with(Behavior::Answer(Value::Null));

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .expect("router call");
        assert_eq!(json_body(response).await, json!({"status": "ok"}));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .expect("router call");
        assert_eq!(
            json_body(response).await["message"],
            "SQL Chatbot API is running"
        );
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = app_with(Behavior::Answer(json!("ok")));

        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::ORIGIN, "https://chat.example.com")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"message": "hi"}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.expect("router call");
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    struct CountingProvider {
        created: AtomicUsize,
    }

    impl AgentProvider for CountingProvider {
        fn create_agent(&self) -> Result<Box<dyn SqlAgent>, AgentError> {
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Box::new(ScriptedAgent(json!(format!("agent {}", n)))))
        }
    }

    #[tokio::test]
    async fn each_chat_request_builds_its_own_agent() {
        let provider = Arc::new(CountingProvider {
            created: AtomicUsize::new(0),
        });
        let app = build_app(AppState::with_provider(Config::default(), provider.clone()));

        let first = app
            .clone()
            .oneshot(chat_request(json!({"message": "one"})))
            .await
            .expect("router call");
        assert_eq!(json_body(first).await["response"], "agent 1");

        let second = app
            .oneshot(chat_request(json!({"message": "two"})))
            .await
            .expect("router call");
        assert_eq!(json_body(second).await["response"], "agent 2");

        assert_eq!(provider.created.load(Ordering::SeqCst), 2);
    }
}
