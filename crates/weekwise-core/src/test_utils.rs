//! Test utilities for weekwise-core
//!
//! This module provides testing infrastructure including a mock Ollama server
//! that can be used for development and integration tests.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::ai::{AIBackend, MockBackend, EXPENSE_PROMPT_MARKER};

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
///
/// Answers expense extraction prompts with the mock backend's keyword guess,
/// wrapped in a bit of chatter like a real model would add.
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let response = match extract_entry_from_prompt(&request.prompt) {
        Some(entry) => {
            let parsed = MockBackend::new()
                .extract_expense(&entry)
                .await
                .unwrap_or_default();
            format!(
                "Here is the expense:\n{}",
                serde_json::to_string(&parsed).unwrap()
            )
        }
        None => "I can only help with expenses.".to_string(),
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// Pull the quoted entry out of an expense prompt
fn extract_entry_from_prompt(prompt: &str) -> Option<String> {
    let marker = format!("{} \"", EXPENSE_PROMPT_MARKER);
    let start = prompt.find(&marker)? + marker.len();
    let rest = &prompt[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::expense_prompt;

    #[test]
    fn test_extract_entry_from_prompt() {
        let prompt = expense_prompt("movie tickets 22");
        assert_eq!(
            extract_entry_from_prompt(&prompt).as_deref(),
            Some("movie tickets 22")
        );
        assert_eq!(extract_entry_from_prompt("hello"), None);
    }

    #[tokio::test]
    async fn test_mock_server_starts_and_stops() {
        let mut server = MockOllamaServer::start().await;
        assert!(server.url().starts_with("http://127.0.0.1:"));
        server.stop();
    }
}
