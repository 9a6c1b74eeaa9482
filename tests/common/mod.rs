//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use ai_flow_rust::config::ProviderConfig;
use ai_flow_rust::OpenAiProvider;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

pub const CHAT_PATH: &str = "/chat/completions";

/// Test fixture that manages a mock chat-completions endpoint
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            base_url: self.base_url.clone(),
            model: "test-model".into(),
            api_key: Some("sk-test".into()),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn provider(&self) -> OpenAiProvider {
        OpenAiProvider::new(&self.provider_config()).expect("provider")
    }

    /// Respond once with an assistant message carrying `content`,
    /// requiring the request body to contain `expected`.
    pub async fn mock_completion(&mut self, expected: Value, content: &str) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(expected))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(content).to_string())
            .expect(1)
            .create_async()
            .await
    }

    pub async fn mock_error_response(&mut self, status: usize, error_body: &str) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body)
            .expect(1)
            .create_async()
            .await
    }
}

pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}
