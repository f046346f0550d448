//! Full-stack retrieval against a mock model API.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use e2e_tests::{seed_memos, TestHarness};
use memos_search::{ApiGenerator, ApiGeneratorConfig};
use memos_service::RetrieveError;

fn anthropic_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "content": [{ "type": "text", "text": text }]
    }))
}

#[tokio::test]
async fn test_retrieve_through_anthropic_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .respond_with(anthropic_reply("Note 1 matches."))
        .expect(1)
        .mount(&server)
        .await;

    let harness = TestHarness::new();
    seed_memos(&harness.store, &[("vpn config", "remote 10.0.0.1 1194")]);

    let config = ApiGeneratorConfig::anthropic("sk-test", "claude-3-7-sonnet-20250219")
        .with_base_url(server.uri());
    let retriever = harness.retriever(Arc::new(ApiGenerator::new(config).unwrap()));

    // The digits inside the memo content must not leak into extraction
    let answer = retriever
        .retrieve("vpn", &CancellationToken::new())
        .await
        .unwrap();
    assert!(answer.contains("remote 10.0.0.1 1194"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["max_tokens"], 1000);
    assert!(body["system"].as_str().unwrap().contains("vpn config"));
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "vpn");
}

#[tokio::test]
async fn test_rate_limited_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let harness = TestHarness::new();
    seed_memos(&harness.store, &[("a", "alpha")]);

    let config = ApiGeneratorConfig::openai("sk-test", "gpt-4o-mini").with_base_url(server.uri());
    let retriever = harness.retriever(Arc::new(ApiGenerator::new(config).unwrap()));

    let err = retriever
        .retrieve("alpha", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RetrieveError::Search(_)));
    assert!(err.user_message().contains("Rate limit exceeded"));
}
