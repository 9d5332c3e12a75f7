//! OpenAI narrative generator against a mock chat-completions API.

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockchat_common::{Error, LlmConfig};
use stockchat_server::narrative::{
    NarrativeError, NarrativeGenerator, NarrativeRequest, OpenAiNarrativeGenerator,
};

fn generator(server: &MockServer) -> OpenAiNarrativeGenerator {
    let config = LlmConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        ..LlmConfig::default()
    };
    OpenAiNarrativeGenerator::new("sk-test-key", &config).unwrap()
}

fn completion(content: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_generate_sends_messages_and_reads_first_choice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 300,
            "temperature": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("Neutral overall."))))
        .expect(1)
        .mount(&server)
        .await;

    let request = NarrativeRequest::new("gpt-4o", "Headlines for TCS")
        .with_system("You are a financial analyst.")
        .with_max_tokens(300)
        .with_temperature(0.3);

    let text = generator(&server).generate(request).await.unwrap();
    assert_eq!(text.as_deref(), Some("Neutral overall."));

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(
        body["messages"],
        json!([
            { "role": "system", "content": "You are a financial analyst." },
            { "role": "user", "content": "Headlines for TCS" }
        ])
    );
}

#[tokio::test]
async fn test_generate_without_system_sends_only_the_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("ok"))))
        .mount(&server)
        .await;

    generator(&server)
        .generate(NarrativeRequest::new("gpt-4o", "Evaluate INFOSYS"))
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
}

#[tokio::test]
async fn test_empty_or_missing_content_is_none() {
    for response in [
        json!({ "choices": [] }),
        json!({}),
        completion(Value::Null),
        completion(json!("")),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&server)
            .await;

        let text = generator(&server)
            .generate(NarrativeRequest::new("gpt-4o", "prompt"))
            .await
            .unwrap();
        assert!(text.is_none());
    }
}

#[tokio::test]
async fn test_error_status_keeps_provider_body() {
    let server = MockServer::start().await;
    let provider_body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota"}}"#;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string(provider_body))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(NarrativeRequest::new("gpt-4o", "prompt"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(429));
    assert!(matches!(&err, NarrativeError::Api { body, .. } if body == provider_body));

    let err: Error = err.into();
    assert_eq!(err.to_string(), "OpenAI API error");
    assert!(err.details().unwrap().contains("exceeded your current quota"));
}

#[tokio::test]
async fn test_undecodable_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = generator(&server)
        .generate(NarrativeRequest::new("gpt-4o", "prompt"))
        .await
        .unwrap_err();

    assert!(matches!(err, NarrativeError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_provider() {
    let config = LlmConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        ..LlmConfig::default()
    };
    let generator = OpenAiNarrativeGenerator::new("sk-test-key", &config).unwrap();

    let err = generator
        .generate(NarrativeRequest::new("gpt-4o", "prompt"))
        .await
        .unwrap_err();
    assert!(matches!(err, NarrativeError::Transport(_)));

    let err: Error = err.into();
    assert_eq!(err.to_string(), "Failed to call OpenAI API");
}
