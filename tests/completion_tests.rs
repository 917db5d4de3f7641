//! Integration tests for the chat-completion connector against a mocked API.

use pubharvest::completion::{Message, OpenAiConnector, Role, API_KEY_ENV};
use pubharvest::HarvestError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body() -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "gpt-3.5-turbo-0125",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello there."},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
}

fn create_test_connector(server: &MockServer) -> OpenAiConnector {
    OpenAiConnector::from_api_key(Some("test-key".to_string()))
        .expect("connector")
        .with_base_url(&format!("{}/v1", server.uri()))
}

#[tokio::test]
async fn test_single_request_with_fixed_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": [
                {"role": "system", "content": "You summarize abstracts."},
                {"role": "user", "content": "Summarize: PMID- 1"}
            ],
            "temperature": 0.5,
            "presence_penalty": 1.1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .expect(1)
        .mount(&server)
        .await;

    let connector = create_test_connector(&server);
    let messages = vec![
        Message::system("You summarize abstracts."),
        Message::user("Summarize: PMID- 1"),
    ];

    let response = connector.get_completions(&messages).await.expect("completion");
    assert_eq!(response, completion_body());
}

#[tokio::test]
async fn test_api_error_is_typed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error": {"message": "Incorrect API key"}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let connector = create_test_connector(&server);
    match connector.get_completions(&[Message::user("Hi")]).await {
        Err(HarvestError::Api { code, message }) => {
            assert_eq!(code, 401);
            assert!(message.contains("Incorrect API key"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_response_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let connector = create_test_connector(&server);
    let result = connector.get_completions(&[Message::user("Hi")]).await;
    assert!(matches!(result, Err(HarvestError::Parse(_))));
}

#[tokio::test]
async fn test_missing_credential_makes_no_request() {
    let server = MockServer::start().await;

    let result = OpenAiConnector::from_api_key(None);
    assert!(matches!(result, Err(HarvestError::MissingCredential(_))));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_extra_message_fields_are_forwarded() {
    let server = MockServer::start().await;

    let payload = json!([
        {"role": "developer", "content": "Answer in one word."},
        {"role": "user", "content": "hi", "name": "bob"}
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": payload.clone(),
            "temperature": 0.5,
            "presence_penalty": 1.1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body()))
        .expect(2)
        .mount(&server)
        .await;

    let connector = create_test_connector(&server);

    // Raw JSON objects, as read from the command line
    let raw: Vec<serde_json::Value> = serde_json::from_value(payload).expect("array");
    let response = connector.get_completions(&raw).await.expect("completion");
    assert_eq!(response, completion_body());

    // Typed messages carrying the same extra field
    let typed = vec![
        Message::new(Role::Developer, "Answer in one word."),
        Message::user("hi").with_field("name", "bob"),
    ];
    connector.get_completions(&typed).await.expect("completion");
}

#[test]
fn test_from_env_without_key_fails() {
    std::env::remove_var(API_KEY_ENV);

    match OpenAiConnector::from_env() {
        Err(HarvestError::MissingCredential(msg)) => assert!(msg.contains(API_KEY_ENV)),
        other => panic!("unexpected result: {:?}", other),
    }
}
