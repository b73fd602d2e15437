mod common;

use common::png_bytes;
use damage_lab::config::toml_config::ServiceConfig;
use damage_lab::core::codec::encode_base64;
use damage_lab::domain::ports::GenerationService;
use damage_lab::{DamageLabError, OpenAiClient};
use httpmock::prelude::*;

fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new("sk-test").with_api_base(server.url("/v1"))
}

#[tokio::test]
async fn test_edit_decodes_returned_image() {
    let server = MockServer::start();
    let edited = png_bytes(77);

    let edit_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/images/edits")
            .header("authorization", "Bearer sk-test");
        then.status(200).json_body(serde_json::json!({
            "created": 1_700_000_000,
            "data": [{"b64_json": encode_base64(&edited)}]
        }));
    });

    let result = client(&server)
        .edit(&png_bytes(10), "Restore this building")
        .await
        .unwrap();

    edit_mock.assert();
    assert_eq!(result, edited);
}

#[tokio::test]
async fn test_edit_surfaces_service_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/images/edits");
        then.status(401)
            .json_body(serde_json::json!({"error": {"message": "Incorrect API key"}}));
    });

    let err = client(&server)
        .edit(&png_bytes(10), "Restore")
        .await
        .unwrap_err();

    match err {
        DamageLabError::ServiceError { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_edit_without_image_data_is_missing_output() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/images/edits");
        then.status(200)
            .json_body(serde_json::json!({"data": [{"url": "https://example.com/x.png"}]}));
    });

    let err = client(&server)
        .edit(&png_bytes(10), "Restore")
        .await
        .unwrap_err();

    assert!(matches!(err, DamageLabError::MissingOutputError { .. }));
}

#[tokio::test]
async fn test_compare_returns_reply_text() {
    let server = MockServer::start();
    let reply = r#"{"damage_description":"collapsed roof","damage_level":5}"#;

    let chat_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .body_contains("\"model\":\"gpt-4.1\"")
            .body_contains("data:image/png;base64,");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": reply}}]
        }));
    });

    let content = client(&server)
        .compare(&png_bytes(10), &png_bytes(200), "Compare these")
        .await
        .unwrap();

    chat_mock.assert();
    assert_eq!(content, reply);
}

#[tokio::test]
async fn test_missing_api_key_fails_before_request() {
    let server = MockServer::start();
    let edit_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/images/edits");
        then.status(200);
    });

    let config = ServiceConfig {
        api_base: server.url("/v1"),
        ..ServiceConfig::default()
    };
    let err = OpenAiClient::from_config(&config)
        .unwrap()
        .edit(&png_bytes(10), "Restore")
        .await
        .unwrap_err();

    assert!(matches!(err, DamageLabError::MissingConfigError { .. }));
    edit_mock.assert_hits(0);
}
