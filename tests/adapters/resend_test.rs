//! Resend adapter tests.

use relaio::providers::ResendTransport;
use relaio::{DispatchError, Email, ProviderId, Transport};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn valid_email() -> Email {
    Email::new()
        .from("tony.stark@example.com")
        .to("steve.rogers@example.com")
        .subject("Hello, Avengers!")
        .html_body("<h1>Hello</h1>")
}

fn success_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "049b9217-30b5-4f61-a8e3-4d2d12f9f5a7"
    }))
}

#[tokio::test]
async fn successful_delivery_returns_message_id() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_123456789").base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("Authorization", "Bearer re_123456789"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "from": "tony.stark@example.com",
            "to": ["steve.rogers@example.com"],
            "subject": "Hello, Avengers!",
            "html": "<h1>Hello</h1>"
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let result = transport.send(&valid_email()).await.unwrap();
    assert_eq!(result.message_id, "049b9217-30b5-4f61-a8e3-4d2d12f9f5a7");
}

#[tokio::test]
async fn delivery_with_all_fields() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_123456789").base_url(server.uri());

    let email = Email::new()
        .from(("T Stark", "tony.stark@example.com"))
        .to("steve.rogers@example.com")
        .to(("Bruce Banner", "bruce.banner@example.com"))
        .cc("hulk.smash@example.com")
        .bcc("thor.odinson@example.com")
        .subject("Hello, Avengers!")
        .html_body("<h1>Hello</h1>");

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_json(json!({
            "from": "\"T Stark\" <tony.stark@example.com>",
            "to": [
                "steve.rogers@example.com",
                "\"Bruce Banner\" <bruce.banner@example.com>"
            ],
            "cc": ["hulk.smash@example.com"],
            "bcc": ["thor.odinson@example.com"],
            "subject": "Hello, Avengers!",
            "html": "<h1>Hello</h1>"
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    assert!(transport.send(&email).await.is_ok());
}

#[tokio::test]
async fn rejection_is_a_provider_error_with_status() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_123456789").base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "statusCode": 422,
            "message": "Invalid `to` field",
            "name": "validation_error"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = transport.send(&valid_email()).await.unwrap_err();
    match err {
        DispatchError::ProviderError {
            provider,
            message,
            status,
        } => {
            assert_eq!(provider, ProviderId::Resend);
            assert_eq!(message, "Invalid `to` field");
            assert_eq!(status, Some(422));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_surfaced() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_123456789").base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "statusCode": 429,
            "message": "Too many requests",
            "name": "rate_limit_exceeded"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = transport.send(&valid_email()).await.unwrap_err();
    assert!(err.to_string().contains("Too many requests"));
}

#[tokio::test]
async fn unparseable_error_body_still_fails_cleanly() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_123456789").base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let err = transport.send(&valid_email()).await.unwrap_err();
    assert!(err.to_string().contains("Unknown error"));
}

#[tokio::test]
async fn send_without_from_fails_before_any_request() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_123456789").base_url(server.uri());

    let email = Email::new()
        .to("steve.rogers@example.com")
        .subject("Hello!")
        .html_body("<p>Hi</p>");

    let err = transport.send(&email).await.unwrap_err();
    assert!(matches!(err, DispatchError::MissingField("from")));
}

#[tokio::test]
async fn health_check_passes_on_200() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_123456789").base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/emails"))
        .and(header("Authorization", "Bearer re_123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(transport.health_check().await);
}

#[tokio::test]
async fn health_check_fails_on_auth_error() {
    let server = MockServer::start().await;
    let transport = ResendTransport::new("re_bad").base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!transport.health_check().await);
}

#[test]
fn identity_is_resend() {
    let transport = ResendTransport::new("re_123456789");
    assert_eq!(transport.id(), ProviderId::Resend);
}
