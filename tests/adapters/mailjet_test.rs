//! Mailjet adapter tests.

use relaio::providers::MailjetTransport;
use relaio::{DispatchError, Email, ProviderId, Transport};
use serde_json::json;
use wiremock::matchers::{body_json, header_exists, method, path};
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
        "Messages": [
            {
                "Status": "success",
                "To": [
                    {"Email": "steve.rogers@example.com", "MessageID": 123456789}
                ]
            }
        ]
    }))
}

#[tokio::test]
async fn successful_delivery_returns_message_id() {
    let server = MockServer::start().await;
    let transport = MailjetTransport::new("mj_key", "mj_secret").base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/v3.1/send"))
        .and(header_exists("Authorization"))
        .and(body_json(json!({
            "Messages": [
                {
                    "From": {"Email": "tony.stark@example.com", "Name": ""},
                    "To": [{"Email": "steve.rogers@example.com", "Name": ""}],
                    "Subject": "Hello, Avengers!",
                    "HTMLPart": "<h1>Hello</h1>"
                }
            ]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    let result = transport.send(&valid_email()).await.unwrap();
    assert_eq!(result.message_id, "123456789");
}

#[tokio::test]
async fn delivery_with_cc_bcc_and_names() {
    let server = MockServer::start().await;
    let transport = MailjetTransport::new("mj_key", "mj_secret").base_url(server.uri());

    let email = Email::new()
        .from(("T Stark", "tony.stark@example.com"))
        .to("steve.rogers@example.com")
        .cc(("Janet Pym", "wasp.avengers@example.com"))
        .bcc("thor.odinson@example.com")
        .subject("Hello, Avengers!")
        .html_body("<h1>Hello</h1>");

    Mock::given(method("POST"))
        .and(path("/v3.1/send"))
        .and(body_json(json!({
            "Messages": [
                {
                    "From": {"Email": "tony.stark@example.com", "Name": "T Stark"},
                    "To": [{"Email": "steve.rogers@example.com", "Name": ""}],
                    "Cc": [{"Email": "wasp.avengers@example.com", "Name": "Janet Pym"}],
                    "Bcc": [{"Email": "thor.odinson@example.com", "Name": ""}],
                    "Subject": "Hello, Avengers!",
                    "HTMLPart": "<h1>Hello</h1>"
                }
            ]
        })))
        .respond_with(success_response())
        .expect(1)
        .mount(&server)
        .await;

    assert!(transport.send(&email).await.is_ok());
}

#[tokio::test]
async fn auth_failure_is_a_provider_error_with_status() {
    let server = MockServer::start().await;
    let transport = MailjetTransport::new("bad_key", "bad_secret").base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/v3.1/send"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ErrorMessage": "Invalid credentials"
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
            assert_eq!(provider, ProviderId::Mailjet);
            assert_eq!(message, "Invalid credentials");
            assert_eq!(status, Some(401));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_error_body_still_fails_cleanly() {
    let server = MockServer::start().await;
    let transport = MailjetTransport::new("mj_key", "mj_secret").base_url(server.uri());

    Mock::given(method("POST"))
        .and(path("/v3.1/send"))
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
    let transport = MailjetTransport::new("mj_key", "mj_secret").base_url(server.uri());

    let email = Email::new()
        .to("steve.rogers@example.com")
        .subject("Hello!")
        .html_body("<p>Hi</p>");

    let err = transport.send(&email).await.unwrap_err();
    assert!(matches!(err, DispatchError::MissingField("from")));
}

#[tokio::test]
async fn send_without_recipients_fails_before_any_request() {
    let server = MockServer::start().await;
    let transport = MailjetTransport::new("mj_key", "mj_secret").base_url(server.uri());

    let email = Email::new()
        .from("tony.stark@example.com")
        .subject("Hello!")
        .html_body("<p>Hi</p>");

    let err = transport.send(&email).await.unwrap_err();
    assert!(matches!(err, DispatchError::MissingField("to")));
}

#[tokio::test]
async fn health_check_passes_on_200() {
    let server = MockServer::start().await;
    let transport = MailjetTransport::new("mj_key", "mj_secret").base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/v3/REST/user"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Count": 1, "Data": []})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(transport.health_check().await);
}

#[tokio::test]
async fn health_check_fails_on_auth_error() {
    let server = MockServer::start().await;
    let transport = MailjetTransport::new("bad_key", "bad_secret").base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/v3/REST/user"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!transport.health_check().await);
}

#[test]
fn identity_is_mailjet() {
    let transport = MailjetTransport::new("mj_key", "mj_secret");
    assert_eq!(transport.id(), ProviderId::Mailjet);
}
