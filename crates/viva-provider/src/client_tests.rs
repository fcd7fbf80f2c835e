use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key").with_base_url(server.uri())
}

#[tokio::test]
async fn test_generate_content_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"4/5"}]},"finishReason":"STOP"}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let response = client(&server)
        .generate_content(
            "gemini-2.0-flash",
            &GenerateContentRequest::from_prompt("Score this answer"),
        )
        .await
        .unwrap();

    assert_eq!(response.first_text().as_deref(), Some("4/5"));
}

#[tokio::test]
async fn test_rate_limit_maps_to_resume_at() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "600"))
        .mount(&server)
        .await;

    let before = Utc::now();
    let error = client(&server)
        .generate_content("gemini-2.0-flash", &GenerateContentRequest::from_prompt("x"))
        .await
        .unwrap_err();

    match error {
        TaskError::RateLimited { resume_at } => {
            let delta = resume_at - before;
            assert!(delta >= Duration::seconds(595) && delta <= Duration::seconds(605));
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_without_header_uses_default_holdoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let before = Utc::now();
    let error = client(&server)
        .generate_content("gemini-2.0-flash", &GenerateContentRequest::from_prompt("x"))
        .await
        .unwrap_err();

    match error {
        TaskError::RateLimited { resume_at } => {
            assert!(resume_at > before);
            assert!(resume_at - before <= Duration::seconds(65));
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_raw(
            r#"{"error":{"code":503,"message":"overloaded","status":"UNAVAILABLE"}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let error = client(&server)
        .generate_content("gemini-2.0-flash", &GenerateContentRequest::from_prompt("x"))
        .await
        .unwrap_err();

    match error {
        TaskError::Transient(message) => assert!(message.contains("overloaded")),
        other => panic!("expected transient, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_raw(
            r#"{"error":{"code":400,"message":"invalid argument","status":"INVALID_ARGUMENT"}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let error = client(&server)
        .generate_content("gemini-2.0-flash", &GenerateContentRequest::from_prompt("x"))
        .await
        .unwrap_err();

    assert!(matches!(error, TaskError::Terminal(_)));
}
