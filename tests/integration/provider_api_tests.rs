/*!
 * Integration tests for the HTTP backends against a local mock server
 */

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use subtranslate::errors::ProviderError;
use subtranslate::providers::{Backend, LlmBackend};
use subtranslate::translation::{RunLog, TranslationService};
use crate::common;
use crate::common::mock_providers::{gemini_response_body, openai_response_body};

fn openai_backend(server: &MockServer) -> Backend {
    let base_url = format!("{}/v1", server.uri());
    Backend::from_config(
        &common::test_config("gpt-4o-mini"),
        common::lookup_from(&[("OPENAI_API_KEY", "sk-test"), ("OPENAPI_BASE_URL", base_url.as_str())]),
    ).unwrap()
}

fn gemini_backend(server: &MockServer) -> Backend {
    let base_url = server.uri();
    Backend::from_config(
        &common::test_config("gemini-2.0-flash"),
        common::lookup_from(&[("GOOGLE_API_KEY", "g-test"), ("GEMINI_BASE_URL", base_url.as_str())]),
    ).unwrap()
}

/// The OpenAI client posts model and input with bearer auth and returns the message text
#[tokio::test]
async fn test_openai_send_withValidResponse_shouldReturnTrimmedText() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "input": "prompt text"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response_body("1. Salam\n2. Khodafez\n")))
        .expect(1)
        .mount(&server)
        .await;

    let text = openai_backend(&server).send("gpt-4o-mini", "prompt text").await.unwrap();
    assert_eq!(text, "1. Salam\n2. Khodafez");
}

/// The Gemini client puts the model in the path and the key in a header
#[tokio::test]
async fn test_gemini_send_withValidResponse_shouldReturnCandidateText() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "g-test"))
        .and(body_partial_json(json!({"contents": [{"role": "user", "parts": [{"text": "prompt text"}]}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response_body("a||SEP||b")))
        .expect(1)
        .mount(&server)
        .await;

    let text = gemini_backend(&server).send("gemini-2.0-flash", "prompt text").await.unwrap();
    assert_eq!(text, "a||SEP||b");
}

/// Authentication failures are not retried
#[tokio::test]
async fn test_openai_send_withUnauthorized_shouldFailWithoutRetry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let result = openai_backend(&server).send("gpt-4o-mini", "prompt").await;
    assert!(matches!(result, Err(ProviderError::AuthenticationError(message)) if message.contains("invalid api key")));
}

/// Server errors are retried, then the answer goes through
#[tokio::test]
async fn test_gemini_send_withTransientServerError_shouldRetryAndSucceed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response_body("done")))
        .expect(1)
        .mount(&server)
        .await;

    let text = gemini_backend(&server).send("gemini-2.0-flash", "prompt").await.unwrap();
    assert_eq!(text, "done");
}

/// Rate limiting that outlasts the retries is reported as such
#[tokio::test]
async fn test_openai_send_withPersistentRateLimit_shouldReturnRateLimitError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(3)
        .mount(&server)
        .await;

    let result = openai_backend(&server).send("gpt-4o-mini", "prompt").await;
    assert!(matches!(result, Err(ProviderError::RateLimitExceeded(_))));
}

/// A successful answer without text is an error
#[tokio::test]
async fn test_gemini_send_withNoCandidates_shouldReturnEmptyResponse() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let result = gemini_backend(&server).send("gemini-2.0-flash", "prompt").await;
    assert!(matches!(result, Err(ProviderError::EmptyResponse)));
}

/// A whole run over HTTP: the backend answers in the numbered encoding
#[tokio::test]
async fn test_translation_service_withOpenAiServer_shouldTranslateEntries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_response_body("1. Yek\n2. Do")))
        .expect(1)
        .mount(&server)
        .await;

    let service = TranslationService::with_backend(common::test_config("gpt-4o-mini"), openai_backend(&server)).unwrap();
    let mut entries = common::numbered_entries(2);
    let report = service.translate_entries(&mut entries, &RunLog::captured(), |_, _| {}).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(entries[0].text, "Yek");
    assert_eq!(entries[1].text, "Do");
}
