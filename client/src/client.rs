//! HTTP client for the recommendation endpoint

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reco_bench_core::{
    ApiEnvelope, AttemptOutcome, RecommendationItem, RequestId, RequestParams, RunConfig,
    TargetClient,
};
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::error::{AttemptError, ClientError};
use crate::retry::RetryPolicy;

/// `User-Agent` sent with every request
pub const USER_AGENT: &str = concat!("reco-bench/", env!("CARGO_PKG_VERSION"));

/// Sends one parameter set to the endpoint, retrying per [`RetryPolicy`]
///
/// Every failure is folded into the returned [`AttemptOutcome`]; `execute`
/// never fails.
pub struct RetryingClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl RetryingClient {
    /// Create a client for the full endpoint `url`
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let url = url.into();
        reqwest::Url::parse(&url).map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))?;

        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            url,
            timeout,
            policy,
        })
    }

    /// Create a client from a run configuration
    pub fn from_config(config: &RunConfig) -> Result<Self, ClientError> {
        Self::new(
            config.endpoint_url(),
            config.timeout,
            RetryPolicy::from_config(config),
        )
    }

    /// Retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Per-attempt deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send_once(
        &self,
        request_id: &RequestId,
        params: &RequestParams,
        attempt: u32,
    ) -> Result<(u16, Vec<RecommendationItem>), AttemptError> {
        tracing::debug!(
            request_id = %request_id,
            attempt,
            address = %params.address,
            language_tag = %params.language_tag,
            "Sending request"
        );

        let response = self
            .http
            .get(&self.url)
            .query(&params.query_pairs())
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        classify_response(status, &body).map(|items| (status, items))
    }

    fn transport_error(&self, error: reqwest::Error) -> AttemptError {
        if error.is_timeout() {
            AttemptError::Timeout(self.timeout)
        } else {
            AttemptError::Connection(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl TargetClient for RetryingClient {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn execute(&self, request_id: RequestId, params: &RequestParams) -> AttemptOutcome {
        let started = Instant::now();
        let request_id_ref = &request_id;

        let (result, attempts) = self
            .policy
            .run(|attempt| self.send_once(request_id_ref, params, attempt))
            .await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok((status, items)) => AttemptOutcome::success(
                request_id,
                params.clone(),
                &items,
                elapsed_ms,
                attempts,
                Some(status),
            ),
            Err(error) => {
                tracing::debug!(
                    request_id = %request_id,
                    attempts,
                    kind = %error.kind(),
                    error = %error,
                    "Request failed"
                );
                AttemptOutcome::failure(
                    request_id,
                    params.clone(),
                    error.kind(),
                    error.to_string(),
                    elapsed_ms,
                    attempts,
                    error.http_status(),
                )
            }
        }
    }
}

impl std::fmt::Debug for RetryingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingClient")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Turn a status and body into items or a classified error
pub(crate) fn classify_response(
    status: u16,
    body: &str,
) -> Result<Vec<RecommendationItem>, AttemptError> {
    if let Some(signal) = service_signal(status, body) {
        return Err(signal);
    }
    if !(200..300).contains(&status) {
        return Err(AttemptError::status(status, body));
    }

    let envelope: ApiEnvelope<Vec<RecommendationItem>> =
        serde_json::from_str(body).map_err(|e| AttemptError::InvalidResponse {
            status,
            message: e.to_string(),
        })?;

    if !envelope.success {
        return Err(AttemptError::Api {
            status,
            code: envelope.error_code.unwrap_or_else(|| "UNKNOWN".to_string()),
            message: envelope.message.unwrap_or_default(),
        });
    }

    envelope.data.ok_or_else(|| AttemptError::InvalidResponse {
        status,
        message: "successful envelope without data".to_string(),
    })
}

/// Maintenance and version signals, whatever the status code
fn service_signal(status: u16, body: &str) -> Option<AttemptError> {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let code = value.get("errorCode").and_then(Value::as_str);
    let error = value.get("error").and_then(Value::as_str);
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match (code, error) {
        (Some("SERVICE_MAINTENANCE" | "MAINTENANCE_MODE"), _) | (_, Some("Service maintenance")) => {
            Some(AttemptError::Maintenance { status, message })
        }
        (Some("UNSUPPORTED_VERSION"), _) | (_, Some("Unsupported version")) => {
            Some(AttemptError::UnsupportedVersion { status, message })
        }
        _ if status == 426 => Some(AttemptError::UnsupportedVersion { status, message }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reco_bench_core::{ErrorKind, OutcomeStatus};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v1/dish-categories/recommendations";

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_backoff(Duration::from_millis(10), Duration::from_millis(50))
            .with_jitter(false)
    }

    fn client(server: &MockServer, policy: RetryPolicy) -> RetryingClient {
        RetryingClient::new(
            format!("{}{ENDPOINT}", server.uri()),
            Duration::from_secs(5),
            policy,
        )
        .unwrap()
    }

    fn params() -> RequestParams {
        RequestParams::new("Shibuya, Tokyo, Japan", "ja-JP")
    }

    fn ok_body() -> Value {
        json!({
            "success": true,
            "data": [
                {
                    "category": "Ramen",
                    "topicTitle": "Warm up tonight",
                    "reason": "It is cold",
                    "categoryId": "cat-1",
                    "imageUrl": "https://img.example/ramen.png"
                },
                {"category": "Sushi", "topicTitle": "Fresh", "categoryId": "cat-2"}
            ]
        })
    }

    async fn run(client: &RetryingClient) -> AttemptOutcome {
        client.execute(RequestId::generate(), &params()).await
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[test]
    fn test_classify_success() {
        let items = classify_response(200, &ok_body().to_string()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].category_id, "cat-1");
    }

    #[test]
    fn test_classify_signals() {
        let maintenance = json!({"success": false, "data": null, "errorCode": "SERVICE_MAINTENANCE", "message": "down"});
        assert!(matches!(
            classify_response(503, &maintenance.to_string()),
            Err(AttemptError::Maintenance { status: 503, .. })
        ));

        let legacy = json!({"error": "Service maintenance"});
        assert!(matches!(
            classify_response(503, &legacy.to_string()),
            Err(AttemptError::Maintenance { .. })
        ));

        let version = json!({"success": false, "errorCode": "UNSUPPORTED_VERSION"});
        assert!(matches!(
            classify_response(426, &version.to_string()),
            Err(AttemptError::UnsupportedVersion { status: 426, .. })
        ));

        assert!(matches!(
            classify_response(426, "upgrade required"),
            Err(AttemptError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_classify_failures() {
        assert!(matches!(
            classify_response(200, "<html>"),
            Err(AttemptError::InvalidResponse { status: 200, .. })
        ));
        assert!(matches!(
            classify_response(200, r#"{"success": true}"#),
            Err(AttemptError::InvalidResponse { .. })
        ));
        assert!(matches!(
            classify_response(502, "bad gateway"),
            Err(AttemptError::Status { status: 502, .. })
        ));

        let api = json!({"success": false, "errorCode": "INVALID_ADDRESS", "message": "unknown place"});
        let err = classify_response(200, &api.to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ApiError);
        assert!(err.to_string().contains("INVALID_ADDRESS"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = RetryingClient::new("not a url", Duration::from_secs(1), fast_policy())
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_from_config() {
        let config = RunConfig::default()
            .with_base_url("http://localhost:3000/")
            .with_timeout(Duration::from_secs(2));
        let client = RetryingClient::from_config(&config).unwrap();

        assert_eq!(
            client.endpoint(),
            "http://localhost:3000/v1/dish-categories/recommendations"
        );
        assert_eq!(client.timeout(), Duration::from_secs(2));
        assert_eq!(client.policy().max_attempts(), 4);
    }

    // ========================================================================
    // Against a mock server
    // ========================================================================

    #[tokio::test]
    async fn test_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy())).await;

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.item_count, Some(2));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.http_status, Some(200));
        assert_eq!(outcome.categories, vec!["Ramen", "Sushi"]);
        let first = outcome.first_item.unwrap();
        assert_eq!(first.topic_title, "Warm up tonight");
        assert_eq!(first.image_url, "https://img.example/ramen.png");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such route"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy())).await;

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.http_status, Some(404));
        assert_eq!(outcome.item_count, None);
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy())).await;

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.item_count, Some(2));
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy().with_max_retries(2))).await;

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.error_kind, Some(ErrorKind::ServerError));
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = RetryingClient::new(
            format!("{}{ENDPOINT}", server.uri()),
            Duration::from_millis(50),
            fast_policy().with_max_retries(0),
        )
        .unwrap();
        let outcome = run(&client).await;

        assert_eq!(outcome.status, OutcomeStatus::Timeout);
        assert_eq!(outcome.error_kind, Some(ErrorKind::Timeout));
        assert_eq!(outcome.http_status, None);
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_api_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "data": null,
                "errorCode": "GEOCODING_FAILED",
                "message": "address not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy())).await;

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.error_kind, Some(ErrorKind::ApiError));
        assert!(outcome.error.unwrap().contains("GEOCODING_FAILED"));
    }

    #[tokio::test]
    async fn test_maintenance_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "success": false,
                "data": null,
                "errorCode": "SERVICE_MAINTENANCE",
                "message": "Service is currently under maintenance"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy())).await;

        assert_eq!(outcome.error_kind, Some(ErrorKind::Maintenance));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.http_status, Some(503));
    }

    #[tokio::test]
    async fn test_upgrade_required_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(426))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy())).await;

        assert_eq!(outcome.error_kind, Some(ErrorKind::UnsupportedVersion));
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_rate_limited_respects_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let no_retry = client(
            &server,
            fast_policy()
                .with_max_retries(1)
                .with_retry_on_rate_limited(false),
        );
        let outcome = run(&no_retry).await;
        assert_eq!(outcome.error_kind, Some(ErrorKind::RateLimited));
        assert_eq!(outcome.attempts, 1);

        let retrying = client(&server, fast_policy().with_max_retries(1));
        let outcome = run(&retrying).await;
        assert_eq!(outcome.error_kind, Some(ErrorKind::RateLimited));
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = run(&client(&server, fast_policy())).await;

        assert_eq!(outcome.error_kind, Some(ErrorKind::InvalidResponse));
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let params = RequestParams::new("Kyoto Station, Kyoto, Japan", "en-US")
            .with_mood("spicy")
            .with_restrictions(["vegetarian", "gluten_free"]);
        let outcome = client(&server, fast_policy())
            .execute(RequestId::generate(), &params)
            .await;
        assert!(outcome.is_success());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let pairs: Vec<(String, String)> = requests[0]
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("address".into(), "Kyoto Station, Kyoto, Japan".into()),
                ("languageTag".into(), "en-US".into()),
                ("mood".into(), "spicy".into()),
                ("restrictions".into(), "vegetarian".into()),
                ("restrictions".into(), "gluten_free".into()),
            ]
        );
        assert!(requests[0].headers.get("user-agent").is_some());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = RetryingClient::new(
            format!("http://127.0.0.1:1{ENDPOINT}"),
            Duration::from_secs(2),
            fast_policy().with_max_retries(1),
        )
        .unwrap();

        let outcome = run(&client).await;

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.error_kind, Some(ErrorKind::Connection));
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.http_status, None);
    }
}
