//! Response and outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::request::{RequestId, RequestParams};

/// A single recommended dish category
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommendationItem {
    /// Category name
    pub category: String,
    /// Headline shown to the user
    pub topic_title: String,
    /// Why the category was recommended
    pub reason: String,
    /// Stable category identifier
    pub category_id: String,
    /// Illustration URL
    pub image_url: String,
}

/// Response envelope used by the API for every reply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// Whether the call succeeded at the application level
    pub success: bool,

    /// Payload, present on success
    pub data: Option<T>,

    /// Human-readable failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Machine-readable failure code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Terminal status of one parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// 2xx with a successful envelope
    Success,
    /// Any other failure
    Error,
    /// The last attempt hit its deadline
    Timeout,
}

impl OutcomeStatus {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final record for one parameter set, after all retries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    /// Correlation id
    pub request_id: RequestId,

    /// Parameters that were sent
    pub params: RequestParams,

    /// Terminal status
    pub status: OutcomeStatus,

    /// Wall time from the first attempt to the final result, retries included
    pub elapsed_ms: u64,

    /// Number of items returned (success only)
    pub item_count: Option<usize>,

    /// First item returned (success with at least one item)
    pub first_item: Option<RecommendationItem>,

    /// Category of every returned item (success only)
    #[serde(default)]
    pub categories: Vec<String>,

    /// Failure description
    pub error: Option<String>,

    /// Failure classification
    pub error_kind: Option<ErrorKind>,

    /// Last HTTP status observed, if any response arrived
    pub http_status: Option<u16>,

    /// HTTP attempts made
    pub attempts: u32,

    /// Completion time
    pub timestamp: DateTime<Utc>,
}

impl AttemptOutcome {
    /// Build a success outcome from the returned items
    pub fn success(
        request_id: RequestId,
        params: RequestParams,
        items: &[RecommendationItem],
        elapsed_ms: u64,
        attempts: u32,
        http_status: Option<u16>,
    ) -> Self {
        Self {
            request_id,
            params,
            status: OutcomeStatus::Success,
            elapsed_ms,
            item_count: Some(items.len()),
            first_item: items.first().cloned(),
            categories: items.iter().map(|item| item.category.clone()).collect(),
            error: None,
            error_kind: None,
            http_status,
            attempts,
            timestamp: Utc::now(),
        }
    }

    /// Build a failure outcome
    ///
    /// The status is `Timeout` for [`ErrorKind::Timeout`] and `Error` otherwise.
    pub fn failure(
        request_id: RequestId,
        params: RequestParams,
        kind: ErrorKind,
        message: impl Into<String>,
        elapsed_ms: u64,
        attempts: u32,
        http_status: Option<u16>,
    ) -> Self {
        let status = if kind == ErrorKind::Timeout {
            OutcomeStatus::Timeout
        } else {
            OutcomeStatus::Error
        };

        Self {
            request_id,
            params,
            status,
            elapsed_ms,
            item_count: None,
            first_item: None,
            categories: Vec::new(),
            error: Some(message.into()),
            error_kind: Some(kind),
            http_status,
            attempts,
            timestamp: Utc::now(),
        }
    }

    /// Check if this outcome is a success
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: &str) -> RecommendationItem {
        RecommendationItem {
            category: category.to_string(),
            topic_title: format!("{category} tonight"),
            ..Default::default()
        }
    }

    #[test]
    fn test_envelope_parsing() {
        let json = r#"{
            "success": true,
            "data": [
                {"category": "Ramen", "topicTitle": "Warm up", "reason": "cold", "categoryId": "c1", "imageUrl": "https://img/1"},
                {"category": "Sushi"}
            ]
        }"#;
        let envelope: ApiEnvelope<Vec<RecommendationItem>> = serde_json::from_str(json).unwrap();
        let data = envelope.data.unwrap();

        assert!(envelope.success);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].topic_title, "Warm up");
        assert_eq!(data[1].category_id, "");
    }

    #[test]
    fn test_failed_envelope_parsing() {
        let json = r#"{"success": false, "data": null, "errorCode": "INVALID_PARAMS", "message": "bad mood"}"#;
        let envelope: ApiEnvelope<Vec<RecommendationItem>> = serde_json::from_str(json).unwrap();

        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error_code.as_deref(), Some("INVALID_PARAMS"));
    }

    #[test]
    fn test_success_outcome() {
        let items = vec![item("Ramen"), item("Sushi")];
        let outcome = AttemptOutcome::success(
            RequestId::from("req_1"),
            RequestParams::new("Kyoto", "en-US"),
            &items,
            120,
            1,
            Some(200),
        );

        assert!(outcome.is_success());
        assert_eq!(outcome.item_count, Some(2));
        assert_eq!(outcome.first_item.as_ref().unwrap().category, "Ramen");
        assert_eq!(outcome.categories, vec!["Ramen", "Sushi"]);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_success_outcome_without_items() {
        let outcome = AttemptOutcome::success(
            RequestId::from("req_1"),
            RequestParams::new("Kyoto", "en-US"),
            &[],
            5,
            1,
            Some(200),
        );

        assert_eq!(outcome.item_count, Some(0));
        assert!(outcome.first_item.is_none());
    }

    #[test]
    fn test_failure_status_mapping() {
        let params = RequestParams::new("Kyoto", "en-US");
        let timeout = AttemptOutcome::failure(
            RequestId::from("req_1"),
            params.clone(),
            ErrorKind::Timeout,
            "deadline elapsed",
            60_000,
            4,
            None,
        );
        let server = AttemptOutcome::failure(
            RequestId::from("req_2"),
            params,
            ErrorKind::ServerError,
            "HTTP 503",
            10,
            4,
            Some(503),
        );

        assert_eq!(timeout.status, OutcomeStatus::Timeout);
        assert_eq!(server.status, OutcomeStatus::Error);
        assert_eq!(server.error_kind, Some(ErrorKind::ServerError));
        assert!(server.item_count.is_none());
    }

    #[test]
    fn test_status_lowercase_serialization() {
        assert_eq!(
            serde_json::to_string(&OutcomeStatus::Timeout).unwrap(),
            "\"timeout\""
        );
        assert_eq!(OutcomeStatus::Success.to_string(), "success");
    }
}
