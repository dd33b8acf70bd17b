//! Request parameter types

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One parameter set for the recommendation endpoint
///
/// `address` and `language_tag` are always sent; the remaining fields are
/// optional and omitted from the query when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    /// Free-form location
    pub address: String,

    /// Time-of-day slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,

    /// Dining scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,

    /// Mood
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,

    /// Dietary restrictions; never an empty list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<String>>,

    /// BCP-47 style language tag
    pub language_tag: String,
}

impl RequestParams {
    /// Create a parameter set with only the required fields
    pub fn new(address: impl Into<String>, language_tag: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            time_slot: None,
            scene: None,
            mood: None,
            restrictions: None,
            language_tag: language_tag.into(),
        }
    }

    /// Set the time slot
    pub fn with_time_slot(mut self, time_slot: impl Into<String>) -> Self {
        self.time_slot = Some(time_slot.into());
        self
    }

    /// Set the scene
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    /// Set the mood
    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    /// Set the restrictions. An empty list clears them.
    pub fn with_restrictions<I, S>(mut self, restrictions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = restrictions.into_iter().map(Into::into).collect();
        self.restrictions = if list.is_empty() { None } else { Some(list) };
        self
    }

    /// True when no optional field is set
    pub fn is_required_only(&self) -> bool {
        self.time_slot.is_none()
            && self.scene.is_none()
            && self.mood.is_none()
            && self.restrictions.is_none()
    }

    /// Query string entries in wire order
    ///
    /// `restrictions` is repeated once per element.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("address", self.address.as_str()),
            ("languageTag", self.language_tag.as_str()),
        ];
        if let Some(time_slot) = &self.time_slot {
            pairs.push(("timeSlot", time_slot.as_str()));
        }
        if let Some(scene) = &self.scene {
            pairs.push(("scene", scene.as_str()));
        }
        if let Some(mood) = &self.mood {
            pairs.push(("mood", mood.as_str()));
        }
        for restriction in self.restrictions.iter().flatten() {
            pairs.push(("restrictions", restriction.as_str()));
        }
        pairs
    }

    /// Restrictions rendered as a JSON array, or an empty string when absent
    pub fn restrictions_json(&self) -> String {
        match &self.restrictions {
            Some(list) => serde_json::to_string(list).unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Correlation id attached to every outcome
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh id: `req_<base36 epoch millis>_<8 hex digits>`
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let suffix: u32 = rand::thread_rng().gen();
        Self(format!("req_{}_{:08x}", to_base36(millis), suffix))
    }

    /// Borrow the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_order() {
        let params = RequestParams::new("Shibuya, Tokyo, Japan", "ja-JP")
            .with_time_slot("dinner")
            .with_mood("spicy")
            .with_restrictions(["vegetarian", "gluten_free"]);

        assert_eq!(
            params.query_pairs(),
            vec![
                ("address", "Shibuya, Tokyo, Japan"),
                ("languageTag", "ja-JP"),
                ("timeSlot", "dinner"),
                ("mood", "spicy"),
                ("restrictions", "vegetarian"),
                ("restrictions", "gluten_free"),
            ]
        );
    }

    #[test]
    fn test_empty_restrictions_normalized() {
        let params = RequestParams::new("Kyoto", "en-US").with_restrictions(Vec::<String>::new());
        assert!(params.restrictions.is_none());
        assert!(params.is_required_only());
        assert_eq!(params.restrictions_json(), "");
    }

    #[test]
    fn test_restrictions_json() {
        let params = RequestParams::new("Kyoto", "en-US").with_restrictions(["dairy_free"]);
        assert_eq!(params.restrictions_json(), r#"["dairy_free"]"#);
        assert!(!params.is_required_only());
    }

    #[test]
    fn test_camel_case_serialization() {
        let params = RequestParams::new("Kyoto", "en-US").with_time_slot("lunch");
        let json = serde_json::to_string(&params).unwrap();

        assert!(json.contains("\"timeSlot\":\"lunch\""));
        assert!(json.contains("\"languageTag\":\"en-US\""));
        assert!(!json.contains("scene"));
    }

    #[test]
    fn test_request_id_format() {
        let id = RequestId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "req");
        assert!(parts[1].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_request_ids_differ() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }
}
