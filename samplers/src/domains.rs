//! Parameter domains

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SamplerError;

/// Value lists that parameter sets are drawn from
///
/// `addresses` and `language_tags` are required fields of every request,
/// the rest are optional. Each entry of `restrictions` is one combination
/// sent together; the empty combination stands for "no restrictions".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterDomains {
    /// Locations
    pub addresses: Vec<String>,
    /// Time-of-day slots
    pub time_slots: Vec<String>,
    /// Dining scenes
    pub scenes: Vec<String>,
    /// Moods
    pub moods: Vec<String>,
    /// Restriction combinations
    pub restrictions: Vec<Vec<String>>,
    /// Language tags
    pub language_tags: Vec<String>,
}

impl Default for ParameterDomains {
    fn default() -> Self {
        fn strings(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }

        Self {
            addresses: strings(&[
                "Shibuya, Tokyo, Japan",
                "Kyoto Station, Kyoto, Japan",
                "Kraljevice, Bosnia & Herzegovina",
            ]),
            time_slots: strings(&["morning", "lunch", "dinner", "late_night"]),
            scenes: strings(&["solo", "date", "group", "large_group", "tourism"]),
            moods: strings(&[
                "hearty", "light", "sweet", "spicy", "healthy", "junk", "alcohol",
            ]),
            restrictions: vec![
                strings(&["vegetarian"]),
                strings(&["gluten_free"]),
                strings(&["dairy_free"]),
                strings(&["nut_allergy"]),
                strings(&["seafood_allergy"]),
                strings(&["halal"]),
                strings(&["vegetarian", "gluten_free"]),
                strings(&["dairy_free", "nut_allergy"]),
                Vec::new(),
            ],
            language_tags: strings(&["en-US", "ja-JP"]),
        }
    }
}

impl ParameterDomains {
    /// Load domains from a JSON file
    ///
    /// Lists missing from the file keep their default values; the required
    /// lists must not be empty.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SamplerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SamplerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let domains: Self = serde_json::from_str(&contents)?;
        domains.validate()?;

        tracing::debug!(
            path = %path.display(),
            addresses = domains.addresses.len(),
            language_tags = domains.language_tags.len(),
            "Loaded parameter domains"
        );

        Ok(domains)
    }

    /// Check that the required lists are populated
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.addresses.is_empty() {
            return Err(SamplerError::EmptyDomain("addresses"));
        }
        if self.language_tags.is_empty() {
            return Err(SamplerError::EmptyDomain("languageTags"));
        }
        Ok(())
    }

    /// Replace the addresses
    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the language tags
    pub fn with_language_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Restriction options in cartesian order: `None` first, then every
    /// non-empty combination
    pub(crate) fn restriction_options(&self) -> Vec<Option<Vec<String>>> {
        std::iter::once(None)
            .chain(
                self.restrictions
                    .iter()
                    .filter(|combo| !combo.is_empty())
                    .map(|combo| Some(combo.clone())),
            )
            .collect()
    }

    /// Size of the full cartesian product, saturating
    pub fn cartesian_size(&self) -> usize {
        [
            self.addresses.len(),
            self.language_tags.len(),
            self.time_slots.len() + 1,
            self.scenes.len() + 1,
            self.moods.len() + 1,
            self.restriction_options().len(),
        ]
        .into_iter()
        .fold(1usize, |acc, n| acc.saturating_mul(n))
    }
}
