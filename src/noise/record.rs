//! Noise catalog entries.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One background-noise clip known to the catalog.
///
/// `file_name` is relative to the noise asset root.  Field names follow the
/// camelCase document shape used by the admin tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseRecord {
    pub id: String,
    /// Unique display name.
    pub name: String,
    pub file_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Mix volume as entered by an admin, e.g. `"0.75"`.
    #[serde(default)]
    pub volume: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: u64,
}

impl NoiseRecord {
    /// New record with a random id and normalised tags.
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        tags: &[String],
        volume: Option<String>,
    ) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            id: random_id(),
            name: name.into(),
            file_name: file_name.into(),
            tags: normalize_tags(tags),
            volume,
            created_at,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// 16 lowercase hex characters.
pub fn random_id() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Trim, lowercase and de-duplicate tags, keeping first-seen order and
/// dropping empties.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let t = tag.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// Split a comma-separated tag list and normalise it.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    let parts: Vec<String> = raw.split(',').map(str::to_string).collect();
    normalize_tags(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_lowercases_trims_and_dedupes_in_order() {
        assert_eq!(
            normalize_tags(&tags(&[" Rain", "forest", "rain ", "", "  ", "FOREST", "cafe"])),
            tags(&["rain", "forest", "cafe"])
        );
    }

    #[test]
    fn parse_tag_list_splits_on_commas() {
        assert_eq!(parse_tag_list("Rain, storm,,night"), tags(&["rain", "storm", "night"]));
        assert!(parse_tag_list("").is_empty());
    }

    #[test]
    fn new_record_has_hex_id_and_normalised_tags() {
        let r = NoiseRecord::new("Rain", "noise_ab.ogg", &tags(&["Rain"]), None);
        assert_eq!(r.id.len(), 16);
        assert!(r.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(r.has_tag("rain"));
        assert!(!r.has_tag("Rain"));
        assert!(r.created_at > 0);
    }

    #[test]
    fn deserialises_camel_case_document() {
        let json = r#"{"id":"1","name":"Rain","fileName":"noise_1.ogg","tags":["rain"]}"#;
        let r: NoiseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.file_name, "noise_1.ogg");
        assert!(r.volume.is_none());
        assert_eq!(r.created_at, 0);
    }
}
