use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A raw form payload for one report: field name to string value.
///
/// Forms post JSON objects whose values are mostly strings, but number
/// inputs and unchecked boxes arrive as numbers, booleans or `null`. Every
/// value is normalized to text on the way in so the rest of the pipeline
/// only ever sees strings:
/// - strings are kept as-is,
/// - numbers and booleans become their JSON text,
/// - `null` becomes the empty string,
/// - arrays and objects are kept as compact JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, String>")]
pub struct Submission {
    fields: BTreeMap<String, String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns the value for `key`, or `default` when the field is absent.
    /// An empty string is a present value.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for Submission {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let fields = raw
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();
        Self { fields }
    }
}

impl From<Submission> for BTreeMap<String, String> {
    fn from(submission: Submission) -> Self {
        submission.fields
    }
}

impl<K, V> FromIterator<(K, V)> for Submission
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_normalizes_scalars() {
        let submission: Submission = serde_json::from_str(
            r#"{"name": "Doe", "gallons_1": 12.5, "signed": true, "notes": null}"#,
        )
        .unwrap();

        assert_eq!(submission.get("name"), Some("Doe"));
        assert_eq!(submission.get("gallons_1"), Some("12.5"));
        assert_eq!(submission.get("signed"), Some("true"));
        assert_eq!(submission.get("notes"), Some(""));
        assert_eq!(submission.len(), 4);
    }

    #[test]
    fn get_or_only_defaults_missing_fields() {
        let submission: Submission = [("month", "")].into_iter().collect();
        assert_eq!(submission.get_or("month", "June"), "");
        assert_eq!(submission.get_or("year", "2025"), "2025");
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(serde_json::from_str::<Submission>("[1, 2, 3]").is_err());
    }
}
