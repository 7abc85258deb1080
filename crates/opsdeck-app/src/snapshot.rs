use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single captured form-field value. Flags model checkbox-like fields;
/// everything else is text. Untagged so the stored JSON stays a plain
/// name-to-value object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

/// The captured set of a form's current field values, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FormSnapshot {
    fields: BTreeMap<String, FieldValue>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), FieldValue::Text(value.into()));
    }

    pub fn insert_flag(&mut self, name: impl Into<String>, value: bool) {
        self.fields.insert(name.into(), FieldValue::Flag(value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, FormSnapshot};

    #[test]
    fn snapshot_serializes_as_a_plain_object() {
        let mut snapshot = FormSnapshot::new();
        snapshot.insert_text("sku", "ABC123");
        snapshot.insert_flag("active", true);

        let json = serde_json::to_string(&snapshot).expect("serialize snapshot");
        assert_eq!(json, r#"{"active":true,"sku":"ABC123"}"#);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut snapshot = FormSnapshot::new();
        snapshot.insert_text("name", "Walnut desk");
        snapshot.insert_flag("active", false);

        let json = serde_json::to_string(&snapshot).expect("serialize snapshot");
        let decoded: FormSnapshot = serde_json::from_str(&json).expect("decode snapshot");
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.get("active"), Some(&FieldValue::Flag(false)));
    }
}
