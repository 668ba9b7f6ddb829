// Platform Model
// Schema types describing what a streaming destination needs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Values supplied for an adapter's fields, keyed by field id
pub type FieldValueMap = BTreeMap<String, FieldValue>;

/// A raw value entered for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// True for text that is empty once trimmed
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.trim().is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the value. Form inputs arrive as strings, so text
    /// holding a decimal number is accepted too.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            FieldValue::Bool(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// One entry of a select field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Field type together with the constraints that only make sense for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text {
        #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Number {
        #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
        default: Option<f64>,
    },
    Select {
        options: Vec<SelectOption>,
        #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
}

/// Declarative description of one configurable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Unique within the owning adapter
    pub id: String,

    /// Human readable label, also used in error messages
    pub label: String,

    #[serde(flatten)]
    pub kind: FieldKind,

    pub required: bool,

    /// Value must be masked in the UI and never logged in clear
    #[serde(default)]
    pub sensitive: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl FieldSchema {
    pub fn text(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Text { default: None })
    }

    pub fn number(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Number { default: None })
    }

    pub fn select(id: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self::new(id, label, FieldKind::Select { options, default: None })
    }

    fn new(id: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            sensitive: false,
            placeholder: None,
            help_text: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn help_text(mut self, help_text: &str) -> Self {
        self.help_text = Some(help_text.to_string());
        self
    }

    /// Set the default for the field's own kind. Text and select fields take
    /// the textual form of the value, number fields ignore non-numeric input.
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        match &mut self.kind {
            FieldKind::Text { default } | FieldKind::Select { default, .. } => {
                *default = match value {
                    FieldValue::Text(text) => Some(text),
                    FieldValue::Number(n) => Some(n.to_string()),
                    FieldValue::Bool(b) => Some(b.to_string()),
                };
            }
            FieldKind::Number { default } => {
                *default = value.as_number();
            }
        }
        self
    }

    /// Declared default, typed by the field kind
    pub fn default_value(&self) -> Option<FieldValue> {
        match &self.kind {
            FieldKind::Text { default } | FieldKind::Select { default, .. } => {
                default.clone().map(FieldValue::Text)
            }
            FieldKind::Number { default } => default.map(FieldValue::Number),
        }
    }
}

/// A streaming destination kind: its fields, transport and default tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAdapter {
    /// Unique within the registry
    pub id: String,

    pub display_name: String,

    /// Transport identifier handed to the session store (e.g. "rtmp")
    pub protocol: String,

    /// Ordered; drives both form rendering and validation
    pub fields: Vec<FieldSchema>,

    #[serde(default)]
    pub default_categories: Vec<String>,
}

impl PlatformAdapter {
    pub fn new(id: &str, display_name: &str, protocol: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            protocol: protocol.to_string(),
            fields: Vec::new(),
            default_categories: Vec::new(),
        }
    }

    /// Append a field. A field reusing an existing id replaces it in place,
    /// so ids stay unique within the adapter.
    pub fn field(mut self, field: FieldSchema) -> Self {
        match self.fields.iter_mut().find(|f| f.id == field.id) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Add a default category, ignoring duplicates
    pub fn category(mut self, category: &str) -> Self {
        if !self.default_categories.iter().any(|c| c == category) {
            self.default_categories.push(category.to_string());
        }
        self
    }

    pub fn get_field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Field values prefilled from declared defaults
    pub fn initial_values(&self) -> FieldValueMap {
        self.fields
            .iter()
            .filter_map(|field| field.default_value().map(|value| (field.id.clone(), value)))
            .collect()
    }
}

/// Field id to error message. An empty set means every field is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field_id: &str, message: String) {
        self.0.insert(field_id.to_string(), message);
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.0.get(field_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// All messages joined in the adapter's field order
    pub fn summary(&self, adapter: &PlatformAdapter) -> String {
        adapter
            .fields
            .iter()
            .filter_map(|field| self.get(&field.id))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_schema_serializes_with_type_tag() {
        let field = FieldSchema::number("maxBitrate", "Max Bitrate (kbps)").with_default(4500.0);
        let value = serde_json::to_value(&field).unwrap();

        assert_eq!(value["type"], "number");
        assert_eq!(value["defaultValue"], 4500.0);
        assert_eq!(value["required"], false);

        let parsed: FieldSchema = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, field);
    }

    #[test]
    fn test_number_default_ignores_text() {
        let field = FieldSchema::number("fps", "FPS").with_default("fast");
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn test_duplicate_field_id_replaces() {
        let adapter = PlatformAdapter::new("x", "X", "rtmp")
            .field(FieldSchema::text("name", "Name"))
            .field(FieldSchema::text("url", "URL"))
            .field(FieldSchema::text("name", "Target Name").required());

        assert_eq!(adapter.fields.len(), 2);
        assert_eq!(adapter.fields[0].label, "Target Name");
        assert!(adapter.fields[0].required);
    }

    #[test]
    fn test_initial_values_from_defaults() {
        let adapter = PlatformAdapter::new("x", "X", "rtmp")
            .field(FieldSchema::text("name", "Name"))
            .field(FieldSchema::number("maxBitrate", "Bitrate").with_default(4500.0));

        let values = adapter.initial_values();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("maxBitrate"), Some(&FieldValue::Number(4500.0)));
    }

    #[test]
    fn test_field_value_untagged() {
        let values: FieldValueMap =
            serde_json::from_str(r#"{"a": "text", "b": 12, "c": true}"#).unwrap();
        assert_eq!(values["a"], FieldValue::Text("text".into()));
        assert_eq!(values["b"], FieldValue::Number(12.0));
        assert_eq!(values["c"], FieldValue::Bool(true));
    }

    #[test]
    fn test_text_number_parsing() {
        assert_eq!(FieldValue::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(FieldValue::from("abc").as_number(), None);
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }
}
