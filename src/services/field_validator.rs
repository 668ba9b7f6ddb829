// Field Validator
// Checks user-supplied values against an adapter's field schemas

use reqwest::Url;
use crate::models::{FieldKind, FieldSchema, FieldValue, FieldValueMap, PlatformAdapter, ValidationErrors};

/// Field id that carries an ingest endpoint and must parse as a URL
pub const INGEST_URL_FIELD: &str = "ingestUrl";

/// Validate `values` against every field of `adapter`.
///
/// Problems are collected rather than returned on the first failure, so the
/// caller can show every message at once. Fields without a problem have no
/// entry in the result.
pub fn validate_fields(adapter: &PlatformAdapter, values: &FieldValueMap) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    for field in &adapter.fields {
        let value = values.get(&field.id);

        if field.required && value.map_or(true, FieldValue::is_blank) {
            errors.insert(&field.id, format!("{} is required", field.label));
            continue;
        }

        let Some(value) = value else {
            continue;
        };

        if let Some(message) = check_value(field, value) {
            errors.insert(&field.id, message);
        }
    }

    errors
}

fn check_value(field: &FieldSchema, value: &FieldValue) -> Option<String> {
    match &field.kind {
        FieldKind::Text { .. } => {
            let Some(text) = value.as_text() else {
                return Some(format!("{} must be text", field.label));
            };
            if field.id == INGEST_URL_FIELD && !text.trim().is_empty() && Url::parse(text.trim()).is_err() {
                return Some("Please enter a valid URL".to_string());
            }
            None
        }
        FieldKind::Number { .. } => {
            // An optional number left empty in a form is simply absent
            if value.is_blank() {
                return None;
            }
            match value.as_number() {
                Some(n) if n < 0.0 => Some(format!("{} must be a positive number", field.label)),
                Some(_) => None,
                None => Some(format!("{} must be a number", field.label)),
            }
        }
        FieldKind::Select { options, .. } => {
            let Some(text) = value.as_text() else {
                return Some(format!("{} must be text", field.label));
            };
            if text.trim().is_empty() || options.iter().any(|o| o.value == text) {
                return None;
            }
            let allowed: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
            Some(format!("{} must be one of: {}", field.label, allowed.join(", ")))
        }
    }
}
