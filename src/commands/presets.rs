// Preset Commands
// Text import and applying a preset to an adapter form

use serde::Serialize;
use crate::models::{FieldValueMap, StreamPreset, ValidationErrors};
use crate::services::{validate_fields, PlatformRegistry};

/// A preset turned into quick start input
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPreset {
    pub title: String,
    pub video_source_url: String,
    pub platform_id: String,
    pub values: FieldValueMap,
    /// Validation of `values` against the adapter; empty when ready to submit
    pub errors: ValidationErrors,
}

/// Fill an adapter form from a preset. Adapter defaults are kept for fields
/// the preset does not carry.
pub fn apply_preset(
    registry: &PlatformRegistry,
    platform_id: &str,
    preset: &StreamPreset,
) -> Result<AppliedPreset, String> {
    let adapter = registry
        .get_platform(platform_id)
        .ok_or_else(|| format!("Unknown platform: {platform_id}"))?;

    let mut values = adapter.initial_values();
    values.extend(
        preset
            .to_field_values()
            .into_iter()
            .filter(|(id, _)| adapter.get_field(id).is_some()),
    );
    let errors = validate_fields(adapter, &values);

    Ok(AppliedPreset {
        title: preset.title.clone(),
        video_source_url: preset.video_link.clone(),
        platform_id: adapter.id.clone(),
        values,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn preset(ingest_url: &str) -> StreamPreset {
        StreamPreset {
            title: "Crackling Embers - Night".into(),
            video_link: "https://drive.google.com/file/d/abc/view".into(),
            ingest_url: ingest_url.into(),
            stream_key: "abcd-efgh-ijkl-mnop".into(),
        }
    }

    #[test]
    fn test_apply_preset_keeps_defaults() {
        let registry = PlatformRegistry::with_builtin();
        let applied = apply_preset(&registry, "youtube", &preset("rtmp://a.rtmp.youtube.com/live2")).unwrap();

        assert!(applied.errors.is_valid());
        assert_eq!(applied.video_source_url, "https://drive.google.com/file/d/abc/view");
        assert_eq!(applied.values.get("name"), Some(&FieldValue::Text("Crackling Embers - Night".into())));
        assert_eq!(applied.values.get("maxBitrate"), Some(&FieldValue::Number(4500.0)));
    }

    #[test]
    fn test_apply_preset_reports_bad_url() {
        let registry = PlatformRegistry::with_builtin();
        let applied = apply_preset(&registry, "youtube", &preset("a.rtmp.youtube.com")).unwrap();
        assert_eq!(applied.errors.get("ingestUrl"), Some("Please enter a valid URL"));
    }
}
