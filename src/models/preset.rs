// Preset Model
// Stream presets produced by the text importer

use serde::{Deserialize, Serialize};
use crate::models::{FieldValue, FieldValueMap};

pub const PRESET_BEGIN: &str = "---PRESET-BEGIN---";
pub const PRESET_END: &str = "---PRESET-END---";

/// A fully specified video source + output credential bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPreset {
    pub title: String,
    pub video_link: String,
    pub ingest_url: String,
    pub stream_key: String,
}

impl StreamPreset {
    /// Render the preset in the import block format
    pub fn to_block(&self) -> String {
        format!(
            "{PRESET_BEGIN}\nTitle: {}\nVideo Link: {}\nIngest URL: {}\nStream Key: {}\n{PRESET_END}\n",
            self.title, self.video_link, self.ingest_url, self.stream_key
        )
    }

    /// Field values for the YouTube adapter. The preset title doubles as the
    /// output target name.
    pub fn to_field_values(&self) -> FieldValueMap {
        let mut values = FieldValueMap::new();
        values.insert("name".to_string(), FieldValue::Text(self.title.clone()));
        values.insert("ingestUrl".to_string(), FieldValue::Text(self.ingest_url.clone()));
        values.insert("streamKey".to_string(), FieldValue::Text(self.stream_key.clone()));
        values
    }
}

/// Outcome of parsing a preset text block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub presets: Vec<StreamPreset>,
    pub errors: Vec<String>,
}
