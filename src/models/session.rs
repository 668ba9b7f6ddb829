// Session Model
// Entities owned by the session store, plus request bundles sent to it

use serde::{Deserialize, Serialize};
use crate::models::{FieldValueMap, PlatformAdapter};

pub type SessionId = String;
pub type OutputId = u64;
pub type LayerId = u64;

const MASK: &str = "••••";

/// A broadcast session as reported by the session store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,

    pub title: String,

    #[serde(default)]
    pub video_source_url: Option<String>,

    /// Overlay layers, in stacking order
    #[serde(default)]
    pub layers: Vec<LayerId>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub outputs: Vec<OutputId>,
}

/// Mask a secret for display. Short values are hidden entirely, longer ones
/// keep their last four characters.
pub fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 8 {
        return MASK.to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{MASK}{tail}")
}

/// A streaming output attached to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub id: OutputId,
    pub name: String,
    pub protocol: String,
    pub url: String,
    pub stream_key: String,

    /// Kbps, 0 for unlimited
    pub max_bitrate: u64,

    #[serde(default)]
    pub ingest_categories: Vec<String>,
}

impl Output {
    /// Copy with the stream key masked, for logs and list views
    pub fn redacted(&self) -> Self {
        Self {
            stream_key: mask_secret(&self.stream_key),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// An overlay layer composited on top of the video source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub source_url: String,
    pub position: Position,
    pub size: Size,
}

/// Arguments for adding an output to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRequest {
    pub name: String,
    pub protocol: String,
    pub url: String,
    pub stream_key: String,
    pub max_bitrate: u64,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl OutputRequest {
    /// Normalize validated adapter values into an output request.
    ///
    /// A blank `name` falls back to the adapter display name, and an absent
    /// or non-numeric `maxBitrate` becomes 0 (unlimited).
    pub fn from_adapter(adapter: &PlatformAdapter, values: &FieldValueMap) -> Self {
        let text = |id: &str| {
            values
                .get(id)
                .and_then(|value| value.as_text())
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let name = match text("name") {
            name if name.is_empty() => adapter.display_name.clone(),
            name => name,
        };

        let max_bitrate = values
            .get("maxBitrate")
            .and_then(|value| value.as_number())
            .filter(|n| *n > 0.0)
            .map(|n| n.trunc() as u64)
            .unwrap_or(0);

        Self {
            name,
            protocol: adapter.protocol.clone(),
            url: text("ingestUrl"),
            stream_key: text("streamKey"),
            max_bitrate,
            categories: adapter.default_categories.clone(),
        }
    }
}

/// Arguments for adding an overlay layer to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRequest {
    pub name: String,
    pub source_url: String,
    pub position: Position,
    pub size: Size,
}

impl LayerRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Layer name is required".to_string());
        }
        if self.source_url.trim().is_empty() {
            return Err("Layer source URL is required".to_string());
        }
        if self.size.width == 0 || self.size.height == 0 {
            return Err("Layer size must be greater than zero".to_string());
        }
        Ok(())
    }
}
