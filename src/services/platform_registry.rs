// Platform Registry
// Lookup of streaming destination adapters, built once at startup

use std::collections::HashMap;
use crate::models::{mask_secret, FieldSchema, FieldValue, FieldValueMap, PlatformAdapter};

/// Adapter lookup shared by every component that needs field schemas.
///
/// Populated during startup, then handed out behind an `Arc`; reads take
/// `&self` and need no locking.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    adapters: Vec<PlatformAdapter>,
    index: HashMap<String, usize>,
}

impl PlatformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in adapters
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(youtube_adapter());
        registry
    }

    /// Register an adapter. An adapter with the same id is replaced in place
    /// and keeps its original position.
    pub fn register(&mut self, adapter: PlatformAdapter) {
        match self.index.get(&adapter.id) {
            Some(&position) => {
                log::debug!("Replacing platform adapter '{}'", adapter.id);
                self.adapters[position] = adapter;
            }
            None => {
                log::debug!("Registering platform adapter '{}'", adapter.id);
                self.index.insert(adapter.id.clone(), self.adapters.len());
                self.adapters.push(adapter);
            }
        }
    }

    /// Get an adapter by id
    pub fn get_platform(&self, id: &str) -> Option<&PlatformAdapter> {
        self.index.get(id).map(|&position| &self.adapters[position])
    }

    /// All adapters in registration order
    pub fn get_all_platforms(&self) -> Vec<&PlatformAdapter> {
        self.adapters.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// YouTube RTMP ingest
pub fn youtube_adapter() -> PlatformAdapter {
    PlatformAdapter::new("youtube", "YouTube", "rtmp")
        .field(
            FieldSchema::text("name", "Target Name")
                .required()
                .placeholder("e.g., My YouTube Channel")
                .help_text("A friendly name to identify this output"),
        )
        .field(
            FieldSchema::text("ingestUrl", "RTMP Ingest URL")
                .required()
                .placeholder("rtmp://a.rtmp.youtube.com/live2")
                .help_text("YouTube RTMP server URL (usually rtmp://a.rtmp.youtube.com/live2)"),
        )
        .field(
            FieldSchema::text("streamKey", "Stream Key")
                .required()
                .sensitive()
                .placeholder("xxxx-xxxx-xxxx-xxxx")
                .help_text("Your YouTube stream key from YouTube Studio"),
        )
        .field(
            FieldSchema::number("maxBitrate", "Max Bitrate (kbps)")
                .placeholder("4500")
                .help_text("Maximum bitrate for the stream (optional, 0 for unlimited)")
                .with_default(4500.0),
        )
        .category("youtube")
        .category("live")
}

/// Copy of `values` with every sensitive field of `adapter` masked
pub fn redact_values(adapter: &PlatformAdapter, values: &FieldValueMap) -> FieldValueMap {
    values
        .iter()
        .map(|(id, value)| {
            let sensitive = adapter.get_field(id).is_some_and(|f| f.sensitive);
            let value = match value {
                FieldValue::Text(text) if sensitive => FieldValue::Text(mask_secret(text)),
                other => other.clone(),
            };
            (id.clone(), value)
        })
        .collect()
}

/// Redact the stream key segment of an RTMP(S) URL for logging
pub fn redact_url(url: &str) -> String {
    if !(url.starts_with("rtmp://") || url.starts_with("rtmps://")) {
        return url.to_string();
    }

    let (scheme, rest) = match url.split_once("://") {
        Some(parts) => parts,
        None => return url.to_string(),
    };

    let (host, path) = match rest.split_once('/') {
        Some(parts) => parts,
        None => return url.to_string(),
    };

    // rtmp://host/app is just the ingest point; the key is the segment after it
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return url.to_string();
    }

    let safe_path = segments[..segments.len() - 1].join("/");
    format!("{scheme}://{host}/{safe_path}/***")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldKind;

    fn adapter(id: &str, name: &str) -> PlatformAdapter {
        PlatformAdapter::new(id, name, "rtmp")
    }

    #[test]
    fn test_builtin_registry_has_youtube() {
        let registry = PlatformRegistry::with_builtin();
        let youtube = registry.get_platform("youtube").unwrap();

        assert_eq!(youtube.display_name, "YouTube");
        assert_eq!(youtube.protocol, "rtmp");
        let ids: Vec<&str> = youtube.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "ingestUrl", "streamKey", "maxBitrate"]);
        assert!(youtube.get_field("streamKey").unwrap().sensitive);
        assert!(!youtube.get_field("maxBitrate").unwrap().required);
        assert_eq!(
            youtube.get_field("maxBitrate").unwrap().kind,
            FieldKind::Number { default: Some(4500.0) }
        );
    }

    #[test]
    fn test_unknown_platform() {
        let registry = PlatformRegistry::with_builtin();
        assert!(registry.get_platform("twitch").is_none());
    }

    #[test]
    fn test_registration_order() {
        let mut registry = PlatformRegistry::new();
        registry.register(adapter("a", "A"));
        registry.register(adapter("b", "B"));

        let ids: Vec<&str> = registry.get_all_platforms().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = PlatformRegistry::new();
        registry.register(adapter("a", "A"));
        registry.register(adapter("b", "B"));
        registry.register(adapter("a", "A v2"));

        let all = registry.get_all_platforms();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].display_name, "A v2");
        assert_eq!(all[1].id, "b");
        assert_eq!(registry.get_platform("a").unwrap().display_name, "A v2");
    }

    #[test]
    fn test_redact_values_masks_sensitive_only() {
        let youtube = youtube_adapter();
        let mut values = FieldValueMap::new();
        values.insert("name".into(), "Main".into());
        values.insert("streamKey".into(), "abcd-efgh-ijkl-mnop".into());

        let redacted = redact_values(&youtube, &values);
        assert_eq!(redacted["name"], FieldValue::Text("Main".into()));
        assert_eq!(redacted["streamKey"], FieldValue::Text("••••mnop".into()));
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("rtmp://a.rtmp.youtube.com/live2/my_secret_key"),
            "rtmp://a.rtmp.youtube.com/live2/***"
        );
        assert_eq!(
            redact_url("rtmp://a.rtmp.youtube.com/live2"),
            "rtmp://a.rtmp.youtube.com/live2"
        );
        assert_eq!(redact_url("https://example.com/a/b"), "https://example.com/a/b");
    }
}
