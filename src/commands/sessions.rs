// Session Commands
// Pass-through session store operations plus the quick start flow

use crate::models::{
    FieldValueMap, Layer, LayerId, LayerRequest, Output, OutputId, OutputRequest, Session, SessionId,
};
use crate::services::{
    generate_session_id, session_checklist, validate_fields, PlatformRegistry, QuickStart,
    QuickStartRequest, SessionChecklist, SessionStore,
};

/// Run the whole quick start flow and return the new session id
pub async fn quick_start(flow: &QuickStart, request: &QuickStartRequest) -> Result<SessionId, String> {
    flow.start(request).await.map_err(|e| e.to_string())
}

/// Create an empty session. A session id is generated when none is given.
pub async fn create_session(
    store: &dyn SessionStore,
    session_id: Option<String>,
    title: &str,
) -> Result<SessionId, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Session title is required".to_string());
    }

    let session_id = session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generate_session_id);
    store
        .create_session(&session_id, title)
        .await
        .map_err(|e| e.to_string())?;
    Ok(session_id)
}

pub async fn get_session(store: &dyn SessionStore, session_id: &str) -> Result<Session, String> {
    store.get_session(session_id).await.map_err(|e| e.to_string())
}

pub async fn list_active_sessions(store: &dyn SessionStore) -> Result<Vec<Session>, String> {
    store.list_active_sessions().await.map_err(|e| e.to_string())
}

pub async fn start_session(store: &dyn SessionStore, session_id: &str) -> Result<(), String> {
    store.start_session(session_id).await.map_err(|e| e.to_string())
}

pub async fn stop_session(store: &dyn SessionStore, session_id: &str) -> Result<(), String> {
    store.stop_session(session_id).await.map_err(|e| e.to_string())
}

pub async fn set_video_source(store: &dyn SessionStore, session_id: &str, url: &str) -> Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("Video source URL is required".to_string());
    }
    store.set_video_source(session_id, url).await.map_err(|e| e.to_string())
}

/// Validate adapter values and add the resulting output to a session
pub async fn add_output(
    store: &dyn SessionStore,
    registry: &PlatformRegistry,
    session_id: &str,
    platform_id: &str,
    values: &FieldValueMap,
) -> Result<OutputId, String> {
    let adapter = registry
        .get_platform(platform_id)
        .ok_or_else(|| format!("Unknown platform: {platform_id}"))?;

    let errors = validate_fields(adapter, values);
    if !errors.is_valid() {
        return Err(errors.summary(adapter));
    }

    let output = OutputRequest::from_adapter(adapter, values);
    store.add_output(session_id, &output).await.map_err(|e| e.to_string())
}

/// Fetch an output. The stream key is masked unless `reveal` is set.
pub async fn get_output(store: &dyn SessionStore, id: OutputId, reveal: bool) -> Result<Output, String> {
    let output = store.get_output(id).await.map_err(|e| e.to_string())?;
    Ok(if reveal { output } else { output.redacted() })
}

pub async fn list_outputs_by_category(store: &dyn SessionStore, category: &str) -> Result<Vec<Output>, String> {
    let outputs = store
        .list_outputs_by_category(category)
        .await
        .map_err(|e| e.to_string())?;
    Ok(outputs.iter().map(Output::redacted).collect())
}

pub async fn add_layer(store: &dyn SessionStore, session_id: &str, layer: &LayerRequest) -> Result<LayerId, String> {
    layer.validate()?;
    store.add_layer(session_id, layer).await.map_err(|e| e.to_string())
}

pub async fn get_layer(store: &dyn SessionStore, id: LayerId) -> Result<Layer, String> {
    store.get_layer(id).await.map_err(|e| e.to_string())
}

/// Readiness checklist for a session. Outputs that fail to load count as
/// incomplete rather than failing the whole check.
pub async fn get_session_checklist(store: &dyn SessionStore, session_id: &str) -> Result<SessionChecklist, String> {
    let session = store.get_session(session_id).await.map_err(|e| e.to_string())?;

    let mut outputs = Vec::with_capacity(session.outputs.len());
    for id in &session.outputs {
        match store.get_output(*id).await {
            Ok(output) => outputs.push(output),
            Err(e) => log::warn!("Checklist for '{session_id}' skipped output {id}: {e}"),
        }
    }

    Ok(session_checklist(&session, &outputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, Position, Size};
    use crate::services::InMemorySessionStore;

    fn youtube_values(stream_key: &str) -> FieldValueMap {
        let mut values = FieldValueMap::new();
        values.insert("name".into(), "Main".into());
        values.insert("ingestUrl".into(), "rtmp://a.rtmp.youtube.com/live2".into());
        values.insert("streamKey".into(), stream_key.into());
        values.insert("maxBitrate".into(), FieldValue::Number(3000.0));
        values
    }

    #[tokio::test]
    async fn test_add_output_validates_first() {
        let store = InMemorySessionStore::new();
        let registry = PlatformRegistry::with_builtin();
        let session_id = create_session(&store, None, "Evening").await.unwrap();

        let err = add_output(&store, &registry, &session_id, "youtube", &youtube_values(" "))
            .await
            .unwrap_err();
        assert_eq!(err, "Stream Key is required");
        assert!(get_session(&store, &session_id).await.unwrap().outputs.is_empty());

        let id = add_output(&store, &registry, &session_id, "youtube", &youtube_values("abcd-efgh-ijkl-mnop"))
            .await
            .unwrap();
        let masked = get_output(&store, id, false).await.unwrap();
        assert_eq!(masked.stream_key, "••••mnop");
        let revealed = get_output(&store, id, true).await.unwrap();
        assert_eq!(revealed.stream_key, "abcd-efgh-ijkl-mnop");
        assert_eq!(revealed.max_bitrate, 3000);
    }

    #[tokio::test]
    async fn test_checklist_flow() {
        let store = InMemorySessionStore::new();
        let registry = PlatformRegistry::with_builtin();
        let session_id = create_session(&store, Some("s1".into()), "Evening").await.unwrap();
        assert_eq!(session_id, "s1");

        assert!(!get_session_checklist(&store, "s1").await.unwrap().ready);

        set_video_source(&store, "s1", "https://example.com/v.mp4").await.unwrap();
        add_output(&store, &registry, "s1", "youtube", &youtube_values("abcd-efgh-ijkl-mnop"))
            .await
            .unwrap();
        start_session(&store, "s1").await.unwrap();

        assert!(get_session_checklist(&store, "s1").await.unwrap().ready);
        assert_eq!(list_active_sessions(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_layer_rejects_empty_size() {
        let store = InMemorySessionStore::new();
        create_session(&store, Some("s1".into()), "Evening").await.unwrap();
        let layer = LayerRequest {
            name: "Logo".into(),
            source_url: "https://example.com/logo.png".into(),
            position: Position { x: 0, y: 0 },
            size: Size { width: 0, height: 10 },
        };

        assert_eq!(
            add_layer(&store, "s1", &layer).await.unwrap_err(),
            "Layer size must be greater than zero"
        );
    }

    #[tokio::test]
    async fn test_given_session_id_is_trimmed() {
        let store = InMemorySessionStore::new();
        let session_id = create_session(&store, Some(" s1 ".into()), "Evening").await.unwrap();

        assert_eq!(session_id, "s1");
        assert_eq!(get_session(&store, "s1").await.unwrap().id, "s1");
        assert!(create_session(&store, Some("s1".into()), "Again").await.is_err());

        let generated = create_session(&store, Some("   ".into()), "Blank id").await.unwrap();
        assert!(generated.starts_with("session-"));
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected() {
        let store = InMemorySessionStore::new();
        assert!(create_session(&store, None, "  ").await.is_err());
        assert!(set_video_source(&store, "s1", " ").await.is_err());
    }
}
