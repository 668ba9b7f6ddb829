// Session Health
// Readiness checklist built from values the session store reports

use serde::Serialize;
use crate::models::{Output, Session};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: &'static str,
    pub label: &'static str,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionChecklist {
    pub session_id: String,
    pub items: Vec<ChecklistItem>,
    /// Every item passed
    pub ready: bool,
}

/// Build the checklist for `session`. `outputs` are the session's resolved
/// outputs; ids that could not be fetched are simply absent.
pub fn session_checklist(session: &Session, outputs: &[Output]) -> SessionChecklist {
    let has_video_source = session
        .video_source_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());
    let has_outputs = !session.outputs.is_empty();
    let outputs_complete = has_outputs
        && outputs.len() == session.outputs.len()
        && outputs
            .iter()
            .all(|o| !o.url.trim().is_empty() && !o.stream_key.trim().is_empty());

    let items = vec![
        ChecklistItem { id: "videoSource", label: "Video source configured", passed: has_video_source },
        ChecklistItem { id: "outputs", label: "At least one output target", passed: has_outputs },
        ChecklistItem {
            id: "outputFields",
            label: "Every output has an ingest URL and stream key",
            passed: outputs_complete,
        },
        ChecklistItem { id: "active", label: "Session is live", passed: session.is_active },
    ];
    let ready = items.iter().all(|item| item.passed);

    SessionChecklist {
        session_id: session.id.clone(),
        items,
        ready,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(outputs: Vec<u64>, active: bool) -> Session {
        Session {
            id: "s1".into(),
            title: "Evening".into(),
            video_source_url: Some("https://example.com/v.mp4".into()),
            layers: vec![],
            is_active: active,
            outputs,
        }
    }

    fn output(id: u64, key: &str) -> Output {
        Output {
            id,
            name: "yt".into(),
            protocol: "rtmp".into(),
            url: "rtmp://a.rtmp.youtube.com/live2".into(),
            stream_key: key.into(),
            max_bitrate: 0,
            ingest_categories: vec![],
        }
    }

    #[test]
    fn test_ready_session() {
        let checklist = session_checklist(&session(vec![1], true), &[output(1, "key")]);
        assert!(checklist.ready);
    }

    #[test]
    fn test_missing_stream_key() {
        let checklist = session_checklist(&session(vec![1], true), &[output(1, " ")]);
        assert!(!checklist.ready);
        let item = checklist.items.iter().find(|i| i.id == "outputFields").unwrap();
        assert!(!item.passed);
    }

    #[test]
    fn test_no_outputs() {
        let checklist = session_checklist(&session(vec![], false), &[]);
        let failed: Vec<&str> = checklist.items.iter().filter(|i| !i.passed).map(|i| i.id).collect();
        assert_eq!(failed, vec!["outputs", "outputFields", "active"]);
    }
}
