// Events
// Progress notifications from the quick start flow

use serde::Serialize;
use serde_json::Value;

/// Receiver for named progress events such as `quick_start://step`
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Drops every event
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &str, _payload: Value) {}
}

/// Writes events to the log under the `relaydeck::events` target
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &str, payload: Value) {
        log::debug!(target: "relaydeck::events", "{event} {payload}");
    }
}

pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit(event, value),
        Err(e) => log::warn!("Dropped event '{event}': {e}"),
    }
}

/// Keeps every emitted event in memory, for inspection
#[cfg(test)]
#[derive(Default)]
pub struct RecordingEventSink {
    events: std::sync::Mutex<Vec<(String, Value)>>,
}

#[cfg(test)]
impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }
}

#[cfg(test)]
impl EventSink for RecordingEventSink {
    fn emit(&self, event: &str, payload: Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.to_string(), payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        emit_event(&sink, "quick_start://step", &json!({ "step": "createSession" }));
        emit_event(&sink, "quick_start://completed", &json!({ "sessionId": "s1" }));

        assert_eq!(sink.names(), vec!["quick_start://step", "quick_start://completed"]);
        assert_eq!(sink.events()[1].1["sessionId"], "s1");
    }
}
