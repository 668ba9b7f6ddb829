// Session Store Client
// Talks to a remote session store over HTTP

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::{Layer, LayerId, LayerRequest, Output, OutputId, OutputRequest, Session};
use crate::services::{SessionStore, SessionStoreError, StoreResult};

pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Response envelope used by the session store
#[derive(Debug, Deserialize)]
struct StoreResponse {
    ok: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a session store exposing `POST {base}/api/{method}` calls
pub struct HttpSessionStore {
    client: Client,
    base_url: String,
}

impl HttpSessionStore {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the store answers at all
    pub async fn health_check(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, subject: Subject<'_>, body: Value) -> StoreResult<T> {
        let url = format!("{}/api/{method}", self.base_url);
        log::debug!("Session store call: {method}");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionStoreError::Transport(format!("{method}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SessionStoreError::Transport(format!("{method}: {e}")))?;

        decode_response(method, subject, status, &body)
    }
}

/// What a call refers to, so a 404 or 409 maps onto the right error kind
#[derive(Debug, Clone, Copy)]
enum Subject<'a> {
    Session(&'a str),
    Output(OutputId),
    Layer(LayerId),
    Listing,
}

/// Turn a raw store response into the call's result
fn decode_response<T: DeserializeOwned>(
    method: &str,
    subject: Subject<'_>,
    status: StatusCode,
    body: &str,
) -> StoreResult<T> {
    let envelope: StoreResponse = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(SessionStoreError::Transport(format!("{method}: invalid response: {e}")));
        }
        // Error pages from proxies are not enveloped
        Err(_) => return Err(map_rejection(subject, status, format!("{method} failed with {status}"))),
    };

    if !envelope.ok || !status.is_success() {
        let message = envelope.error.unwrap_or_else(|| format!("{method} failed with {status}"));
        return Err(map_rejection(subject, status, message));
    }

    serde_json::from_value(envelope.data.unwrap_or(Value::Null))
        .map_err(|e| SessionStoreError::Transport(format!("{method}: unexpected payload: {e}")))
}

/// Map a failed call onto the closest error kind
fn map_rejection(subject: Subject<'_>, status: StatusCode, message: String) -> SessionStoreError {
    match (status, subject) {
        (StatusCode::CONFLICT, Subject::Session(id)) => SessionStoreError::SessionExists(id.to_string()),
        (StatusCode::NOT_FOUND, Subject::Session(id)) => SessionStoreError::SessionNotFound(id.to_string()),
        (StatusCode::NOT_FOUND, Subject::Output(id)) => SessionStoreError::OutputNotFound(id),
        (StatusCode::NOT_FOUND, Subject::Layer(id)) => SessionStoreError::LayerNotFound(id),
        _ => SessionStoreError::Rejected(message),
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn create_session(&self, session_id: &str, title: &str) -> StoreResult<()> {
        self.call("createSession", Subject::Session(session_id), json!({ "sessionId": session_id, "title": title })).await
    }

    async fn set_video_source(&self, session_id: &str, url: &str) -> StoreResult<()> {
        self.call("setVideoSource", Subject::Session(session_id), json!({ "sessionId": session_id, "videoSourceUrl": url }))
            .await
    }

    async fn add_output(&self, session_id: &str, output: &OutputRequest) -> StoreResult<OutputId> {
        self.call(
            "addOutput",
            Subject::Session(session_id),
            json!({
                "sessionId": session_id,
                "name": output.name,
                "protocol": output.protocol,
                "url": output.url,
                "streamKey": output.stream_key,
                "maxBitrate": output.max_bitrate,
                "ingestCategories": output.categories,
            }),
        )
        .await
    }

    async fn add_layer(&self, session_id: &str, layer: &LayerRequest) -> StoreResult<LayerId> {
        self.call(
            "addLayer",
            Subject::Session(session_id),
            json!({
                "sessionId": session_id,
                "name": layer.name,
                "sourceUrl": layer.source_url,
                "x": layer.position.x,
                "y": layer.position.y,
                "width": layer.size.width,
                "height": layer.size.height,
            }),
        )
        .await
    }

    async fn start_session(&self, session_id: &str) -> StoreResult<()> {
        self.call("startSession", Subject::Session(session_id), json!({ "id": session_id })).await
    }

    async fn stop_session(&self, session_id: &str) -> StoreResult<()> {
        self.call("stopSession", Subject::Session(session_id), json!({ "id": session_id })).await
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Session> {
        self.call("getSession", Subject::Session(session_id), json!({ "id": session_id })).await
    }

    async fn get_output(&self, id: OutputId) -> StoreResult<Output> {
        self.call("getOutput", Subject::Output(id), json!({ "id": id })).await
    }

    async fn get_layer(&self, id: LayerId) -> StoreResult<Layer> {
        self.call("getLayer", Subject::Layer(id), json!({ "id": id })).await
    }

    async fn list_active_sessions(&self) -> StoreResult<Vec<Session>> {
        self.call("listActiveSessions", Subject::Listing, json!({})).await
    }

    async fn list_outputs_by_category(&self, category: &str) -> StoreResult<Vec<Output>> {
        self.call("listOutputsByCategory", Subject::Listing, json!({ "categoryId": category })).await
    }
}
