// Session Store
// Interface to the backend that owns sessions, outputs and layers

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use crate::models::{
    Layer, LayerId, LayerRequest, Output, OutputId, OutputRequest, Session,
};
use crate::services::redact_url;

/// Result type for session store operations
pub type StoreResult<T> = Result<T, SessionStoreError>;

/// Errors reported by a session store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Output not found: {0}")]
    OutputNotFound(OutputId),

    #[error("Layer not found: {0}")]
    LayerNotFound(LayerId),

    #[error("Session already exists: {0}")]
    SessionExists(String),

    #[error("Session store unreachable: {0}")]
    Transport(String),

    #[error("Session store rejected the request: {0}")]
    Rejected(String),
}

/// Operations the configuration core needs from the session backend.
///
/// Session ids are chosen by the caller; output and layer ids are assigned
/// by the store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session_id: &str, title: &str) -> StoreResult<()>;

    async fn set_video_source(&self, session_id: &str, url: &str) -> StoreResult<()>;

    async fn add_output(&self, session_id: &str, output: &OutputRequest) -> StoreResult<OutputId>;

    async fn add_layer(&self, session_id: &str, layer: &LayerRequest) -> StoreResult<LayerId>;

    async fn start_session(&self, session_id: &str) -> StoreResult<()>;

    async fn stop_session(&self, session_id: &str) -> StoreResult<()>;

    async fn get_session(&self, session_id: &str) -> StoreResult<Session>;

    async fn get_output(&self, id: OutputId) -> StoreResult<Output>;

    async fn get_layer(&self, id: LayerId) -> StoreResult<Layer>;

    async fn list_active_sessions(&self) -> StoreResult<Vec<Session>>;

    async fn list_outputs_by_category(&self, category: &str) -> StoreResult<Vec<Output>>;
}

#[derive(Default)]
struct StoreState {
    // BTreeMap keeps listings in a stable order
    sessions: BTreeMap<String, Session>,
    outputs: HashMap<OutputId, Output>,
    layers: HashMap<LayerId, Layer>,
    next_id: u64,
}

impl StoreState {
    fn session_mut(&mut self, session_id: &str) -> StoreResult<&mut Session> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionStoreError::SessionNotFound(session_id.to_string()))
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Session store kept in process memory.
///
/// Used when no remote store is configured, and by tests.
#[derive(Default)]
pub struct InMemorySessionStore {
    state: Mutex<StoreState>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, session_id: &str, title: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.sessions.contains_key(session_id) {
            return Err(SessionStoreError::SessionExists(session_id.to_string()));
        }
        state.sessions.insert(
            session_id.to_string(),
            Session {
                id: session_id.to_string(),
                title: title.to_string(),
                video_source_url: None,
                layers: Vec::new(),
                is_active: false,
                outputs: Vec::new(),
            },
        );
        log::info!("Created session '{session_id}'");
        Ok(())
    }

    async fn set_video_source(&self, session_id: &str, url: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.session_mut(session_id)?.video_source_url = Some(url.to_string());
        Ok(())
    }

    async fn add_output(&self, session_id: &str, output: &OutputRequest) -> StoreResult<OutputId> {
        let mut state = self.state.lock().await;
        state.session_mut(session_id)?;

        let id = state.allocate_id();
        state.outputs.insert(
            id,
            Output {
                id,
                name: output.name.clone(),
                protocol: output.protocol.clone(),
                url: output.url.clone(),
                stream_key: output.stream_key.clone(),
                max_bitrate: output.max_bitrate,
                ingest_categories: output.categories.clone(),
            },
        );
        state.session_mut(session_id)?.outputs.push(id);

        log::info!(
            "Added output {id} ({}) to session '{session_id}' -> {}",
            output.name,
            redact_url(&output.url)
        );
        Ok(id)
    }

    async fn add_layer(&self, session_id: &str, layer: &LayerRequest) -> StoreResult<LayerId> {
        let mut state = self.state.lock().await;
        state.session_mut(session_id)?;

        let id = state.allocate_id();
        state.layers.insert(
            id,
            Layer {
                id,
                name: layer.name.clone(),
                source_url: layer.source_url.clone(),
                position: layer.position,
                size: layer.size,
            },
        );
        state.session_mut(session_id)?.layers.push(id);
        Ok(id)
    }

    async fn start_session(&self, session_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.session_mut(session_id)?.is_active = true;
        log::info!("Session '{session_id}' started");
        Ok(())
    }

    async fn stop_session(&self, session_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.session_mut(session_id)?.is_active = false;
        log::info!("Session '{session_id}' stopped");
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Session> {
        let state = self.state.lock().await;
        state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionStoreError::SessionNotFound(session_id.to_string()))
    }

    async fn get_output(&self, id: OutputId) -> StoreResult<Output> {
        let state = self.state.lock().await;
        state.outputs.get(&id).cloned().ok_or(SessionStoreError::OutputNotFound(id))
    }

    async fn get_layer(&self, id: LayerId) -> StoreResult<Layer> {
        let state = self.state.lock().await;
        state.layers.get(&id).cloned().ok_or(SessionStoreError::LayerNotFound(id))
    }

    async fn list_active_sessions(&self) -> StoreResult<Vec<Session>> {
        let state = self.state.lock().await;
        Ok(state.sessions.values().filter(|s| s.is_active).cloned().collect())
    }

    async fn list_outputs_by_category(&self, category: &str) -> StoreResult<Vec<Output>> {
        let state = self.state.lock().await;
        let mut outputs: Vec<Output> = state
            .outputs
            .values()
            .filter(|o| o.ingest_categories.iter().any(|c| c == category))
            .cloned()
            .collect();
        outputs.sort_by_key(|o| o.id);
        Ok(outputs)
    }
}
