// Quick Start Service
// Creates, configures and starts a session in one pass

use rand::Rng;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::{FieldValueMap, OutputRequest, SessionId, ValidationErrors};
use crate::services::{
    emit_event, redact_url, redact_values, validate_fields, EventSink, PlatformRegistry,
    SessionStore, SessionStoreError, SettingsManager,
};

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_SUFFIX_LEN: usize = 9;

/// One session store call of the quick start sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickStartStep {
    CreateSession,
    SetVideoSource,
    AddOutput,
    StartSession,
}

impl std::fmt::Display for QuickStartStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QuickStartStep::CreateSession => "create session",
            QuickStartStep::SetVideoSource => "set video source",
            QuickStartStep::AddOutput => "add output",
            QuickStartStep::StartSession => "start session",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuickStartError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    /// A session store call failed. Earlier steps are left applied.
    #[error("Failed to {step}: {source}")]
    Step {
        step: QuickStartStep,
        #[source]
        source: SessionStoreError,
    },
}

/// User input for the full quick start flow
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStartRequest {
    pub title: String,
    pub video_source_url: String,
    pub platform_id: String,
    #[serde(default)]
    pub values: FieldValueMap,
}

/// Composes registry, validator and session store into the quick start flow
pub struct QuickStart {
    registry: Arc<PlatformRegistry>,
    store: Arc<dyn SessionStore>,
    events: Arc<dyn EventSink>,
    settings: Option<Arc<SettingsManager>>,
}

impl QuickStart {
    pub fn new(registry: Arc<PlatformRegistry>, store: Arc<dyn SessionStore>, events: Arc<dyn EventSink>) -> Self {
        Self {
            registry,
            store,
            events,
            settings: None,
        }
    }

    /// Remember last used title and video URL after successful starts
    pub fn with_settings(mut self, settings: Arc<SettingsManager>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Validate user input, then run the session store sequence under a
    /// freshly generated session id.
    pub async fn start(&self, request: &QuickStartRequest) -> Result<SessionId, QuickStartError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(QuickStartError::InvalidInput("Session title is required".to_string()));
        }

        let video_source_url = request.video_source_url.trim();
        if video_source_url.is_empty() {
            return Err(QuickStartError::InvalidInput("Video source URL is required".to_string()));
        }

        let adapter = self
            .registry
            .get_platform(&request.platform_id)
            .ok_or_else(|| QuickStartError::UnknownPlatform(request.platform_id.clone()))?;

        let errors = validate_fields(adapter, &request.values);
        if !errors.is_valid() {
            log::info!(
                "Quick start rejected for platform '{}': {} ({:?})",
                adapter.id,
                errors.summary(adapter),
                redact_values(adapter, &request.values)
            );
            return Err(QuickStartError::Validation(errors));
        }

        let output = OutputRequest::from_adapter(adapter, &request.values);
        let session_id = generate_session_id();
        self.run(&session_id, title, video_source_url, &output).await?;

        if let Some(settings) = &self.settings {
            if let Err(e) = settings.set_last_title(title) {
                log::warn!("Failed to remember quick start title: {e}");
            }
            if let Err(e) = settings.set_last_video_url(video_source_url) {
                log::warn!("Failed to remember quick start video URL: {e}");
            }
        }

        Ok(session_id)
    }

    /// Create the session, set its video source, add one output and start it.
    ///
    /// Calls run strictly one after another. The first failure stops the
    /// sequence; steps already applied are not rolled back.
    pub async fn run(
        &self,
        session_id: &str,
        title: &str,
        video_source_url: &str,
        output: &OutputRequest,
    ) -> Result<SessionId, QuickStartError> {
        log::info!(
            "Quick start '{session_id}': output '{}' via {} -> {}",
            output.name,
            output.protocol,
            redact_url(&output.url)
        );

        self.step(session_id, QuickStartStep::CreateSession, self.store.create_session(session_id, title))
            .await?;
        self.step(
            session_id,
            QuickStartStep::SetVideoSource,
            self.store.set_video_source(session_id, video_source_url),
        )
        .await?;
        let output_id = self
            .step(session_id, QuickStartStep::AddOutput, self.store.add_output(session_id, output))
            .await?;
        self.step(session_id, QuickStartStep::StartSession, self.store.start_session(session_id))
            .await?;

        log::info!("Quick start '{session_id}' live with output {output_id}");
        self.events.emit(
            "quick_start://completed",
            json!({ "sessionId": session_id, "outputId": output_id }),
        );

        Ok(session_id.to_string())
    }

    async fn step<T>(
        &self,
        session_id: &str,
        step: QuickStartStep,
        call: impl std::future::Future<Output = Result<T, SessionStoreError>>,
    ) -> Result<T, QuickStartError> {
        emit_event(
            self.events.as_ref(),
            "quick_start://step",
            &json!({ "sessionId": session_id, "step": step }),
        );

        call.await.map_err(|source| {
            log::error!("Quick start '{session_id}' failed to {step}: {source}");
            self.events.emit(
                "quick_start://failed",
                json!({ "sessionId": session_id, "step": step, "error": source.to_string() }),
            );
            QuickStartError::Step { step, source }
        })
    }
}

/// Session id of the form `session-<unix millis>-<9 lowercase alphanumerics>`
pub fn generate_session_id() -> SessionId {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect();
    format!("session-{}-{suffix}", chrono::Utc::now().timestamp_millis())
}
