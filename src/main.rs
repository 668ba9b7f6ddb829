use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::{
    env,
    fs::OpenOptions,
    io::Write,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path as FsPath, PathBuf},
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};
use subtle::ConstantTimeEq;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};

use relaydeck::commands;
use relaydeck::models::{FieldValueMap, LayerRequest, StreamPreset, Verification};
use relaydeck::services::{
    parse_presets, preset_format_instructions, HttpSessionStore, InMemorySessionStore,
    LogEventSink, PlatformRegistry, QuickStart, QuickStartRequest, SessionStore, SettingsManager,
    DEFAULT_STORE_TIMEOUT_SECS,
};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8008;
const LOG_FILE_NAME: &str = "relaydeck-server.log";

// ============================================================================
// Configuration
// ============================================================================

/// Server settings read from `RELAYDECK_*` environment variables
#[derive(Debug, Clone)]
struct ServerConfig {
    data_dir: PathBuf,
    log_dir: PathBuf,
    host: String,
    port: u16,
    auth_token: Option<String>,
    session_store_url: Option<String>,
    store_timeout: Duration,
    log_level: LevelFilter,
    cors_origins: Vec<String>,
}

impl ServerConfig {
    fn from_env() -> Self {
        let data_dir = env::var("RELAYDECK_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let log_dir = env::var("RELAYDECK_LOG_DIR").unwrap_or_else(|_| format!("{data_dir}/logs"));

        let port = env::var("RELAYDECK_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let store_timeout = env::var("RELAYDECK_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);

        let log_level = env::var("RELAYDECK_LOG_LEVEL")
            .ok()
            .and_then(|value| LevelFilter::from_str(value.trim()).ok())
            .unwrap_or(LevelFilter::Info);

        let cors_origins = env::var("RELAYDECK_CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:*,http://127.0.0.1:*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            data_dir: PathBuf::from(data_dir),
            log_dir: PathBuf::from(log_dir),
            host: env::var("RELAYDECK_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            auth_token: non_empty_env("RELAYDECK_API_TOKEN"),
            session_store_url: non_empty_env("RELAYDECK_SESSION_STORE_URL"),
            store_timeout: Duration::from_secs(store_timeout),
            log_level,
            cors_origins,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
struct AppState {
    registry: Arc<PlatformRegistry>,
    store: Arc<dyn SessionStore>,
    remote_store: Option<Arc<HttpSessionStore>>,
    settings_manager: Arc<SettingsManager>,
    quick_start: Arc<QuickStart>,
    auth_token: Option<String>,
}

#[derive(Serialize)]
struct InvokeResponse {
    ok: bool,
    data: Option<Value>,
    error: Option<String>,
}

// ============================================================================
// Logging
// ============================================================================

struct ServerLogger {
    file: Mutex<std::fs::File>,
    level: LevelFilter,
}

impl ServerLogger {
    fn new(log_dir: &FsPath, level: LevelFilter) -> Result<Self, Box<dyn std::error::Error>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LOG_FILE_NAME))?;
        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

impl Log for ServerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now();
        let date = timestamp.format("%Y-%m-%d");
        let time = timestamp.format("%H:%M:%S");
        let target = record.target();
        let level = record.level();
        let line = format!("[{date}][{time}][{target}][{level}] {}", record.args());

        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }

        if level <= Level::Warn {
            eprintln!("{line}");
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

// ============================================================================
// Security Utilities
// ============================================================================

/// Constant-time token comparison to prevent timing attacks
fn verify_token(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Extract bearer token from Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn build_cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let origin_str = match origin.to_str() {
                Ok(s) => s,
                Err(_) => return false,
            };

            allowed_origins.iter().any(|allowed| {
                if let Some(prefix) = allowed.strip_suffix(":*") {
                    // Any port on the given host
                    origin_str.starts_with(prefix) && origin_str[prefix.len()..].starts_with(':')
                } else {
                    origin_str == allowed
                }
            })
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// ============================================================================
// Request Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// Readiness check - preferences readable and session store answering
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = match &state.remote_store {
        Some(remote) => remote.health_check().await,
        None => state.store.list_active_sessions().await.is_ok(),
    };
    let checks = [
        ("preferences", state.settings_manager.load().is_ok()),
        ("sessionStore", store_ok),
    ];

    let failed: Vec<&str> = checks.iter().filter(|(_, ok)| !ok).map(|(name, _)| *name).collect();
    if failed.is_empty() {
        (StatusCode::OK, Json(json!({ "ok": true })))
    } else {
        log::warn!("Readiness check failed: {failed:?}");
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "ok": false, "failed": failed })))
    }
}

async fn invoke(
    Path(command): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    if let Some(expected) = state.auth_token.as_deref() {
        if !bearer_token(&headers).is_some_and(|t| verify_token(expected, t)) {
            let response = InvokeResponse {
                ok: false,
                data: None,
                error: Some("Unauthorized".to_string()),
            };
            return (StatusCode::UNAUTHORIZED, Json(response));
        }
    }

    match invoke_command(&state, &command, payload).await {
        Ok(data) => (
            StatusCode::OK,
            Json(InvokeResponse {
                ok: true,
                data: Some(data),
                error: None,
            }),
        ),
        Err(error) => {
            log::debug!("Command '{command}' failed: {error}");
            (
                StatusCode::BAD_REQUEST,
                Json(InvokeResponse {
                    ok: false,
                    data: None,
                    error: Some(error),
                }),
            )
        }
    }
}

// ============================================================================
// Command Handler
// ============================================================================

async fn invoke_command(state: &AppState, command: &str, payload: Value) -> Result<Value, String> {
    let store = state.store.as_ref();
    let registry = state.registry.as_ref();

    match command {
        // --- Platforms ---
        "get_platforms" => Ok(json!(commands::get_platforms(registry))),
        "get_platform" => {
            let platform_id: String = get_arg(&payload, "platformId")?;
            Ok(json!(commands::get_platform(registry, &platform_id)?))
        }
        "validate_platform_fields" => {
            let platform_id: String = get_arg(&payload, "platformId")?;
            let values: FieldValueMap = get_arg(&payload, "values")?;
            Ok(json!(commands::validate_platform_fields(registry, &platform_id, &values)?))
        }
        "get_initial_values" => {
            let platform_id: String = get_arg(&payload, "platformId")?;
            Ok(json!(commands::get_initial_values(registry, &platform_id)?))
        }

        // --- Presets ---
        "parse_presets" => {
            let text: String = get_arg(&payload, "text")?;
            Ok(json!(parse_presets(&text)))
        }
        "get_preset_format" => Ok(json!(preset_format_instructions())),
        "apply_preset" => {
            let platform_id: String = get_opt_arg(&payload, "platformId")?.unwrap_or_else(|| "youtube".to_string());
            let preset: StreamPreset = get_arg(&payload, "preset")?;
            Ok(json!(commands::apply_preset(registry, &platform_id, &preset)?))
        }

        // --- Sessions ---
        "quick_start" => {
            let request: QuickStartRequest = get_arg(&payload, "request")?;
            let session_id = commands::quick_start(&state.quick_start, &request).await?;
            Ok(json!({ "sessionId": session_id }))
        }
        "create_session" => {
            let session_id: Option<String> = get_opt_arg(&payload, "sessionId")?;
            let title: String = get_arg(&payload, "title")?;
            let session_id = commands::create_session(store, session_id, &title).await?;
            Ok(json!({ "sessionId": session_id }))
        }
        "get_session" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            Ok(json!(commands::get_session(store, &session_id).await?))
        }
        "list_active_sessions" => Ok(json!(commands::list_active_sessions(store).await?)),
        "start_session" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            commands::start_session(store, &session_id).await?;
            Ok(Value::Null)
        }
        "stop_session" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            commands::stop_session(store, &session_id).await?;
            Ok(Value::Null)
        }
        "set_video_source" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            let url: String = get_arg(&payload, "videoSourceUrl")?;
            commands::set_video_source(store, &session_id, &url).await?;
            Ok(Value::Null)
        }
        "add_output" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            let platform_id: String = get_arg(&payload, "platformId")?;
            let values: FieldValueMap = get_arg(&payload, "values")?;
            let output_id = commands::add_output(store, registry, &session_id, &platform_id, &values).await?;
            Ok(json!({ "outputId": output_id }))
        }
        "get_output" => {
            let id: u64 = get_arg(&payload, "id")?;
            let reveal: bool = get_opt_arg(&payload, "reveal")?.unwrap_or(false);
            Ok(json!(commands::get_output(store, id, reveal).await?))
        }
        "list_outputs_by_category" => {
            let category: String = get_arg(&payload, "category")?;
            Ok(json!(commands::list_outputs_by_category(store, &category).await?))
        }
        "add_layer" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            let layer: LayerRequest = get_arg(&payload, "layer")?;
            let layer_id = commands::add_layer(store, &session_id, &layer).await?;
            Ok(json!({ "layerId": layer_id }))
        }
        "get_layer" => {
            let id: u64 = get_arg(&payload, "id")?;
            Ok(json!(commands::get_layer(store, id).await?))
        }
        "get_session_checklist" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            Ok(json!(commands::get_session_checklist(store, &session_id).await?))
        }

        // --- Preferences & helpers ---
        "get_preferences" => Ok(json!(commands::get_preferences(&state.settings_manager)?)),
        "get_verification" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            Ok(json!(commands::get_verification(&state.settings_manager, &session_id)))
        }
        "set_verification" => {
            let session_id: String = get_arg(&payload, "sessionId")?;
            let verification: Verification = get_arg(&payload, "verification")?;
            Ok(json!(commands::set_verification(&state.settings_manager, &session_id, verification)?))
        }
        "suggest_title" => Ok(json!(commands::get_suggested_title())),
        "check_video_link" => {
            let url: String = get_arg(&payload, "url")?;
            Ok(json!(commands::check_video_link(&url)))
        }

        _ => Err(format!("Unknown command: {command}")),
    }
}

// ============================================================================
// Argument Parsing
// ============================================================================

fn get_arg<T: DeserializeOwned>(payload: &Value, key: &str) -> Result<T, String> {
    let obj = payload
        .as_object()
        .ok_or_else(|| "Invalid payload".to_string())?;
    let value = obj
        .get(key)
        .ok_or_else(|| format!("Missing argument: {key}"))?;
    serde_json::from_value(value.clone()).map_err(|e| format!("Invalid {key}: {e}"))
}

fn get_opt_arg<T: DeserializeOwned>(payload: &Value, key: &str) -> Result<Option<T>, String> {
    let obj = payload
        .as_object()
        .ok_or_else(|| "Invalid payload".to_string())?;
    let value = match obj.get(key) {
        Some(value) => value.clone(),
        None => return Ok(None),
    };

    if value.is_null() {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| format!("Invalid {key}: {e}"))
}

fn parse_host(host: &str) -> IpAddr {
    host.parse().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received, server shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    std::fs::create_dir_all(&config.data_dir)?;
    std::fs::create_dir_all(&config.log_dir)?;

    let logger = ServerLogger::new(&config.log_dir, config.log_level)?;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(config.log_level);

    let registry = Arc::new(PlatformRegistry::with_builtin());
    log::info!("Loaded {} platform adapter(s)", registry.len());

    let remote_store = match &config.session_store_url {
        Some(url) => {
            let remote = HttpSessionStore::new(url, config.store_timeout)?;
            log::info!("Using remote session store at {}", remote.base_url());
            Some(Arc::new(remote))
        }
        None => {
            log::warn!("RELAYDECK_SESSION_STORE_URL not set, sessions are kept in memory");
            None
        }
    };
    let store: Arc<dyn SessionStore> = match &remote_store {
        Some(remote) => remote.clone() as Arc<dyn SessionStore>,
        None => Arc::new(InMemorySessionStore::new()),
    };

    let settings_manager = Arc::new(SettingsManager::new(&config.data_dir));
    let quick_start = Arc::new(
        QuickStart::new(registry.clone(), store.clone(), Arc::new(LogEventSink))
            .with_settings(settings_manager.clone()),
    );

    let state = AppState {
        registry,
        store,
        remote_store,
        settings_manager,
        quick_start,
        auth_token: config.auth_token.clone(),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/invoke/:command", post(invoke))
        .with_state(state)
        .layer(build_cors_layer(config.cors_origins.clone()));

    let address = SocketAddr::new(parse_host(&config.host), config.port);
    log::info!("Relaydeck backend listening on http://{address}");
    if config.auth_token.is_some() {
        log::info!("  Authentication: enabled");
    } else {
        log::info!("  Authentication: disabled (no token configured)");
    }

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaydeck::services::NoopEventSink;

    #[test]
    fn test_get_arg_and_opt_arg() {
        let payload = json!({ "sessionId": "s1", "reveal": null, "id": 7 });

        let session_id: String = get_arg(&payload, "sessionId").unwrap();
        assert_eq!(session_id, "s1");
        let id: u64 = get_arg(&payload, "id").unwrap();
        assert_eq!(id, 7);

        assert_eq!(
            get_arg::<String>(&payload, "title").unwrap_err(),
            "Missing argument: title"
        );
        assert!(get_arg::<u64>(&payload, "sessionId").unwrap_err().starts_with("Invalid sessionId"));

        assert_eq!(get_opt_arg::<bool>(&payload, "reveal").unwrap(), None);
        assert_eq!(get_opt_arg::<bool>(&payload, "missing").unwrap(), None);
        assert!(get_arg::<String>(&json!([1, 2]), "x").is_err());
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        assert_eq!(bearer_token(&headers), Some("secret"));
        assert!(verify_token("secret", "secret"));
        assert!(!verify_token("secret", "secreT"));
        assert!(!verify_token("secret", "secret2"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_invoke_command_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(PlatformRegistry::with_builtin());
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let settings_manager = Arc::new(SettingsManager::new(dir.path()));
        let quick_start = Arc::new(
            QuickStart::new(registry.clone(), store.clone(), Arc::new(NoopEventSink))
                .with_settings(settings_manager.clone()),
        );
        let state = AppState {
            registry,
            store,
            remote_store: None,
            settings_manager,
            quick_start,
            auth_token: None,
        };

        let platforms = invoke_command(&state, "get_platforms", json!({})).await.unwrap();
        assert_eq!(platforms[0]["id"], "youtube");

        let created = invoke_command(&state, "create_session", json!({ "title": "Evening" }))
            .await
            .unwrap();
        let session_id = created["sessionId"].as_str().unwrap().to_string();
        let session = invoke_command(&state, "get_session", json!({ "sessionId": session_id }))
            .await
            .unwrap();
        assert_eq!(session["title"], "Evening");

        let err = invoke_command(&state, "launch_rockets", json!({})).await.unwrap_err();
        assert_eq!(err, "Unknown command: launch_rockets");
    }
}
