use anyhow::Context as _;
use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use chat_flow::{
    FlowRunner, FlowStorage, InMemoryFlowStorage, InMemorySessionStorage, Reply, Session,
    SessionStorage,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use movie_chat_service::catalog::{CatalogSource, HttpCatalogSource, StaticCatalog};
use movie_chat_service::config::Config;
use movie_chat_service::onboarding::PreferenceBuilder;
use movie_chat_service::profile::{InMemoryProfileStore, ProfileError, ProfileStore, UserProfile};
use movie_chat_service::recommend::RecommendationResult;
use movie_chat_service::steps::{
    WELCOME, build_flow, session_keys, step_ids, welcome_quick_replies,
};
use movie_chat_service::watched::{
    InMemoryWatchedStore, JsonFileWatchedStore, WatchRecord, WatchedStore,
};

#[derive(Clone)]
struct AppState {
    flow_storage: Arc<dyn FlowStorage>,
    session_storage: Arc<dyn SessionStorage>,
    watched: Arc<dyn WatchedStore>,
    profiles: Arc<dyn ProfileStore>,
    onboarding: Arc<DashMap<u64, PreferenceBuilder>>,
    /// Sessions with a turn currently in flight; input is rejected until the
    /// turn (including the typing delay) finishes.
    busy: Arc<DashMap<String, ()>>,
    typing_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    user_id: Option<u64>,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    reply: Option<Reply>,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendations: Option<RecommendationResult>,
}

#[derive(Debug, Deserialize)]
struct SwipeRequest {
    user_id: u64,
    genre: String,
    liked: bool,
}

#[derive(Debug, Deserialize)]
struct OttRequest {
    user_id: u64,
    platform: String,
}

#[derive(Debug, Deserialize)]
struct SkipRequest {
    user_id: u64,
    skipped: bool,
}

#[derive(Debug, Deserialize)]
struct UserRequest {
    user_id: u64,
}

#[derive(Debug, Deserialize)]
struct HistoryRequest {
    user_id: u64,
    movie_id: i64,
    rating: Option<f64>,
}

/// Initialize structured tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "movie_chat_service=debug,chat_flow=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Middleware to add a correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

/// Removes the session from the busy set when the turn ends, on any path.
struct TurnGuard {
    busy: Arc<DashMap<String, ()>>,
    session_id: String,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.busy.remove(&self.session_id);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::from_env();

    let catalog: Arc<dyn CatalogSource> = if let Some(url) = &config.catalog_url {
        info!(url = %url, "using remote movie catalog");
        Arc::new(HttpCatalogSource::new(url.clone()))
    } else if let Some(path) = &config.catalog_file {
        match StaticCatalog::from_json_file(path) {
            Ok(catalog) => {
                info!(path = %path.display(), "using file-backed movie catalog");
                Arc::new(catalog)
            }
            Err(e) => {
                error!("failed to load catalog file: {}. Starting with an empty catalog.", e);
                Arc::new(StaticCatalog::empty())
            }
        }
    } else {
        warn!("no CATALOG_URL or CATALOG_FILE set, starting with an empty catalog");
        Arc::new(StaticCatalog::empty())
    };

    let watched: Arc<dyn WatchedStore> = if let Some(path) = &config.watched_db {
        match JsonFileWatchedStore::open(path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("failed to open watched store: {}. Falling back to in-memory.", e);
                Arc::new(InMemoryWatchedStore::new())
            }
        }
    } else {
        info!("using in-memory watched store (set WATCHED_DB to persist)");
        Arc::new(InMemoryWatchedStore::new())
    };

    let profiles: Arc<dyn ProfileStore> = if let Some(path) = &config.profile_db {
        match InMemoryProfileStore::from_json_file(path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("failed to load profile seed: {}. Starting empty.", e);
                Arc::new(InMemoryProfileStore::new())
            }
        }
    } else {
        Arc::new(InMemoryProfileStore::new())
    };

    let flow_storage: Arc<dyn FlowStorage> = Arc::new(InMemoryFlowStorage::new());
    let flow = build_flow(catalog, watched.clone());
    flow_storage
        .save("default".to_string(), Arc::new(flow))
        .await
        .context("saving default flow")?;

    let app_state = AppState {
        flow_storage,
        session_storage: Arc::new(InMemorySessionStorage::new()),
        watched,
        profiles,
        onboarding: Arc::new(DashMap::new()),
        busy: Arc::new(DashMap::new()),
        typing_delay: config.typing_delay,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/session/{id}", get(get_session))
        .route("/history", post(add_history))
        .route("/history/{user_id}", get(get_history))
        .route("/onboarding/swipe", post(onboarding_swipe))
        .route("/onboarding/ott", post(onboarding_ott))
        .route("/onboarding/skip", post(onboarding_skip))
        .route("/onboarding/reset", post(onboarding_reset))
        .route("/onboarding/complete", post(onboarding_complete))
        .route("/onboarding/{user_id}", get(get_onboarding))
        .layer(from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server running on http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let session_id_provided = request.session_id.is_some();
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if session_id_provided && Uuid::parse_str(&session_id).is_err() {
        error!(session_id = %session_id, "invalid session id format");
        return Err(StatusCode::BAD_REQUEST);
    }

    // one turn at a time per session
    let _guard = match state.busy.entry(session_id.clone()) {
        Entry::Occupied(_) => {
            warn!(session_id = %session_id, "turn already in flight");
            return Err(StatusCode::CONFLICT);
        }
        Entry::Vacant(vacant) => {
            vacant.insert(());
            TurnGuard {
                busy: state.busy.clone(),
                session_id: session_id.clone(),
            }
        }
    };

    let session = match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            if session_id_provided {
                error!(session_id = %session_id, "session not found");
                return Err(StatusCode::NOT_FOUND);
            }
            info!(session_id = %session_id, "creating new session");
            let mut session = Session::new_from_step(session_id.clone(), step_ids::GREETING);
            session.transcript.push_bot(WELCOME, welcome_quick_replies());
            session
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to get session");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if let Some(user_id) = request.user_id {
        session.context.set(session_keys::USER_ID, user_id);
    }
    if let Err(e) = state.session_storage.save(session).await {
        error!(session_id = %session_id, error = %e, "failed to save session");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let flow = match state.flow_storage.get("default").await {
        Ok(Some(flow)) => flow,
        Ok(None) => {
            error!("default flow not found");
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            error!(error = %e, "failed to get flow");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let runner = FlowRunner::new(flow, state.session_storage.clone())
        .with_typing_delay(state.typing_delay);
    let outcome = match runner.run_turn(&session_id, &request.content).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to execute turn");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let recommendations = runner
        .session_context(&session_id)
        .await
        .ok()
        .and_then(|ctx| ctx.get(session_keys::RECOMMENDATIONS));

    info!(session_id = %session_id, status = ?outcome.status, "turn completed");

    Ok(Json(ChatResponse {
        session_id,
        reply: outcome.reply,
        status: format!("{:?}", outcome.status),
        recommendations,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, StatusCode> {
    match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to get session");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn add_history(
    State(state): State<AppState>,
    Json(request): Json<HistoryRequest>,
) -> Result<StatusCode, StatusCode> {
    state
        .watched
        .add(
            request.user_id,
            WatchRecord::now(request.movie_id, request.rating),
        )
        .await
        .map_err(|e| {
            error!(user_id = request.user_id, error = %e, "failed to record watch history");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(StatusCode::CREATED)
}

async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Json<Vec<WatchRecord>> {
    Json(state.watched.history(user_id).await)
}

async fn onboarding_swipe(
    State(state): State<AppState>,
    Json(request): Json<SwipeRequest>,
) -> Json<PreferenceBuilder> {
    let mut entry = state.onboarding.entry(request.user_id).or_default();
    entry.record_swipe(&request.genre, request.liked);
    Json(entry.clone())
}

async fn onboarding_ott(
    State(state): State<AppState>,
    Json(request): Json<OttRequest>,
) -> Json<PreferenceBuilder> {
    let mut entry = state.onboarding.entry(request.user_id).or_default();
    entry.toggle_ott(&request.platform);
    Json(entry.clone())
}

async fn onboarding_skip(
    State(state): State<AppState>,
    Json(request): Json<SkipRequest>,
) -> Json<PreferenceBuilder> {
    let mut entry = state.onboarding.entry(request.user_id).or_default();
    entry.set_skipped(request.skipped);
    Json(entry.clone())
}

async fn onboarding_reset(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Json<PreferenceBuilder> {
    let mut entry = state.onboarding.entry(request.user_id).or_default();
    entry.reset();
    Json(entry.clone())
}

async fn get_onboarding(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Json<PreferenceBuilder> {
    let snapshot = state
        .onboarding
        .get(&user_id)
        .map(|entry| entry.clone())
        .unwrap_or_default();
    Json(snapshot)
}

async fn onboarding_complete(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> Result<Json<UserProfile>, (StatusCode, Json<serde_json::Value>)> {
    let builder = state
        .onboarding
        .get(&request.user_id)
        .map(|entry| entry.clone())
        .unwrap_or_default();

    match state
        .profiles
        .complete_onboarding(
            request.user_id,
            builder.ott().to_vec(),
            builder.liked_genres().to_vec(),
            builder.vector().to_vec(),
        )
        .await
    {
        Ok(profile) => {
            state.onboarding.remove(&request.user_id);
            info!(user_id = request.user_id, "onboarding completed");
            Ok(Json(profile))
        }
        Err(ProfileError::NotFound(user_id)) => {
            error!(user_id, "onboarding submitted for unknown user");
            Err((
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "User not found" })),
            ))
        }
        Err(e) => {
            error!(user_id = request.user_id, error = %e, "onboarding submission failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to save onboarding data" })),
            ))
        }
    }
}
