//! HTTP API server

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, CredentialStore, TokenCodec};
use crate::config::Config;
use crate::dataset::DatasetIndex;
use crate::error::Result;
use crate::inference::{InferenceOrchestrator, ProcessModel};
use crate::monitoring::{ProcessReportGenerator, ReportCache};
use crate::upload::UploadValidator;

use super::routes;

/// Application state shared across handlers. Everything is read-only
/// after start-up, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenCodec>,
    pub credentials: Arc<CredentialStore>,
    pub uploads: Arc<UploadValidator>,
    pub inference: Arc<InferenceOrchestrator>,
    pub reports: Arc<ReportCache>,
    pub dataset: Arc<DatasetIndex>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire up the process-backed collaborators described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let tokens = TokenCodec::new(&config.auth.secret, config.auth.token_ttl())?;
        let credentials = CredentialStore::from_records(config.auth.users.clone())?;
        if credentials.is_empty() {
            tracing::warn!("No users configured; every login will be rejected");
        }

        let model = Arc::new(ProcessModel::from_config(&config.model));
        let generator = Arc::new(ProcessReportGenerator::from_config(&config.monitoring));

        Ok(Self {
            tokens: Arc::new(tokens),
            credentials: Arc::new(credentials),
            uploads: Arc::new(UploadValidator::new(&config.server.upload_dir)),
            inference: Arc::new(InferenceOrchestrator::new(model, config.model.timeout())),
            reports: Arc::new(ReportCache::new(&config.monitoring.report_path, generator)),
            dataset: Arc::new(DatasetIndex::scan(&config.dataset.path)?),
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let state = AppState::from_config(&config)?;
    tokio::fs::create_dir_all(state.uploads.root()).await?;

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes.
/// Everything except `/`, `/token` and `/monitoring` sits behind the bearer-token gate.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me/", get(routes::read_users_me))
        .route("/predict/", post(routes::predict))
        .route("/showPredictSegmented/", post(routes::show_predict_segmented))
        .route("/showPredictsByID/", get(routes::show_predicts_by_id))
        .route("/evaluate/", post(routes::evaluate))
        .route("/showdrift/", get(routes::show_drift))
        .route("/samples_list", get(routes::samples_list))
        .route("/case", get(routes::get_case))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.tokens),
            require_auth,
        ));

    Router::new()
        .route("/", post(routes::welcome))
        .route("/token", post(routes::login))
        .route("/monitoring", get(routes::monitoring))
        .merge(protected)
        // Middleware
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
