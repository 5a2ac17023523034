use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method, StatusCode},
    response::Json,
    routing::get,
    BoxError, Router,
};
use careplan_knowledge::{InMemoryKnowledgeStore, KnowledgeStore};
use careplan_utils::{AppConfig, CarePlanResult, ErrorResponse};
use std::sync::Arc;
use std::time::Duration;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{health_check, metrics_handler};
use crate::llm_client::{generator_from_config, TextGenerator};
use crate::metrics::Metrics;
use crate::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use crate::pipeline::ReportPipeline;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReportPipeline>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub metrics: Metrics,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> CarePlanResult<Self> {
        Self::with_generator(config, generator_from_config(&config.llm)?)
    }

    /// State with an explicit text generator.
    pub fn with_generator(config: &AppConfig, generator: Arc<dyn TextGenerator>) -> CarePlanResult<Self> {
        let mut store = InMemoryKnowledgeStore::new();
        if let Some(max_documents) = config.knowledge.max_documents {
            store = store.with_capacity_limit(max_documents);
        }
        let knowledge: Arc<dyn KnowledgeStore> = Arc::new(store);

        let metrics = Metrics::new(&config.monitoring.prometheus_namespace)?;
        let pipeline = ReportPipeline::new(config, knowledge.clone(), generator, metrics.clone())?;

        Ok(Self {
            pipeline: Arc::new(pipeline),
            knowledge,
            metrics,
            config: Arc::new(config.clone()),
        })
    }
}

pub fn create_app(config: &AppConfig) -> CarePlanResult<Router> {
    Ok(build_router(AppState::from_config(config)?))
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", routes::create_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout_seconds)))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)]),
                )
                .layer(DefaultBodyLimit::max(config.server.max_request_size))
                .layer(axum::middleware::from_fn(request_id_middleware)),
        )
        .with_state(state)
}

async fn handle_middleware_error(error: BoxError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code, message) = if error.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT", "Request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            format!("Unhandled middleware error: {}", error),
        )
    };

    (
        status,
        Json(ErrorResponse {
            error: message.clone(),
            code: code.to_string(),
            message,
            details: None,
        }),
    )
}
