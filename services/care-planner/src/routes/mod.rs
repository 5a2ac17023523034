use axum::{
    routing::{get, post},
    Router,
};

use crate::{app::AppState, handlers::*};

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/analyze", post(analyze_report))
        .route("/plans/render", post(render_plan))
        .nest("/knowledge", knowledge_routes())
}

fn knowledge_routes() -> Router<AppState> {
    Router::new()
        .route("/documents", post(add_document))
        .route("/query", post(query_knowledge))
        .route("/stats", get(knowledge_stats))
}
