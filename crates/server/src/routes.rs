pub mod promo;
pub mod todos;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

pub use promo::PromoState;
pub use todos::TodoState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Todo API: `/api/todos` and `/api/todos/:id`, plus `/health`.
pub fn build_todo_router(state: TodoState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route(
            "/api/todos",
            get(todos::list_todos)
                .post(todos::create_todo)
                .delete(todos::delete_completed_todos),
        )
        .route(
            "/api/todos/:id",
            axum::routing::put(todos::update_todo)
                .post(todos::toggle_todo)
                .delete(todos::delete_todo),
        )
        .with_state(state);
    with_common_layers(api, cors)
}

/// Promo API: validate, apply and seed, plus `/health`.
pub fn build_promo_router(state: PromoState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/validate/:code", post(promo::validate_code))
        .route("/apply/:code", post(promo::apply_code))
        // `:code` never matches an empty segment
        .route("/validate/", post(promo::missing_code))
        .route("/apply/", post(promo::missing_code))
        .route("/seed-promocodes", post(promo::seed_codes))
        .with_state(state);
    with_common_layers(api, cors)
}

fn with_common_layers(router: Router, cors: CorsLayer) -> Router {
    router.layer(cors).layer(
        TraceLayer::new_for_http()
            // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            // 响应返回时打点，包含状态码与耗时
            .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
            // 失败（5xx 等）时以 ERROR 记录
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}
