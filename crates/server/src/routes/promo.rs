use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service::promo::{PromoCode, PromoService, RandomSource};

use crate::errors::JsonApiError;

#[derive(Clone)]
pub struct PromoState {
    pub promos: PromoService,
    pub rng: Arc<dyn RandomSource>,
    /// How many codes `POST /seed-promocodes` generates.
    pub seed_count: usize,
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "Bad Request").into_response()
}

fn status_for(valid: bool) -> StatusCode {
    if valid { StatusCode::OK } else { StatusCode::BAD_REQUEST }
}

pub async fn missing_code() -> Response {
    bad_request()
}

/// 校验优惠码（只读）
pub async fn validate_code(
    State(state): State<PromoState>,
    Path(code): Path<String>,
) -> Result<Response, JsonApiError> {
    if code.trim().is_empty() {
        return Ok(bad_request());
    }
    let res = state
        .promos
        .validate(&code)
        .await
        .map_err(|e| JsonApiError::from_service("POST /validate/:code", e))?;
    Ok((status_for(res.valid), Json(res)).into_response())
}

/// 使用优惠码；成功后该码标记为已使用
pub async fn apply_code(
    State(state): State<PromoState>,
    Path(code): Path<String>,
) -> Result<Response, JsonApiError> {
    if code.trim().is_empty() {
        return Ok(bad_request());
    }
    let res = state
        .promos
        .apply(&code)
        .await
        .map_err(|e| JsonApiError::from_service("POST /apply/:code", e))?;
    Ok((status_for(res.valid), Json(res)).into_response())
}

pub async fn seed_codes(
    State(state): State<PromoState>,
) -> Result<(StatusCode, Json<Vec<PromoCode>>), JsonApiError> {
    let codes = state
        .promos
        .seed(state.seed_count, state.rng.as_ref())
        .await
        .map_err(|e| JsonApiError::from_service("POST /seed-promocodes", e))?;
    Ok((StatusCode::CREATED, Json(codes)))
}
