//! 查词API处理器

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;

use crate::web::handlers::Owner;
use crate::web::types::{ApiError, AppState, LookupRequest, LookupResponse};

/// 查询一个词
pub async fn lookup_word(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    payload: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<LookupResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let outcome = state.service.lookup(&request.word, &owner).await?;
    Ok(Json(outcome.into()))
}
