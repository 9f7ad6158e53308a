//! 历史记录API处理器

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Json;

use crate::lookup::config::constants::MAX_HISTORY_LIMIT;
use crate::web::handlers::Owner;
use crate::web::types::{ApiError, AppState, HistoryItem, HistoryParams, HistoryResponse};

/// 最近的查询记录
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let limit = params
        .limit
        .unwrap_or(state.history.limit)
        .clamp(1, MAX_HISTORY_LIMIT);

    let entries = state.service.list_recent(&owner, limit).await?;
    let history = entries
        .iter()
        .map(|entry| HistoryItem::from_entry(entry, state.history.preview_chars))
        .collect();

    Ok(Json(HistoryResponse { history }))
}
