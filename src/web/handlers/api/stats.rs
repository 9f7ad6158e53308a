//! 统计API处理器

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;

use crate::lookup::ClearScope;
use crate::web::handlers::Owner;
use crate::web::types::{ApiError, AppState, StatsResponse};

/// 当前所有者的存储统计与服务统计
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
) -> Result<Json<StatsResponse>, ApiError> {
    let store = state
        .service
        .store_stats(&ClearScope::Owner(owner.clone()))
        .await?;

    Ok(Json(StatsResponse {
        owner: owner.to_string(),
        store,
        service: state.service.stats().snapshot(),
    }))
}
