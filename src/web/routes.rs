//! Web 路由定义

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers::*;
use crate::web::types::AppState;

/// 创建路由结构
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/lookup", post(lookup_word))
        .route("/history", get(get_history))
        .route("/api/stats", get(get_stats))
        .route("/health", get(health))
}
