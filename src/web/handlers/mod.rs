//! Web 路由处理器

pub mod api;
pub mod owner;

pub use api::*;
pub use owner::Owner;

use axum::response::{IntoResponse, Json};
use serde_json::json;

/// 健康检查
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
