//! 请求所有者提取
//!
//! 认证由外部代理完成，代理把已认证用户的标识写入配置的请求头；
//! 没有该请求头（或为空）的请求归入匿名桶。

use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::lookup::OwnerId;
use crate::web::types::AppState;

/// 当前请求的所有者
#[derive(Debug, Clone)]
pub struct Owner(pub OwnerId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Owner {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(state.owner_header.as_str())
            .and_then(|value| value.to_str().ok());
        Ok(Owner(OwnerId::from_optional(id)))
    }
}
