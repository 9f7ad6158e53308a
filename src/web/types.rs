//! Web 模块的数据类型定义

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::lookup::{
    HistoryConfig, Language, LookupEntry, LookupError, LookupOutcome, LookupService,
    ServiceStatsSnapshot, StoreStats,
};

/// 历史记录中时间的显示格式
pub const UPDATED_ON_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 应用状态
pub struct AppState {
    pub service: LookupService,
    /// 携带所有者标识的请求头（小写）
    pub owner_header: String,
    pub history: HistoryConfig,
}

/// 查词请求
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub word: String,
}

/// 查词响应
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub word: String,
    pub language: Language,
    pub definition: String,
    pub query_times: u64,
}

impl From<LookupOutcome> for LookupResponse {
    fn from(outcome: LookupOutcome) -> Self {
        Self {
            word: outcome.word,
            language: outcome.language,
            definition: outcome.definition,
            query_times: outcome.query_count,
        }
    }
}

/// 历史查询参数
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

/// 历史记录条目
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub word: String,
    pub language: Language,
    pub query_times: u64,
    pub updated_on: String,
    pub definition: String,
}

impl HistoryItem {
    pub fn from_entry(entry: &LookupEntry, preview_chars: usize) -> Self {
        Self {
            word: entry.word().to_string(),
            language: entry.language(),
            query_times: entry.query_count,
            updated_on: entry.updated_at.format(UPDATED_ON_FORMAT).to_string(),
            definition: entry.preview(preview_chars),
        }
    }
}

/// 历史响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryItem>,
}

/// 统计响应
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub owner: String,
    pub store: StoreStats,
    pub service: ServiceStatsSnapshot,
}

/// API 错误
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub kind: &'static str,
    pub retryable: bool,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            kind: "invalid_input",
            retryable: false,
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(error: LookupError) -> Self {
        use crate::lookup::ErrorCategory;

        let category = error.category();
        let status = match category {
            ErrorCategory::Input => StatusCode::BAD_REQUEST,
            ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCategory::Provider => StatusCode::BAD_GATEWAY,
            ErrorCategory::Store => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::Configuration | ErrorCategory::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            message: error.to_string(),
            kind: category.as_str(),
            retryable: error.is_retryable(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.message,
            "kind": self.kind,
            "retryable": self.retryable,
        });
        (self.status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::lookup::ProviderError;

    #[test]
    fn test_error_status_mapping() {
        let timeout = ApiError::from(LookupError::Provider(ProviderError::Timeout(
            Duration::from_secs(30),
        )));
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.kind, "provider_timeout");
        assert!(timeout.retryable);

        let upstream = ApiError::from(LookupError::Provider(ProviderError::EmptyResponse));
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);

        let store = ApiError::from(LookupError::StoreUnavailable("down".to_string()));
        assert_eq!(store.status, StatusCode::SERVICE_UNAVAILABLE);

        let input = ApiError::from(LookupError::InvalidInput("empty".to_string()));
        assert_eq!(input.status, StatusCode::BAD_REQUEST);
        assert!(!input.retryable);
    }
}
