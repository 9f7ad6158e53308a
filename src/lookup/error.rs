//! 查词模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// 释义提供方错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// 上游请求超时
    #[error("释义服务超时（{}秒）", .0.as_secs_f32())]
    Timeout(Duration),

    /// 上游返回错误或无法解析的响应
    #[error("释义服务错误: {0}")]
    UpstreamError(String),

    /// 上游返回空内容
    #[error("释义服务返回了空内容")]
    EmptyResponse,
}

/// 存储层错误
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// 存储不可用（连接、I/O 等）
    #[error("存储不可用: {0}")]
    Unavailable(String),

    /// 存储返回了无法识别的数据
    #[error("存储数据损坏: {0}")]
    Corrupted(String),
}

/// 查词错误类型
#[derive(Error, Debug, Clone)]
pub enum LookupError {
    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 释义提供方错误
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// 存储不可用
    #[error("存储服务不可用: {0}")]
    StoreUnavailable(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl LookupError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            LookupError::Provider(_) => true,
            LookupError::StoreUnavailable(_) => true,
            LookupError::InvalidInput(_) => false,
            LookupError::ConfigError(_) => false,
            LookupError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LookupError::InvalidInput(_) => ErrorSeverity::Info,
            LookupError::Provider(_) => ErrorSeverity::Warning,
            LookupError::StoreUnavailable(_) => ErrorSeverity::Error,
            LookupError::ConfigError(_) => ErrorSeverity::Critical,
            LookupError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            LookupError::InvalidInput(_) => ErrorCategory::Input,
            LookupError::Provider(ProviderError::Timeout(_)) => ErrorCategory::Timeout,
            LookupError::Provider(_) => ErrorCategory::Provider,
            LookupError::StoreUnavailable(_) => ErrorCategory::Store,
            LookupError::ConfigError(_) => ErrorCategory::Configuration,
            LookupError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let new_msg = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            LookupError::InvalidInput(msg) => LookupError::InvalidInput(new_msg(msg)),
            LookupError::StoreUnavailable(msg) => LookupError::StoreUnavailable(new_msg(msg)),
            LookupError::ConfigError(msg) => LookupError::ConfigError(new_msg(msg)),
            LookupError::InternalError(msg) => LookupError::InternalError(new_msg(msg)),
            // 提供方错误保持原样，调用方需要按类型区分超时与上游错误
            provider @ LookupError::Provider(_) => provider,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Input,
    Provider,
    Timeout,
    Store,
    Configuration,
    Internal,
}

impl ErrorCategory {
    /// 对外暴露的类别名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Input => "invalid_input",
            ErrorCategory::Provider => "provider_error",
            ErrorCategory::Timeout => "provider_timeout",
            ErrorCategory::Store => "store_unavailable",
            ErrorCategory::Configuration => "config_error",
            ErrorCategory::Internal => "internal_error",
        }
    }
}

impl From<StoreError> for LookupError {
    fn from(error: StoreError) -> Self {
        LookupError::StoreUnavailable(error.to_string())
    }
}

impl From<std::io::Error> for LookupError {
    fn from(error: std::io::Error) -> Self {
        LookupError::InternalError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(error: serde_json::Error) -> Self {
        LookupError::ConfigError(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for LookupError {
    fn from(error: toml::de::Error) -> Self {
        LookupError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<crate::env::EnvError> for LookupError {
    fn from(error: crate::env::EnvError) -> Self {
        LookupError::ConfigError(error.to_string())
    }
}

/// 错误结果类型别名
pub type LookupResult<T> = Result<T, LookupError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 记录并返回错误
    pub fn log_error<T>(error: LookupError) -> LookupResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("查词信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("查词警告: {}", error),
            ErrorSeverity::Error => tracing::error!("查词错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("查词严重错误: {}", error),
        }

        Err(error)
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> LookupError {
        LookupError::InvalidInput(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> LookupError {
        LookupError::ConfigError(msg.to_string())
    }

    /// 创建内部错误
    pub fn internal_error<T: fmt::Display>(msg: T) -> LookupError {
        LookupError::InternalError(msg.to_string())
    }
}
