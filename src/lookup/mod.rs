//! 查词模块
//!
//! 提供查词缓存与历史引擎，采用清晰的模块化架构：
//! - **language / key**: 语言识别与缓存键规范化
//! - **sanitizer**: 释义文本清理
//! - **provider / prompts**: 释义服务接口与提示词
//! - **store**: 缓存存储（内存、MongoDB）
//! - **flight**: 同键请求合并
//! - **service**: 查询编排与统计
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ai_dictionary::lookup::{ConfigManager, GeminiProvider, LookupService, MemoryStore, OwnerId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::new()?.into_config();
//! let provider = Arc::new(GeminiProvider::from_config(&config.provider)?);
//! let service = LookupService::from_config(&config, Arc::new(MemoryStore::new()), provider);
//!
//! let outcome = service.lookup("apple", &OwnerId::Anonymous).await?;
//! println!("{}: {}", outcome.word, outcome.definition);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod flight;
pub mod key;
pub mod language;
pub mod prompts;
pub mod provider;
pub mod sanitizer;
pub mod service;
pub mod store;

pub use config::{ConfigManager, HistoryConfig, LookupConfig, ProviderConfig};
pub use error::{ErrorCategory, ErrorSeverity, LookupError, LookupResult, ProviderError, StoreError};
pub use flight::{FlightGroup, FlightRole};
pub use key::{LookupKey, OwnerId};
pub use language::{classify, Language};
pub use prompts::PromptStyle;
pub use provider::{DefinitionProvider, GeminiProvider};
pub use sanitizer::{sanitize, SanitizeError};
pub use service::{
    LookupOutcome, LookupService, SanitizeFn, ServiceStats, ServiceStatsSnapshot,
};
#[cfg(feature = "mongo")]
pub use store::mongo::{MongoConfig, MongoStore};
pub use store::{ClearScope, LookupEntry, LookupStore, MemoryStore, StoreStats};
