//! # AI Dictionary Library
//!
//! 中英双语查词服务：新查询转发给外部 AI 释义服务，结果缓存并记录查询次数。
//!
//! ## 模块组织
//!
//! - `env` - 类型安全的环境变量
//! - `lookup` - 查词缓存与历史引擎
//! - `web` - Web服务器功能（可选）

pub mod env;
pub mod lookup;
#[cfg(feature = "web")]
pub mod web;

pub use lookup::{LookupError, LookupResult, LookupService, OwnerId};
