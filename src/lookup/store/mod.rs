//! 查词缓存存储
//!
//! 存储层负责条目生命周期与并发更新语义。唯一写入路径是 [`LookupStore::upsert_hit`]，
//! 它对同一 `(LookupKey, OwnerId)` 必须是原子的：并发调用既不能丢失计数，也不能产生重复条目。

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::key::{LookupKey, OwnerId};
use super::language::Language;

pub mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;

pub use memory::MemoryStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

/// 一条缓存的查词记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub key: LookupKey,
    pub owner: OwnerId,
    /// 清理后的释义，刷新时整体替换
    pub definition: String,
    /// 查询次数，创建时为 1
    pub query_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LookupEntry {
    pub fn word(&self) -> &str {
        self.key.word()
    }

    pub fn language(&self) -> Language {
        self.key.language()
    }

    /// 释义预览
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.definition, max_chars)
    }
}

/// 截取文本预览，超长时在字符边界截断并追加 `...`
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// 管理操作的作用范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearScope {
    /// 全部所有者
    All,
    /// 单个所有者（含匿名桶）
    Owner(OwnerId),
}

impl ClearScope {
    pub fn matches(&self, owner: &OwnerId) -> bool {
        match self {
            ClearScope::All => true,
            ClearScope::Owner(scope) => scope == owner,
        }
    }
}

/// 存储统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// 条目总数
    pub total_entries: u64,
    /// 各语言条目数
    pub entries_by_language: BTreeMap<Language, u64>,
    /// 所有条目查询次数之和
    pub total_queries: u64,
}

impl StoreStats {
    /// 累加一条记录
    pub fn record(&mut self, language: Language, query_count: u64) {
        self.total_entries += 1;
        *self.entries_by_language.entry(language).or_insert(0) += 1;
        self.total_queries += query_count;
    }
}

/// 按最近更新排序：`updated_at` 降序，再按 `query_count` 降序，最后按键升序
pub fn recency_order(a: &LookupEntry, b: &LookupEntry) -> std::cmp::Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| b.query_count.cmp(&a.query_count))
        .then_with(|| a.key.cmp(&b.key))
}

/// 查词缓存存储接口
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// 读取条目，不等待任何进行中的获取
    async fn get(&self, key: &LookupKey, owner: &OwnerId) -> Result<Option<LookupEntry>, StoreError>;

    /// 原子地记录一次命中
    ///
    /// 已存在时计数加一、刷新 `updated_at` 并以 `definition` 替换旧释义；
    /// 不存在时以计数 1 创建。
    async fn upsert_hit(
        &self,
        key: &LookupKey,
        owner: &OwnerId,
        definition: &str,
    ) -> Result<LookupEntry, StoreError>;

    /// 某个所有者最近的记录
    async fn list_recent(&self, owner: &OwnerId, limit: usize)
        -> Result<Vec<LookupEntry>, StoreError>;

    /// 删除记录，返回删除的条数
    async fn clear(&self, scope: &ClearScope) -> Result<u64, StoreError>;

    /// 统计信息
    async fn stats(&self, scope: &ClearScope) -> Result<StoreStats, StoreError>;

    /// 按最近更新顺序列出范围内的全部记录
    async fn list_all(&self, scope: &ClearScope) -> Result<Vec<LookupEntry>, StoreError>;

    /// 存储名称，用于日志
    fn name(&self) -> &str;
}
