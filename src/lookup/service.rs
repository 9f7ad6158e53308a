//! 查词服务
//!
//! 组合语言识别、缓存存储、释义服务与文本清理，对外提供 `lookup` 与历史读取。
//!
//! ## 查询流程
//!
//! 1. 拒绝去除空白后为空的输入
//! 2. 对原始输入识别语言，再规范化为 [`LookupKey`]
//! 3. 缓存命中：以原释义调用 `upsert_hit`，不访问释义服务
//! 4. 未命中：通过 [`FlightGroup`] 保证同一键只有一次释义请求，所有等待者共享结果
//! 5. 成功后清理文本并写入缓存；失败不写入任何记录
//!
//! 每个成功的调用方都恰好计数一次：发起者在获取任务中写入，加入者在拿到结果后各自写入。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::config::{constants, LookupConfig};
use super::error::{helpers, LookupError, LookupResult, ProviderError, StoreError};
use super::flight::{FlightGroup, FlightRole};
use super::key::{LookupKey, OwnerId};
use super::language::Language;
use super::provider::DefinitionProvider;
use super::sanitizer::{self, SanitizeError};
use super::store::{ClearScope, LookupEntry, LookupStore, StoreStats};

/// 一次成功查询的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupOutcome {
    pub word: String,
    pub language: Language,
    pub definition: String,
    pub query_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl From<LookupEntry> for LookupOutcome {
    fn from(entry: LookupEntry) -> Self {
        Self {
            word: entry.key.word().to_string(),
            language: entry.key.language(),
            definition: entry.definition,
            query_count: entry.query_count,
            updated_at: entry.updated_at,
        }
    }
}

/// 一次获取的共享结果
#[derive(Debug, Clone)]
struct FetchOutcome {
    /// 发起者写入后的记录（所有者为发起者）
    leader_entry: LookupEntry,
}

/// 服务统计
///
/// 计数器同时镜像到 `metrics` 门面；未安装 recorder 时镜像为空操作。
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// 收到的查询次数（含无效输入）
    pub lookups: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    /// 实际发往释义服务的请求数
    pub provider_calls: AtomicU64,
    pub provider_failures: AtomicU64,
    /// 加入已有获取而未单独请求的次数
    pub flight_joins: AtomicU64,
    pub sanitize_failures: AtomicU64,
    pub store_failures: AtomicU64,
}

impl ServiceStats {
    fn bump(counter: &AtomicU64, name: &'static str) {
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(name).increment(1);
    }

    pub fn inc_lookups(&self) {
        Self::bump(&self.lookups, "dictionary_lookups_total");
    }

    pub fn inc_cache_hits(&self) {
        Self::bump(&self.cache_hits, "dictionary_cache_hits_total");
    }

    pub fn inc_cache_misses(&self) {
        Self::bump(&self.cache_misses, "dictionary_cache_misses_total");
    }

    pub fn inc_provider_calls(&self) {
        Self::bump(&self.provider_calls, "dictionary_provider_calls_total");
    }

    pub fn inc_provider_failures(&self) {
        Self::bump(&self.provider_failures, "dictionary_provider_failures_total");
    }

    pub fn inc_flight_joins(&self) {
        Self::bump(&self.flight_joins, "dictionary_flight_joins_total");
    }

    pub fn inc_sanitize_failures(&self) {
        Self::bump(&self.sanitize_failures, "dictionary_sanitize_failures_total");
    }

    pub fn inc_store_failures(&self) {
        Self::bump(&self.store_failures, "dictionary_store_failures_total");
    }

    /// 获取统计数据快照
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            flight_joins: self.flight_joins.load(Ordering::Relaxed),
            sanitize_failures: self.sanitize_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// 统计数据快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatsSnapshot {
    pub lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub provider_calls: u64,
    pub provider_failures: u64,
    pub flight_joins: u64,
    pub sanitize_failures: u64,
    pub store_failures: u64,
}

impl ServiceStatsSnapshot {
    /// 缓存命中率（百分比）
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            100.0 * self.cache_hits as f64 / total as f64
        }
    }
}

/// 释义清理函数
pub type SanitizeFn = fn(&str) -> Result<String, SanitizeError>;

fn store_failure(stats: &ServiceStats, error: StoreError) -> LookupError {
    stats.inc_store_failures();
    error!("存储操作失败: {}", error);
    error.into()
}

/// 查词服务
pub struct LookupService {
    store: Arc<dyn LookupStore>,
    provider: Arc<dyn DefinitionProvider>,
    flights: FlightGroup<LookupKey, FetchOutcome>,
    stats: Arc<ServiceStats>,
    provider_timeout: Duration,
    sanitize: SanitizeFn,
}

impl LookupService {
    /// 使用默认超时创建
    pub fn new(store: Arc<dyn LookupStore>, provider: Arc<dyn DefinitionProvider>) -> Self {
        Self {
            store,
            provider,
            flights: FlightGroup::new(),
            stats: Arc::new(ServiceStats::default()),
            provider_timeout: constants::DEFAULT_TIMEOUT,
            sanitize: sanitizer::sanitize,
        }
    }

    /// 根据配置创建
    pub fn from_config(
        config: &LookupConfig,
        store: Arc<dyn LookupStore>,
        provider: Arc<dyn DefinitionProvider>,
    ) -> Self {
        Self::new(store, provider).with_provider_timeout(config.provider.timeout())
    }

    /// 设置释义请求的超时上限
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// 替换释义清理函数；清理失败时写入原始文本
    pub fn with_sanitizer(mut self, sanitize: SanitizeFn) -> Self {
        self.sanitize = sanitize;
        self
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// 当前进行中的释义请求数
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    /// 查询一个词
    pub async fn lookup(&self, raw: &str, owner: &OwnerId) -> LookupResult<LookupOutcome> {
        self.stats.inc_lookups();

        let key = match LookupKey::from_raw(raw) {
            Ok(key) => key,
            Err(e) => return helpers::log_error(e),
        };

        let existing = self
            .store
            .get(&key, owner)
            .await
            .map_err(|e| store_failure(&self.stats, e))?;

        if let Some(entry) = existing {
            self.stats.inc_cache_hits();
            debug!("缓存命中: {} (所有者: {})", key, owner);
            let entry = self
                .store
                .upsert_hit(&key, owner, &entry.definition)
                .await
                .map_err(|e| store_failure(&self.stats, e))?;
            info!("查询完成: {} (第 {} 次)", key, entry.query_count);
            return Ok(entry.into());
        }

        self.stats.inc_cache_misses();
        debug!("缓存未命中: {} (所有者: {})", key, owner);

        let fetch = {
            let store = Arc::clone(&self.store);
            let provider = Arc::clone(&self.provider);
            let stats = Arc::clone(&self.stats);
            let timeout = self.provider_timeout;
            let sanitize = self.sanitize;
            let key = key.clone();
            let owner = owner.clone();
            move || fetch_and_store(store, provider, stats, timeout, sanitize, key, owner)
        };

        let (role, result) = self.flights.run(key.clone(), fetch).await;
        if role == FlightRole::Follower {
            self.stats.inc_flight_joins();
            debug!("加入进行中的请求: {}", key);
        }

        let fetched = result?;
        let entry = match role {
            FlightRole::Leader => fetched.leader_entry,
            FlightRole::Follower => self
                .store
                .upsert_hit(&key, owner, &fetched.leader_entry.definition)
                .await
                .map_err(|e| store_failure(&self.stats, e))?,
        };

        info!("查询完成: {} (第 {} 次)", key, entry.query_count);
        Ok(entry.into())
    }

    /// 最近的查询记录
    ///
    /// 直接读取存储，不会等待任何进行中的释义请求。
    pub async fn list_recent(&self, owner: &OwnerId, limit: usize) -> LookupResult<Vec<LookupEntry>> {
        self.store
            .list_recent(owner, limit)
            .await
            .map_err(|e| store_failure(&self.stats, e))
    }

    /// 范围内的全部记录
    pub async fn list_all(&self, scope: &ClearScope) -> LookupResult<Vec<LookupEntry>> {
        self.store
            .list_all(scope)
            .await
            .map_err(|e| store_failure(&self.stats, e))
    }

    /// 存储统计
    pub async fn store_stats(&self, scope: &ClearScope) -> LookupResult<StoreStats> {
        self.store
            .stats(scope)
            .await
            .map_err(|e| store_failure(&self.stats, e))
    }

    /// 删除记录
    pub async fn clear(&self, scope: &ClearScope) -> LookupResult<u64> {
        let removed = self
            .store
            .clear(scope)
            .await
            .map_err(|e| store_failure(&self.stats, e))?;
        warn!("已清除 {} 条记录 ({:?})", removed, scope);
        Ok(removed)
    }
}

/// 带超时地请求释义；空白内容视为空响应
async fn fetch_raw(
    provider: &dyn DefinitionProvider,
    timeout: Duration,
    key: &LookupKey,
) -> Result<String, ProviderError> {
    match tokio::time::timeout(timeout, provider.fetch_definition(key.word(), key.language())).await
    {
        Ok(Ok(raw)) if sanitizer::is_blank(&raw) => Err(ProviderError::EmptyResponse),
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    }
}

/// 获取任务：在独立任务中运行，不随任一调用方取消
async fn fetch_and_store(
    store: Arc<dyn LookupStore>,
    provider: Arc<dyn DefinitionProvider>,
    stats: Arc<ServiceStats>,
    timeout: Duration,
    sanitize: SanitizeFn,
    key: LookupKey,
    owner: OwnerId,
) -> LookupResult<FetchOutcome> {
    // 上一个获取可能在本次 get 之后、进入本任务之前完成
    let existing = store
        .get(&key, &owner)
        .await
        .map_err(|e| store_failure(&stats, e))?;
    if let Some(entry) = existing {
        debug!("获取前复查命中: {}", key);
        let leader_entry = store
            .upsert_hit(&key, &owner, &entry.definition)
            .await
            .map_err(|e| store_failure(&stats, e))?;
        return Ok(FetchOutcome { leader_entry });
    }

    stats.inc_provider_calls();
    debug!("请求释义: {} (提供方: {})", key, provider.name());

    let raw = match fetch_raw(provider.as_ref(), timeout, &key).await {
        Ok(raw) => raw,
        Err(e) => {
            stats.inc_provider_failures();
            warn!("释义请求失败: {}: {}", key, e);
            return Err(e.into());
        }
    };

    let definition = match sanitize(&raw) {
        Ok(clean) => clean,
        Err(e) => {
            stats.inc_sanitize_failures();
            error!("释义清理失败，使用原始文本: {}: {}", key, e);
            raw
        }
    };

    let leader_entry = store
        .upsert_hit(&key, &owner, &definition)
        .await
        .map_err(|e| store_failure(&stats, e))?;

    Ok(FetchOutcome { leader_entry })
}
