//! 基于 DashMap 的进程内存储

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{recency_order, ClearScope, LookupEntry, LookupStore, StoreStats};
use crate::lookup::error::StoreError;
use crate::lookup::key::{LookupKey, OwnerId};

/// 严格递增的时间源
///
/// 同一微秒内的多次写入也会得到不同的时间戳，保证进程内的最近更新顺序是全序的。
#[derive(Debug, Default)]
struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    fn now(&self) -> Result<DateTime<Utc>, StoreError> {
        let wall = Utc::now().timestamp_micros();
        let previous = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last.saturating_add(1)))
            })
            .unwrap_or(wall);
        let micros = wall.max(previous.saturating_add(1));
        DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| StoreError::Corrupted(format!("时间戳越界: {}", micros)))
    }
}

/// 进程内存储
///
/// 适用于测试和无数据库的单机运行；进程退出后数据丢失。
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<(LookupKey, OwnerId), LookupEntry>,
    clock: MonotonicClock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn collect(&self, scope: &ClearScope) -> Vec<LookupEntry> {
        self.entries
            .iter()
            .filter(|item| scope.matches(&item.key().1))
            .map(|item| item.value().clone())
            .collect()
    }
}

#[async_trait]
impl LookupStore for MemoryStore {
    async fn get(&self, key: &LookupKey, owner: &OwnerId) -> Result<Option<LookupEntry>, StoreError> {
        Ok(self
            .entries
            .get(&(key.clone(), owner.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn upsert_hit(
        &self,
        key: &LookupKey,
        owner: &OwnerId,
        definition: &str,
    ) -> Result<LookupEntry, StoreError> {
        // entry() 在返回前一直持有该分片的写锁，读改写在锁内完成
        match self.entries.entry((key.clone(), owner.clone())) {
            Entry::Occupied(mut occupied) => {
                let now = self.clock.now()?;
                let entry = occupied.get_mut();
                entry.query_count += 1;
                entry.updated_at = now;
                entry.definition = definition.to_string();
                Ok(entry.clone())
            }
            Entry::Vacant(vacant) => {
                let now = self.clock.now()?;
                let entry = LookupEntry {
                    key: key.clone(),
                    owner: owner.clone(),
                    definition: definition.to_string(),
                    query_count: 1,
                    created_at: now,
                    updated_at: now,
                };
                vacant.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn list_recent(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<LookupEntry>, StoreError> {
        let mut entries = self.collect(&ClearScope::Owner(owner.clone()));
        entries.sort_by(recency_order);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn clear(&self, scope: &ClearScope) -> Result<u64, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|(_, owner), _| !scope.matches(owner));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }

    async fn stats(&self, scope: &ClearScope) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats::default();
        for item in self.entries.iter() {
            if scope.matches(&item.key().1) {
                stats.record(item.value().language(), item.value().query_count);
            }
        }
        Ok(stats)
    }

    async fn list_all(&self, scope: &ClearScope) -> Result<Vec<LookupEntry>, StoreError> {
        let mut entries = self.collect(scope);
        entries.sort_by(recency_order);
        Ok(entries)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
