//! MongoDB 持久化存储
//!
//! 每条记录是一个 `word_records` 文档，`(word, language, owner_id)` 上有唯一索引。
//! 命中计数通过单次 `findOneAndUpdate`（upsert）完成，由数据库保证原子性。

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};

use super::{ClearScope, LookupEntry, LookupStore, StoreStats};
use crate::env::{EnvError, EnvResult, EnvVar};
use crate::lookup::error::StoreError;
use crate::lookup::key::{LookupKey, OwnerId};
use crate::lookup::language::Language;

/// MongoDB 重复键错误码
const DUPLICATE_KEY: i32 = 11000;

/// 唯一索引名称
const UNIQUE_INDEX_NAME: &str = "word_language_owner_unique";

/// MongoDB 配置
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// MongoDB 连接字符串
    pub connection_string: String,
    /// 数据库名称
    pub database_name: String,
    /// 集合名称
    pub collection_name: String,
}

impl MongoConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::mongodb;

        Ok(Self {
            connection_string: mongodb::ConnectionString::get()?,
            database_name: mongodb::DatabaseName::get()?,
            collection_name: mongodb::CollectionName::get()?,
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        let required = [
            ("MONGODB_URL", &self.connection_string, "Connection string"),
            ("MONGODB_DATABASE", &self.database_name, "Database name"),
            ("MONGODB_COLLECTION", &self.collection_name, "Collection name"),
        ];
        for (variable, value, label) in required {
            if value.trim().is_empty() {
                return Err(EnvError {
                    variable: variable.to_string(),
                    message: format!("{} cannot be empty", label),
                });
            }
        }
        Ok(())
    }
}

/// 集合中的文档结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<bson::oid::ObjectId>,
    pub word: String,
    pub language: Language,
    /// `null` 表示匿名
    #[serde(default)]
    pub owner_id: Option<String>,
    pub definition: String,
    pub query_times: i64,
    pub created_on: bson::DateTime,
    pub updated_on: bson::DateTime,
}

impl TryFrom<WordRecord> for LookupEntry {
    type Error = StoreError;

    fn try_from(record: WordRecord) -> Result<Self, Self::Error> {
        let query_count = u64::try_from(record.query_times)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or_else(|| {
                StoreError::Corrupted(format!(
                    "'{}' 的查询次数无效: {}",
                    record.word, record.query_times
                ))
            })?;

        Ok(LookupEntry {
            key: LookupKey::from_parts(record.word, record.language),
            owner: OwnerId::from_optional(record.owner_id.as_deref()),
            definition: record.definition,
            query_count,
            created_at: record.created_on.to_chrono(),
            updated_at: record.updated_on.to_chrono(),
        })
    }
}

fn unavailable(context: &str, error: mongodb::error::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", context, error))
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY,
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn entry_filter(key: &LookupKey, owner: &OwnerId) -> Document {
    doc! {
        "word": key.word(),
        "language": key.language().as_str(),
        "owner_id": owner.as_option(),
    }
}

fn scope_filter(scope: &ClearScope) -> Document {
    match scope {
        ClearScope::All => doc! {},
        ClearScope::Owner(owner) => doc! { "owner_id": owner.as_option() },
    }
}

fn bson_to_u64(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}

/// 基于 MongoDB 的查词存储
pub struct MongoStore {
    collection: Collection<WordRecord>,
}

impl MongoStore {
    /// 连接数据库并确保唯一索引存在
    pub async fn connect(config: &MongoConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.connection_string)
            .await
            .map_err(|e| unavailable("连接 MongoDB 失败", e))?;

        let db = client.database(&config.database_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| unavailable("MongoDB 无响应", e))?;

        let store = Self {
            collection: db.collection::<WordRecord>(&config.collection_name),
        };
        store.ensure_indexes().await?;

        tracing::info!(
            "MongoDB 存储已就绪: {}/{}",
            config.database_name,
            config.collection_name
        );
        Ok(store)
    }

    /// 创建 `(word, language, owner_id)` 唯一索引
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "word": 1, "language": 1, "owner_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(UNIQUE_INDEX_NAME.to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| unavailable("创建唯一索引失败", e))?;
        Ok(())
    }

    async fn find_one_and_increment(
        &self,
        key: &LookupKey,
        owner: &OwnerId,
        definition: &str,
    ) -> Result<Option<WordRecord>, mongodb::error::Error> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let update = doc! {
            "$inc": { "query_times": 1_i64 },
            "$set": { "definition": definition, "updated_on": now },
            "$setOnInsert": { "created_on": now },
        };

        self.collection
            .find_one_and_update(entry_filter(key, owner), update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
    }

    async fn find_sorted(
        &self,
        filter: Document,
        limit: Option<usize>,
    ) -> Result<Vec<LookupEntry>, StoreError> {
        let mut find = self
            .collection
            .find(filter)
            .sort(doc! { "updated_on": -1, "query_times": -1, "word": 1, "language": 1 });
        if let Some(limit) = limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let mut cursor = find.await.map_err(|e| unavailable("查询记录失败", e))?;

        let mut entries = Vec::new();
        while let Some(record) = cursor
            .try_next()
            .await
            .map_err(|e| unavailable("读取结果失败", e))?
        {
            entries.push(LookupEntry::try_from(record)?);
        }
        Ok(entries)
    }
}

#[async_trait]
impl LookupStore for MongoStore {
    async fn get(&self, key: &LookupKey, owner: &OwnerId) -> Result<Option<LookupEntry>, StoreError> {
        let record = self
            .collection
            .find_one(entry_filter(key, owner))
            .await
            .map_err(|e| unavailable("读取记录失败", e))?;

        record.map(LookupEntry::try_from).transpose()
    }

    async fn upsert_hit(
        &self,
        key: &LookupKey,
        owner: &OwnerId,
        definition: &str,
    ) -> Result<LookupEntry, StoreError> {
        // 两个并发 upsert 可能同时尝试插入；失败的一方重试时会匹配到已存在的文档
        let record = match self.find_one_and_increment(key, owner, definition).await {
            Err(e) if is_duplicate_key(&e) => {
                tracing::debug!("upsert 遇到重复键，重试: {}", key);
                self.find_one_and_increment(key, owner, definition).await
            }
            other => other,
        }
        .map_err(|e| unavailable("更新记录失败", e))?;

        let record = record.ok_or_else(|| {
            StoreError::Corrupted(format!("upsert 未返回文档: {}", key))
        })?;
        LookupEntry::try_from(record)
    }

    async fn list_recent(
        &self,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<LookupEntry>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.find_sorted(scope_filter(&ClearScope::Owner(owner.clone())), Some(limit))
            .await
    }

    async fn clear(&self, scope: &ClearScope) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_many(scope_filter(scope))
            .await
            .map_err(|e| unavailable("删除记录失败", e))?;

        tracing::info!("已删除 {} 条记录", result.deleted_count);
        Ok(result.deleted_count)
    }

    async fn stats(&self, scope: &ClearScope) -> Result<StoreStats, StoreError> {
        let pipeline = vec![
            doc! { "$match": scope_filter(scope) },
            doc! {
                "$group": {
                    "_id": "$language",
                    "entries": { "$sum": 1 },
                    "queries": { "$sum": "$query_times" },
                }
            },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| unavailable("统计记录失败", e))?;

        let mut stats = StoreStats::default();
        while let Some(group) = cursor
            .try_next()
            .await
            .map_err(|e| unavailable("读取统计结果失败", e))?
        {
            let language: Language = group
                .get_str("_id")
                .map_err(|e| StoreError::Corrupted(format!("统计结果缺少语言: {}", e)))?
                .parse()
                .map_err(StoreError::Corrupted)?;
            let entries = bson_to_u64(group.get("entries"));
            let queries = bson_to_u64(group.get("queries"));

            stats.total_entries += entries;
            *stats.entries_by_language.entry(language).or_insert(0) += entries;
            stats.total_queries += queries;
        }
        Ok(stats)
    }

    async fn list_all(&self, scope: &ClearScope) -> Result<Vec<LookupEntry>, StoreError> {
        self.find_sorted(scope_filter(scope), None).await
    }

    fn name(&self) -> &str {
        "mongodb"
    }
}
