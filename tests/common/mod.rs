// 集成测试公共模块
//
// 提供可编排的释义服务替身、故障存储和服务构建辅助

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use ai_dictionary::lookup::{
    ClearScope, DefinitionProvider, Language, LookupEntry, LookupKey, LookupService, LookupStore,
    MemoryStore, OwnerId, ProviderError, StoreError, StoreStats,
};

/// 释义服务替身的行为
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockBehavior {
    /// 返回固定文本
    Text(String),
    /// 返回 `"{word} 的释义"`
    Echo,
    /// 一直挂起，由调用方的超时打断
    Hang,
    /// 上游错误
    Upstream(String),
    /// 空响应
    Empty,
}

/// 记录调用次数的释义服务替身
#[allow(dead_code)]
pub struct MockProvider {
    behavior: Mutex<MockBehavior>,
    delay: Duration,
    calls: AtomicUsize,
    words: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            words: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(MockBehavior::Text(text.to_string()))
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// 每次调用前先等待一段时间，便于制造并发重叠
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().expect("behavior lock") = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 按调用顺序记录的查询词
    pub fn requested_words(&self) -> Vec<String> {
        self.words.lock().expect("words lock").clone()
    }
}

#[async_trait]
impl DefinitionProvider for MockProvider {
    async fn fetch_definition(
        &self,
        word: &str,
        _language: Language,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.words.lock().expect("words lock").push(word.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.behavior.lock().expect("behavior lock").clone();
        match behavior {
            MockBehavior::Text(text) => Ok(text),
            MockBehavior::Echo => Ok(format!("{} 的释义", word)),
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                Err(ProviderError::EmptyResponse)
            }
            MockBehavior::Upstream(message) => Err(ProviderError::UpstreamError(message)),
            MockBehavior::Empty => Err(ProviderError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 所有操作都失败的存储
pub struct FailingStore;

#[async_trait]
impl LookupStore for FailingStore {
    async fn get(&self, _key: &LookupKey, _owner: &OwnerId) -> Result<Option<LookupEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn upsert_hit(
        &self,
        _key: &LookupKey,
        _owner: &OwnerId,
        _definition: &str,
    ) -> Result<LookupEntry, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list_recent(
        &self,
        _owner: &OwnerId,
        _limit: usize,
    ) -> Result<Vec<LookupEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn clear(&self, _scope: &ClearScope) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn stats(&self, _scope: &ClearScope) -> Result<StoreStats, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list_all(&self, _scope: &ClearScope) -> Result<Vec<LookupEntry>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// 测试环境：内存存储 + 释义服务替身
#[allow(dead_code)]
pub struct TestEnvironment {
    pub service: Arc<LookupService>,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<MockProvider>,
}

#[allow(dead_code)]
impl TestEnvironment {
    pub fn new(provider: MockProvider) -> Self {
        Self::with_timeout(provider, Duration::from_secs(5))
    }

    pub fn with_timeout(provider: MockProvider, timeout: Duration) -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);
        let service = LookupService::new(store.clone(), provider.clone())
            .with_provider_timeout(timeout);

        Self {
            service: Arc::new(service),
            store,
            provider,
        }
    }

    pub fn key(raw: &str) -> LookupKey {
        LookupKey::from_raw(raw).expect("valid lookup key")
    }
}

#[allow(dead_code)]
pub fn user(id: &str) -> OwnerId {
    OwnerId::User(id.to_string())
}
