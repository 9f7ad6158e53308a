//! 查词引擎集成测试
//!
//! 覆盖缓存命中、规范化、单次请求合并、计数与失败不缓存等行为

use std::sync::Arc;
use std::time::Duration;

use ai_dictionary::lookup::{
    ClearScope, Language, LookupError, LookupStore, OwnerId, ProviderError,
};

mod common {
    include!("common/mod.rs");
}

use common::{user, FailingStore, MockBehavior, MockProvider, TestEnvironment};

/// 首次查询写入清理后的释义，第二次查询命中缓存
#[tokio::test]
async fn test_apple_scenario() {
    let env = TestEnvironment::new(MockProvider::text("A fruit.\n\n\n\nRed or green."));

    let first = env
        .service
        .lookup("  apple ", &OwnerId::Anonymous)
        .await
        .expect("first lookup");
    assert_eq!(first.word, "apple");
    assert_eq!(first.language, Language::English);
    assert_eq!(first.definition, "A fruit.\n\nRed or green.");
    assert_eq!(first.query_count, 1);

    let second = env
        .service
        .lookup("Apple", &OwnerId::Anonymous)
        .await
        .expect("second lookup");
    assert_eq!(second.definition, first.definition);
    assert_eq!(second.query_count, 2);
    assert_eq!(env.provider.calls(), 1, "cache hit must not call the provider");
    assert_eq!(env.store.len(), 1);
}

/// 大小写与空白不同的输入落到同一条记录
#[tokio::test]
async fn test_normalized_inputs_share_one_entry() {
    let env = TestEnvironment::new(MockProvider::echo());

    env.service.lookup("Cat", &OwnerId::Anonymous).await.expect("Cat");
    let outcome = env
        .service
        .lookup(" cat  ", &OwnerId::Anonymous)
        .await
        .expect("cat");

    assert_eq!(outcome.word, "cat");
    assert_eq!(outcome.query_count, 2);
    assert_eq!(env.store.len(), 1);
    assert_eq!(env.provider.requested_words(), vec!["cat".to_string()]);
}

/// 中文查询使用独立的缓存键
#[tokio::test]
async fn test_chinese_word_has_independent_key() {
    let env = TestEnvironment::new(MockProvider::echo());

    env.service.lookup("apple", &OwnerId::Anonymous).await.expect("apple");
    let chinese = env
        .service
        .lookup("蘋果", &OwnerId::Anonymous)
        .await
        .expect("蘋果");

    assert_eq!(chinese.language, Language::Chinese);
    assert_eq!(chinese.word, "蘋果");
    assert_eq!(chinese.query_count, 1);
    assert_eq!(env.provider.calls(), 2);
    assert_eq!(env.store.len(), 2);
}

/// 标点包围的中文仍识别为中文
#[tokio::test]
async fn test_classification_uses_raw_input() {
    let env = TestEnvironment::new(MockProvider::echo());

    let outcome = env
        .service
        .lookup("  「你好」 ", &OwnerId::Anonymous)
        .await
        .expect("lookup");
    assert_eq!(outcome.language, Language::Chinese);
}

/// 超时返回 Timeout 且不留下记录
#[tokio::test]
async fn test_provider_timeout_leaves_no_entry() {
    let env = TestEnvironment::with_timeout(
        MockProvider::new(MockBehavior::Hang),
        Duration::from_millis(50),
    );

    let err = env
        .service
        .lookup("apple", &OwnerId::Anonymous)
        .await
        .expect_err("provider hangs");
    assert!(
        matches!(err, LookupError::Provider(ProviderError::Timeout(limit)) if limit == Duration::from_millis(50)),
        "unexpected error: {:?}",
        err
    );
    assert!(err.is_retryable());

    let recent = env
        .service
        .list_recent(&OwnerId::Anonymous, 10)
        .await
        .expect("list recent");
    assert!(recent.is_empty());
    assert_eq!(env.service.in_flight(), 0);
    println!("✅ timeout surfaced as {}", err);
}

/// 失败不缓存：恢复后重新请求
#[tokio::test]
async fn test_failures_are_not_cached() {
    let env = TestEnvironment::new(MockProvider::new(MockBehavior::Upstream(
        "HTTP 503".to_string(),
    )));
    let key = TestEnvironment::key("apple");

    for behavior in [MockBehavior::Upstream("HTTP 503".to_string()), MockBehavior::Empty] {
        env.provider.set_behavior(behavior);
        let err = env
            .service
            .lookup("apple", &OwnerId::Anonymous)
            .await
            .expect_err("provider fails");
        assert!(matches!(err, LookupError::Provider(_)));
        assert!(env
            .store
            .get(&key, &OwnerId::Anonymous)
            .await
            .expect("get")
            .is_none());
    }

    env.provider
        .set_behavior(MockBehavior::Text("A fruit.".to_string()));
    let outcome = env
        .service
        .lookup("apple", &OwnerId::Anonymous)
        .await
        .expect("provider recovered");
    assert_eq!(outcome.query_count, 1);
    assert_eq!(env.provider.calls(), 3);

    let stats = env.service.stats().snapshot();
    assert_eq!(stats.provider_failures, 2);
    assert_eq!(stats.provider_calls, 3);
}

/// 最近记录按更新时间倒序并受 limit 限制
#[tokio::test]
async fn test_list_recent_returns_latest_five() {
    let env = TestEnvironment::new(MockProvider::echo());
    let owner = user("alice");
    let words = ["one", "two", "three", "four", "five", "six", "seven"];

    for word in words {
        env.service.lookup(word, &owner).await.expect("lookup");
    }

    let recent = env.service.list_recent(&owner, 5).await.expect("list recent");
    let listed: Vec<&str> = recent.iter().map(|entry| entry.word()).collect();
    assert_eq!(listed, vec!["seven", "six", "five", "four", "three"]);
    assert!(recent
        .windows(2)
        .all(|pair| pair[0].updated_at >= pair[1].updated_at));

    // 再次查询会把旧词移到最前
    env.service.lookup("one", &owner).await.expect("lookup again");
    let recent = env.service.list_recent(&owner, 5).await.expect("list recent");
    assert_eq!(recent[0].word(), "one");
    assert_eq!(recent[0].query_count, 2);
}

/// 同一键的并发未命中只请求一次释义服务
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_share_one_provider_call() {
    let env = TestEnvironment::new(
        MockProvider::text("A fruit.").with_delay(Duration::from_millis(100)),
    );
    let concurrency = 16;

    let tasks: Vec<_> = (0..concurrency)
        .map(|_| {
            let service = Arc::clone(&env.service);
            tokio::spawn(async move { service.lookup("apple", &OwnerId::Anonymous).await })
        })
        .collect();

    let mut counts = Vec::new();
    for task in tasks {
        let outcome = task.await.expect("join").expect("lookup");
        assert_eq!(outcome.definition, "A fruit.");
        counts.push(outcome.query_count);
    }

    assert_eq!(env.provider.calls(), 1);
    counts.sort_unstable();
    assert_eq!(counts, (1..=concurrency as u64).collect::<Vec<_>>());

    let entry = env
        .store
        .get(&TestEnvironment::key("apple"), &OwnerId::Anonymous)
        .await
        .expect("get")
        .expect("entry exists");
    assert_eq!(entry.query_count, concurrency as u64);
    assert_eq!(env.service.in_flight(), 0);
}

/// 不同键的请求互不阻塞
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_keys_fetch_in_parallel() {
    let env = TestEnvironment::new(MockProvider::echo().with_delay(Duration::from_millis(200)));
    let started = std::time::Instant::now();

    let words = ["apple", "banana", "cherry", "蘋果"];
    let tasks: Vec<_> = words
        .iter()
        .map(|word| {
            let service = Arc::clone(&env.service);
            let word = word.to_string();
            tokio::spawn(async move { service.lookup(&word, &OwnerId::Anonymous).await })
        })
        .collect();
    for task in tasks {
        task.await.expect("join").expect("lookup");
    }

    assert_eq!(env.provider.calls(), words.len());
    assert!(
        started.elapsed() < Duration::from_millis(700),
        "keys were serialized: {:?}",
        started.elapsed()
    );
}

/// 已有记录上的 N 次并发命中使计数增加 N
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_counter_increases_by_concurrent_hits() {
    let env = TestEnvironment::new(MockProvider::text("A fruit."));
    let owner = user("bob");

    for _ in 0..3 {
        env.service.lookup("apple", &owner).await.expect("warm up");
    }

    let hits = 32;
    let tasks: Vec<_> = (0..hits)
        .map(|_| {
            let service = Arc::clone(&env.service);
            let owner = owner.clone();
            tokio::spawn(async move { service.lookup("APPLE", &owner).await })
        })
        .collect();
    for task in tasks {
        task.await.expect("join").expect("lookup");
    }

    let entry = env
        .store
        .get(&TestEnvironment::key("apple"), &owner)
        .await
        .expect("get")
        .expect("entry");
    assert_eq!(entry.query_count, 3 + hits);
    assert_eq!(env.provider.calls(), 1);
}

/// 中途放弃的调用方不会取消共享的请求
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_caller_does_not_cancel_fetch() {
    let env = TestEnvironment::new(
        MockProvider::text("A fruit.").with_delay(Duration::from_millis(150)),
    );

    let abandoned = {
        let service = Arc::clone(&env.service);
        tokio::spawn(async move { service.lookup("apple", &OwnerId::Anonymous).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let waiter = {
        let service = Arc::clone(&env.service);
        tokio::spawn(async move { service.lookup("apple", &user("carol")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    abandoned.abort();

    let outcome = waiter.await.expect("join").expect("lookup");
    assert_eq!(outcome.definition, "A fruit.");
    assert_eq!(outcome.query_count, 1);
    assert_eq!(env.provider.calls(), 1);
}

/// 历史按所有者隔离，匿名请求共享一个桶
#[tokio::test]
async fn test_owner_isolation() {
    let env = TestEnvironment::new(MockProvider::echo());
    let alice = user("alice");
    let bob = user("bob");

    env.service.lookup("apple", &alice).await.expect("alice apple");
    env.service.lookup("apple", &alice).await.expect("alice apple");
    env.service.lookup("pear", &bob).await.expect("bob pear");
    let bob_apple = env.service.lookup("apple", &bob).await.expect("bob apple");
    env.service.lookup("plum", &OwnerId::Anonymous).await.expect("anon plum");

    assert_eq!(bob_apple.query_count, 1);

    let alice_history = env.service.list_recent(&alice, 10).await.expect("alice");
    assert_eq!(alice_history.len(), 1);
    assert_eq!(alice_history[0].query_count, 2);

    let bob_history = env.service.list_recent(&bob, 10).await.expect("bob");
    assert_eq!(
        bob_history.iter().map(|e| e.word()).collect::<Vec<_>>(),
        vec!["apple", "pear"]
    );

    let anonymous = env
        .service
        .list_recent(&OwnerId::Anonymous, 10)
        .await
        .expect("anonymous");
    assert_eq!(anonymous.len(), 1);
    assert_eq!(anonymous[0].word(), "plum");
}

/// 统计与清理按范围生效
#[tokio::test]
async fn test_stats_and_clear_by_scope() {
    let env = TestEnvironment::new(MockProvider::echo());
    let alice = user("alice");

    env.service.lookup("apple", &alice).await.expect("lookup");
    env.service.lookup("apple", &alice).await.expect("lookup");
    env.service.lookup("蘋果", &alice).await.expect("lookup");
    env.service.lookup("pear", &OwnerId::Anonymous).await.expect("lookup");

    let stats = env
        .service
        .store_stats(&ClearScope::Owner(alice.clone()))
        .await
        .expect("stats");
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.total_queries, 3);
    assert_eq!(stats.entries_by_language.get(&Language::Chinese), Some(&1));

    let removed = env
        .service
        .clear(&ClearScope::Owner(alice.clone()))
        .await
        .expect("clear");
    assert_eq!(removed, 2);

    let all = env.service.list_all(&ClearScope::All).await.expect("list all");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].owner, OwnerId::Anonymous);

    assert_eq!(env.service.clear(&ClearScope::All).await.expect("clear all"), 1);
    assert!(env.store.is_empty());
}

/// 存储不可用时查询失败，不访问释义服务
#[tokio::test]
async fn test_store_outage_fails_closed() {
    let provider = Arc::new(MockProvider::text("A fruit."));
    let service = ai_dictionary::LookupService::new(Arc::new(FailingStore), provider.clone());

    let err = service
        .lookup("apple", &OwnerId::Anonymous)
        .await
        .expect_err("store is down");
    assert!(matches!(err, LookupError::StoreUnavailable(_)), "got {:?}", err);
    assert_eq!(provider.calls(), 0);

    let err = service
        .list_recent(&OwnerId::Anonymous, 5)
        .await
        .expect_err("store is down");
    assert!(matches!(err, LookupError::StoreUnavailable(_)));
    assert_eq!(service.stats().snapshot().store_failures, 2);
}

/// 空白输入在触达存储之前被拒绝
#[tokio::test]
async fn test_blank_input_is_rejected_before_store() {
    let provider = Arc::new(MockProvider::echo());
    let service = ai_dictionary::LookupService::new(Arc::new(FailingStore), provider.clone());

    for input in ["", "   ", "\t\n"] {
        let err = service
            .lookup(input, &OwnerId::Anonymous)
            .await
            .expect_err("blank input");
        assert!(matches!(err, LookupError::InvalidInput(_)));
    }
    assert_eq!(provider.calls(), 0);
    assert_eq!(service.stats().snapshot().store_failures, 0);
}
