//! 错误处理集成测试
//!
//! 测试各失败路径返回明确且可区分的错误，且失败后系统保持可用

use std::sync::Arc;
use std::time::Duration;

use ai_dictionary::lookup::{
    ConfigManager, ErrorCategory, ErrorSeverity, GeminiProvider, LookupConfig, LookupError,
    LookupService, OwnerId, ProviderConfig, ProviderError,
};

mod common {
    include!("common/mod.rs");
}

use common::{FailingStore, MockBehavior, MockProvider, TestEnvironment};

/// 每条失败路径的错误类别互不相同
#[tokio::test]
async fn test_failure_paths_are_distinct() {
    let invalid = TestEnvironment::new(MockProvider::echo())
        .service
        .lookup("   ", &OwnerId::Anonymous)
        .await
        .expect_err("blank input");

    let timeout = TestEnvironment::with_timeout(
        MockProvider::new(MockBehavior::Hang),
        Duration::from_millis(20),
    )
    .service
    .lookup("apple", &OwnerId::Anonymous)
    .await
    .expect_err("timeout");

    let upstream = TestEnvironment::new(MockProvider::new(MockBehavior::Upstream(
        "HTTP 500".to_string(),
    )))
    .service
    .lookup("apple", &OwnerId::Anonymous)
    .await
    .expect_err("upstream");

    let store = LookupService::new(Arc::new(FailingStore), Arc::new(MockProvider::echo()))
        .lookup("apple", &OwnerId::Anonymous)
        .await
        .expect_err("store outage");

    let errors = [&invalid, &timeout, &upstream, &store];
    let categories: Vec<ErrorCategory> = errors.iter().map(|e| e.category()).collect();
    assert_eq!(
        categories,
        vec![
            ErrorCategory::Input,
            ErrorCategory::Timeout,
            ErrorCategory::Provider,
            ErrorCategory::Store
        ]
    );

    for (i, a) in errors.iter().enumerate() {
        assert!(!a.to_string().is_empty());
        for b in errors.iter().skip(i + 1) {
            assert_ne!(a.to_string(), b.to_string());
        }
    }

    assert!(!invalid.is_retryable());
    assert!(timeout.is_retryable());
    assert!(upstream.is_retryable());
    assert!(store.is_retryable());
    assert_eq!(invalid.severity(), ErrorSeverity::Info);
    assert_eq!(store.severity(), ErrorSeverity::Error);
    println!("✅ 4 failure paths produced 4 distinct errors");
}

/// 空白释义视为空响应而不是写入空记录
#[tokio::test]
async fn test_whitespace_definition_is_empty_response() {
    let env = TestEnvironment::new(MockProvider::text("  \n\n\t  "));

    let err = env
        .service
        .lookup("apple", &OwnerId::Anonymous)
        .await
        .expect_err("blank definition");
    assert!(matches!(err, LookupError::Provider(ProviderError::EmptyResponse)));
    assert!(env.store.is_empty());
}

/// 合并请求中的失败会分发给所有等待者，之后可以重新请求
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_failure_reaches_every_waiter() {
    let env = TestEnvironment::new(
        MockProvider::new(MockBehavior::Upstream("HTTP 429".to_string()))
            .with_delay(Duration::from_millis(100)),
    );

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&env.service);
            tokio::spawn(async move { service.lookup("apple", &OwnerId::Anonymous).await })
        })
        .collect();

    for task in tasks {
        let err = task.await.expect("join").expect_err("shared failure");
        assert!(
            matches!(&err, LookupError::Provider(ProviderError::UpstreamError(msg)) if msg == "HTTP 429"),
            "unexpected error: {:?}",
            err
        );
    }
    assert_eq!(env.provider.calls(), 1);
    assert!(env.store.is_empty());
    assert_eq!(env.service.in_flight(), 0);

    env.provider
        .set_behavior(MockBehavior::Text("A fruit.".to_string()));
    let outcome = env
        .service
        .lookup("apple", &OwnerId::Anonymous)
        .await
        .expect("retry after failure");
    assert_eq!(outcome.query_count, 1);
    assert_eq!(env.provider.calls(), 2);
}

/// 缺少 API 密钥时无法创建释义服务
#[test]
fn test_missing_api_key_is_config_error() {
    let config = ProviderConfig {
        api_key: None,
        ..ProviderConfig::default()
    };

    match GeminiProvider::from_config(&config) {
        Err(err) => {
            assert_eq!(err.category(), ErrorCategory::Configuration);
            assert!(!err.is_retryable());
        }
        Ok(_) => panic!("provider must not be created without an API key"),
    }
}

/// 无法读取或解析的配置文件返回配置错误
#[test]
fn test_bad_config_files_are_config_errors() {
    let missing = ConfigManager::from_path("/nonexistent/dictionary.toml");
    assert!(matches!(missing, Err(LookupError::ConfigError(_))));

    let dir = std::env::temp_dir().join(format!("ai-dictionary-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");

    let broken = dir.join("broken.toml");
    std::fs::write(&broken, "[provider\nmodel = ").expect("write broken config");
    let broken_path = broken.to_str().expect("utf-8 path");
    match ConfigManager::from_path(broken_path) {
        Err(LookupError::ConfigError(message)) => {
            assert!(message.contains(broken_path), "path missing from: {}", message);
        }
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("broken config must not load"),
    }

    let invalid = dir.join("invalid.json");
    std::fs::write(&invalid, r#"{"provider": {"timeout_secs": 0}}"#).expect("write config");
    let result = ConfigManager::from_path(invalid.to_str().expect("utf-8 path"));
    assert!(matches!(result, Err(LookupError::ConfigError(_))));

    let valid = dir.join("valid.toml");
    ConfigManager::generate_example_config(valid.to_str().expect("utf-8 path"))
        .expect("write example config");
    let manager = ConfigManager::from_path(valid.to_str().expect("utf-8 path"))
        .expect("example config loads");
    assert_eq!(
        manager.get_config().provider.model,
        LookupConfig::default().provider.model
    );

    let _ = std::fs::remove_dir_all(&dir);
}
