//! Web 服务器模块
//!
//! 为查词引擎提供最小 HTTP 接口：查词、历史、统计与健康检查。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use routes::*;
pub use types::*;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::lookup::error::helpers;
use crate::lookup::{
    GeminiProvider, LookupConfig, LookupResult, LookupService, LookupStore,
    MemoryStore, MongoStore,
};

/// 存储后端选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// MongoDB（持久化）
    Mongo,
    /// 进程内存储，重启后丢失
    Memory,
}

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    lookup_config: LookupConfig,
    backend: StoreBackend,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig, lookup_config: LookupConfig) -> Self {
        Self {
            config,
            lookup_config,
            backend: StoreBackend::Mongo,
        }
    }

    pub fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    async fn connect_store(&self) -> LookupResult<Arc<dyn LookupStore>> {
        match self.backend {
            StoreBackend::Mongo => {
                let store = MongoStore::connect(&self.config.mongo_config).await?;
                Ok(Arc::new(store))
            }
            StoreBackend::Memory => {
                tracing::warn!("使用进程内存储，重启后数据将丢失");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// 启动 Web 服务器，收到 Ctrl-C 或 SIGTERM 后优雅退出
    pub async fn start(&self) -> LookupResult<()> {
        let store = self.connect_store().await?;
        tracing::info!("存储后端: {}", store.name());
        let provider = Arc::new(GeminiProvider::from_config(&self.lookup_config.provider)?);
        tracing::info!(
            "释义服务: {} ({})",
            self.lookup_config.provider.model,
            self.lookup_config.provider.api_url
        );

        let app_state = Arc::new(AppState {
            service: LookupService::from_config(&self.lookup_config, store, provider),
            owner_header: self.config.owner_header.clone(),
            history: self.lookup_config.history.clone(),
        });

        let app = create_router(app_state);

        let address = self.config.listen_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| helpers::config_error(format!("无法绑定 {}: {}", address, e)))?;

        tracing::info!("Web server starting at http://{}", address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| helpers::internal_error(format!("Server error: {}", e)))?;

        tracing::info!("Web server exited");
        Ok(())
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_routes()
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("收到退出信号，正在关闭");
}
