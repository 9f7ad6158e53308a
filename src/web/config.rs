//! Web 服务器配置
//!
//! 使用类型安全的环境变量系统进行配置管理

use crate::env::{EnvError, EnvResult, EnvVar};
use crate::lookup::MongoConfig;

/// Web 服务器配置
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
    /// 认证代理写入所有者标识的请求头（小写）
    pub owner_header: String,
    /// MongoDB 配置
    pub mongo_config: MongoConfig,
}

impl WebConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::web;

        Ok(Self {
            bind_addr: web::BindAddress::get()?,
            port: web::Port::get()?,
            owner_header: web::OwnerHeader::get()?,
            mongo_config: MongoConfig::from_env()?,
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.bind_addr.is_empty() {
            return Err(EnvError {
                variable: "DICT_WEB_BIND_ADDRESS".to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: "DICT_WEB_PORT".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        self.mongo_config.validate()
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!("Failed to load web config from environment: {}. Using defaults.", e);
            Self {
                bind_addr: crate::env::web::DEFAULT_BIND_ADDRESS.to_string(),
                port: 3217,
                owner_header: crate::env::web::DEFAULT_OWNER_HEADER.to_string(),
                mongo_config: MongoConfig {
                    connection_string: crate::env::mongodb::DEFAULT_CONNECTION_STRING.to_string(),
                    database_name: crate::env::mongodb::DEFAULT_DATABASE.to_string(),
                    collection_name: crate::env::mongodb::DEFAULT_COLLECTION.to_string(),
                },
            }
        })
    }
}
