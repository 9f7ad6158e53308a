//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量管理。每个变量是一个实现了 [`EnvVar`] 的单元结构体，
//! 按用途分组在子模块中。

use std::env;
use std::fmt;
use std::time::Duration;

use crate::lookup::prompts::PromptStyle;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 读取失败时使用给定值
    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 只读取显式设置的值，未设置时返回 `None`
    fn get_explicit() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// 文档中展示的默认值
    fn default_doc() -> String
    where
        T: fmt::Debug,
    {
        match Self::DEFAULT {
            Some(default) => format!("{:?}", default),
            None => "required".to_string(),
        }
    }
}

/// 字符串变量的默认值在 `get` 中给出（`String` 不能作为常量）
fn string_or(name: &str, fallback: &str, parse: fn(&str) -> EnvResult<String>) -> EnvResult<String> {
    match env::var(name) {
        Ok(value) => parse(&value),
        Err(_) => Ok(fallback.to_string()),
    }
}

fn non_empty(value: &str, var_name: &str, label: &str) -> EnvResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("{} cannot be empty", label),
        });
    }
    Ok(value.to_string())
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    pub const DEFAULT_MODE: &str = "production";
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// 应用运行模式
    pub struct Mode;
    impl EnvVar<String> for Mode {
        const NAME: &'static str = "DICT_MODE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Application mode: development, staging, production";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_MODE, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_MODE)
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                "development" | "dev" => Ok("development".to_string()),
                "staging" | "stage" => Ok("staging".to_string()),
                "production" | "prod" => Ok("production".to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid mode '{}'. Use: development, staging, production",
                        value
                    ),
                }),
            }
        }
    }

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "DICT_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str =
            "Log level when RUST_LOG is unset: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_LOG_LEVEL, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_LOG_LEVEL)
        }

        fn parse(value: &str) -> EnvResult<String> {
            let level = value.trim().to_lowercase();
            match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(level),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用彩色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored log output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何非空值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 释义服务相关环境变量
pub mod provider {
    use super::*;

    pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

    /// API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "GEMINI_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "API key of the definition provider";

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "API key")
        }
    }

    /// API 地址
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "DICT_PROVIDER_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Base URL of the generateContent API";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_API_URL, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_API_URL)
        }

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 模型名称
    pub struct Model;
    impl EnvVar<String> for Model {
        const NAME: &'static str = "DICT_PROVIDER_MODEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Model used for definitions";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_MODEL, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_MODEL)
        }

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "Model name")
        }
    }

    /// 请求超时
    pub struct Timeout;
    impl EnvVar<Duration> for Timeout {
        const NAME: &'static str = "DICT_PROVIDER_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Provider request timeout in seconds (1-300)";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_positive_usize(value, Self::NAME, 1, 300)?;
            Ok(Duration::from_secs(seconds as u64))
        }
    }

    /// 提示词风格
    pub struct Style;
    impl EnvVar<PromptStyle> for Style {
        const NAME: &'static str = "DICT_PROMPT_STYLE";
        const DEFAULT: Option<PromptStyle> = Some(PromptStyle::Detailed);
        const DESCRIPTION: &'static str = "Prompt style: standard, detailed";

        fn parse(value: &str) -> EnvResult<PromptStyle> {
            value.parse().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }
}

/// 历史记录相关环境变量
pub mod history {
    use super::*;

    /// 默认返回条数
    pub struct Limit;
    impl EnvVar<usize> for Limit {
        const NAME: &'static str = "DICT_HISTORY_LIMIT";
        const DEFAULT: Option<usize> = Some(20);
        const DESCRIPTION: &'static str = "Default number of history entries (1-500)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 500)
        }
    }

    /// 释义预览长度
    pub struct PreviewChars;
    impl EnvVar<usize> for PreviewChars {
        const NAME: &'static str = "DICT_HISTORY_PREVIEW_CHARS";
        const DEFAULT: Option<usize> = Some(200);
        const DESCRIPTION: &'static str =
            "Characters of each definition shown in history (10-10000)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 10, 10000)
        }
    }
}

/// Web服务器相关环境变量
pub mod web {
    use super::*;

    pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
    pub const DEFAULT_OWNER_HEADER: &str = "x-owner-id";

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "DICT_WEB_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_BIND_ADDRESS, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_BIND_ADDRESS)
        }

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "Address")
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "DICT_WEB_PORT";
        const DEFAULT: Option<u16> = Some(3217);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            let port: u16 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid port number (1-65535)".to_string(),
            })?;

            if port == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Port cannot be 0".to_string(),
                });
            }

            Ok(port)
        }
    }

    /// 携带所有者标识的请求头
    pub struct OwnerHeader;
    impl EnvVar<String> for OwnerHeader {
        const NAME: &'static str = "DICT_OWNER_HEADER";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str =
            "Request header set by the auth proxy with the owner id (absent = anonymous)";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_OWNER_HEADER, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_OWNER_HEADER)
        }

        fn parse(value: &str) -> EnvResult<String> {
            let name = value.trim().to_ascii_lowercase();
            let valid = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if valid {
                Ok(name)
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid header name '{}'", value),
                })
            }
        }
    }
}

/// MongoDB相关环境变量
pub mod mongodb {
    use super::*;

    pub const DEFAULT_CONNECTION_STRING: &str = "mongodb://localhost:27017";
    pub const DEFAULT_DATABASE: &str = "ai_dictionary";
    pub const DEFAULT_COLLECTION: &str = "word_records";

    /// MongoDB连接字符串
    pub struct ConnectionString;
    impl EnvVar<String> for ConnectionString {
        const NAME: &'static str = "MONGODB_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "MongoDB connection string";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_CONNECTION_STRING, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_CONNECTION_STRING)
        }

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "MongoDB URL must start with mongodb:// or mongodb+srv://"
                        .to_string(),
                })
            }
        }
    }

    /// 数据库名称
    pub struct DatabaseName;
    impl EnvVar<String> for DatabaseName {
        const NAME: &'static str = "MONGODB_DATABASE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "MongoDB database name";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_DATABASE, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_DATABASE)
        }

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "Database name")
        }
    }

    /// 集合名称
    pub struct CollectionName;
    impl EnvVar<String> for CollectionName {
        const NAME: &'static str = "MONGODB_COLLECTION";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "MongoDB collection holding word records";

        fn get() -> EnvResult<String> {
            string_or(Self::NAME, DEFAULT_COLLECTION, Self::parse)
        }

        fn default_doc() -> String {
            format!("{:?}", DEFAULT_COLLECTION)
        }

        fn parse(value: &str) -> EnvResult<String> {
            non_empty(value, Self::NAME, "Collection name")
        }
    }
}

/// 辅助函数
fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    // 核心配置
    pub mode: String,
    pub log_level: String,
    pub no_color: bool,

    // 释义服务配置
    pub provider_api_key: Option<String>,
    pub provider_api_url: String,
    pub provider_model: String,
    pub provider_timeout: Duration,
    pub prompt_style: PromptStyle,

    // 历史配置
    pub history_limit: usize,
    pub history_preview_chars: usize,

    // Web配置
    pub web_bind_address: String,
    pub web_port: u16,
    pub owner_header: String,

    // MongoDB配置
    pub mongodb_connection_string: String,
    pub mongodb_database_name: String,
    pub mongodb_collection_name: String,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            mode: core::Mode::get()?,
            log_level: core::LogLevel::get()?,
            no_color: core::NoColor::get()?,

            // 未设置密钥时仍可运行管理命令
            provider_api_key: provider::ApiKey::get().ok(),
            provider_api_url: provider::ApiUrl::get()?,
            provider_model: provider::Model::get()?,
            provider_timeout: provider::Timeout::get()?,
            prompt_style: provider::Style::get()?,

            history_limit: history::Limit::get()?,
            history_preview_chars: history::PreviewChars::get()?,

            web_bind_address: web::BindAddress::get()?,
            web_port: web::Port::get()?,
            owner_header: web::OwnerHeader::get()?,

            mongodb_connection_string: mongodb::ConnectionString::get()?,
            mongodb_database_name: mongodb::DatabaseName::get()?,
            mongodb_collection_name: mongodb::CollectionName::get()?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.mode == "development"
    }

    /// 打印配置摘要（隐藏敏感信息）
    pub fn print_summary(&self) {
        println!("Environment Configuration Summary:");
        println!("  Mode: {}", self.mode);
        println!("  Log Level: {}", self.log_level);
        println!(
            "  Provider: {} ({}s timeout, {:?} prompts)",
            self.provider_model,
            self.provider_timeout.as_secs(),
            self.prompt_style
        );
        println!(
            "  API Key: {}",
            if self.provider_api_key.is_some() { "[configured]" } else { "[missing]" }
        );
        println!("  Web Server: {}:{}", self.web_bind_address, self.web_port);
        println!(
            "  MongoDB: {}/{}",
            self.mongodb_database_name, self.mongodb_collection_name
        );
    }
}

fn doc_line<T: fmt::Debug, V: EnvVar<T>>(docs: &mut String) {
    docs.push_str(&format!(
        "- `{}`: {} (default: {})\n",
        V::NAME,
        V::DESCRIPTION,
        V::default_doc()
    ));
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    doc_line::<String, core::Mode>(&mut docs);
    doc_line::<String, core::LogLevel>(&mut docs);
    doc_line::<bool, core::NoColor>(&mut docs);

    docs.push_str("\n## Provider Configuration\n\n");
    doc_line::<String, provider::ApiKey>(&mut docs);
    doc_line::<String, provider::ApiUrl>(&mut docs);
    doc_line::<String, provider::Model>(&mut docs);
    doc_line::<Duration, provider::Timeout>(&mut docs);
    doc_line::<PromptStyle, provider::Style>(&mut docs);

    docs.push_str("\n## History Configuration\n\n");
    doc_line::<usize, history::Limit>(&mut docs);
    doc_line::<usize, history::PreviewChars>(&mut docs);

    docs.push_str("\n## Web Server Configuration\n\n");
    doc_line::<String, web::BindAddress>(&mut docs);
    doc_line::<u16, web::Port>(&mut docs);
    doc_line::<String, web::OwnerHeader>(&mut docs);

    docs.push_str("\n## MongoDB Configuration\n\n");
    doc_line::<String, mongodb::ConnectionString>(&mut docs);
    doc_line::<String, mongodb::DatabaseName>(&mut docs);
    doc_line::<String, mongodb::CollectionName>(&mut docs);

    docs
}
