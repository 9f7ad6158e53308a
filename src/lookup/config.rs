//! 查词配置管理
//!
//! 配置来源按优先级从低到高：默认值、配置文件（TOML 或 JSON）、环境变量。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{helpers, LookupError, LookupResult};
use super::prompts::PromptStyle;

/// 配置常量
pub mod constants {
    use std::time::Duration;

    pub const DEFAULT_API_URL: &str = crate::env::provider::DEFAULT_API_URL;
    pub const DEFAULT_MODEL: &str = crate::env::provider::DEFAULT_MODEL;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const MAX_TIMEOUT_SECS: u64 = 300;

    pub const DEFAULT_HISTORY_LIMIT: usize = 20;
    pub const MAX_HISTORY_LIMIT: usize = 500;
    pub const DEFAULT_PREVIEW_CHARS: usize = 200;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "dictionary.toml",
        ".dictionary.toml",
        "~/.config/ai-dictionary/config.toml",
    ];

    pub const ENV_FILES: &[&str] = &[".env.local", ".env.development", ".env.production", ".env"];
}

/// 释义服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// 只从环境变量读取，不写入配置文件
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub prompt_style: PromptStyle,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: constants::DEFAULT_API_URL.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            timeout_secs: constants::DEFAULT_TIMEOUT.as_secs(),
            prompt_style: PromptStyle::default(),
        }
    }
}

/// 历史记录配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// 未指定条数时返回的记录数
    pub limit: usize,
    /// 历史列表中释义预览的字符数
    pub preview_chars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: constants::DEFAULT_HISTORY_LIMIT,
            preview_chars: constants::DEFAULT_PREVIEW_CHARS,
        }
    }
}

/// 查词引擎配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LookupConfig {
    pub provider: ProviderConfig,
    pub history: HistoryConfig,
}

impl LookupConfig {
    /// 验证配置
    pub fn validate(&self) -> LookupResult<()> {
        if self.provider.timeout_secs == 0 {
            return Err(helpers::config_error("超时时间不能为0"));
        }

        if self.provider.timeout_secs > constants::MAX_TIMEOUT_SECS {
            return Err(helpers::config_error(format!(
                "超时时间不能超过{}秒",
                constants::MAX_TIMEOUT_SECS
            )));
        }

        if self.provider.model.trim().is_empty() {
            return Err(helpers::config_error("模型名称不能为空"));
        }

        if self.history.limit == 0 || self.history.limit > constants::MAX_HISTORY_LIMIT {
            return Err(helpers::config_error(format!(
                "历史条数必须在 1 到 {} 之间",
                constants::MAX_HISTORY_LIMIT
            )));
        }

        if self.history.preview_chars == 0 {
            return Err(helpers::config_error("预览长度不能为0"));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只有显式设置的变量才会覆盖文件中的值；设置了但无法解析的变量视为配置错误。
    pub fn apply_env_overrides(&mut self) -> LookupResult<()> {
        use crate::env::{history, provider, EnvVar};

        if let Some(api_key) = provider::ApiKey::get_explicit()? {
            self.provider.api_key = Some(api_key);
        }

        if let Some(api_url) = provider::ApiUrl::get_explicit()? {
            self.provider.api_url = api_url;
            tracing::info!("环境变量覆盖 API URL: {}", self.provider.api_url);
        }

        if let Some(model) = provider::Model::get_explicit()? {
            self.provider.model = model;
        }

        if let Some(timeout) = provider::Timeout::get_explicit()? {
            self.provider.timeout_secs = timeout.as_secs();
        }

        if let Some(style) = provider::Style::get_explicit()? {
            self.provider.prompt_style = style;
        }

        if let Some(limit) = history::Limit::get_explicit()? {
            self.history.limit = limit;
        }

        if let Some(preview) = history::PreviewChars::get_explicit()? {
            self.history.preview_chars = preview;
        }

        Ok(())
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: LookupConfig,
}

impl ConfigManager {
    /// 加载 `.env`、配置文件与环境变量，并验证
    pub fn new() -> LookupResult<Self> {
        Self::load_dotenv();
        let config = Self::load_config()?;
        Self::finish(config)
    }

    /// 从指定文件加载
    pub fn from_path(path: &str) -> LookupResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        let config = Self::load_from_file(&expanded)?;
        Self::finish(config)
    }

    fn finish(mut config: LookupConfig) -> LookupResult<Self> {
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn into_config(self) -> LookupConfig {
        self.config
    }

    /// 查找配置文件
    fn load_config() -> LookupResult<LookupConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(LookupConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> LookupResult<LookupConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| helpers::config_error(format!("读取配置文件失败 {}: {}", path, e)))?;

        let parsed = if path.ends_with(".toml") {
            toml::from_str(&content).map_err(LookupError::from)
        } else {
            serde_json::from_str(&content).map_err(LookupError::from)
        };
        parsed.map_err(|e| e.with_context(path))
    }

    /// 加载 .env 文件，已存在的环境变量不会被覆盖
    pub fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> LookupResult<()> {
        let content = toml::to_string_pretty(&LookupConfig::default())
            .map_err(|e| helpers::config_error(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| helpers::config_error(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
