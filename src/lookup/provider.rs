//! 释义服务接口与 Gemini 实现

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::ProviderConfig;
use super::error::{LookupError, LookupResult, ProviderError};
use super::language::Language;
use super::prompts::{self, PromptStyle};

/// 释义服务接口
///
/// 查词服务对每个未命中的键只调用一次；重试策略（如果有）由实现自行决定。
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    /// 获取原始释义文本
    async fn fetch_definition(&self, word: &str, language: Language)
        -> Result<String, ProviderError>;

    /// 提供方名称，用于日志
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// 错误响应体最多保留的字符数
const ERROR_BODY_SNIPPET: usize = 200;

/// 基于 Gemini generateContent 接口的释义服务
pub struct GeminiProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    style: PromptStyle,
    timeout: Duration,
}

impl GeminiProvider {
    /// 根据配置创建
    pub fn from_config(config: &ProviderConfig) -> LookupResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LookupError::ConfigError("未设置 GEMINI_API_KEY".to_string()))?;

        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::ConfigError(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            style: config.prompt_style,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::UpstreamError(format!("请求失败: {}", error))
        }
    }
}

/// 拼接第一个候选结果中的全部文本片段
fn extract_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    Some(text)
}

#[async_trait]
impl DefinitionProvider for GeminiProvider {
    async fn fetch_definition(
        &self,
        word: &str,
        language: Language,
    ) -> Result<String, ProviderError> {
        let prompt = prompts::render(language, self.style, word);
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: &prompt }],
            }],
        };

        tracing::debug!("请求释义服务: model={}, word={}", self.model, word);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_SNIPPET).collect();
            return Err(ProviderError::UpstreamError(format!(
                "HTTP {}: {}",
                status, snippet
            )));
        }

        let payload: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::UpstreamError(format!("响应无法解析: {}", e))
            }
        })?;

        match extract_text(payload) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
