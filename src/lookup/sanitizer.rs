//! 释义文本清理
//!
//! 在写入缓存之前收敛释义服务输出中的格式噪声。规则按顺序执行：
//!
//! 1. 统一换行符，把只含空白的行变为空行，连续空行最多保留一行
//! 2. `【标签】:` 形式的段落标记后只保留一个换行
//! 3. 去除整体首尾空白
//! 4. 把连续的空格/制表符折叠为单个空格（不影响换行）
//!
//! 清理结果满足幂等性：`sanitize(sanitize(x)) == sanitize(x)`。

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// 清理失败
///
/// 仅在内置规则无法编译时出现，属于程序缺陷而非用户错误。
#[derive(Error, Debug, Clone)]
pub enum SanitizeError {
    #[error("清理规则无效: {0}")]
    InvalidRule(String),
}

struct Rules {
    line_breaks: Regex,
    blank_line: Regex,
    blank_runs: Regex,
    marker_gap: Regex,
    horizontal: Regex,
}

impl Rules {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            line_breaks: Regex::new(r"\r\n?")?,
            blank_line: Regex::new(r"(?m)^[ \t]+$")?,
            blank_runs: Regex::new(r"\n{3,}")?,
            marker_gap: Regex::new(r"(【[^】\n]*】[:：])[ \t]*\n{2,}")?,
            horizontal: Regex::new(r"[ \t]+")?,
        })
    }
}

static RULES: OnceLock<Result<Rules, SanitizeError>> = OnceLock::new();

fn rules() -> Result<&'static Rules, SanitizeError> {
    RULES
        .get_or_init(|| Rules::compile().map_err(|e| SanitizeError::InvalidRule(e.to_string())))
        .as_ref()
        .map_err(Clone::clone)
}

/// 清理释义服务返回的原始文本
pub fn sanitize(raw: &str) -> Result<String, SanitizeError> {
    let rules = rules()?;

    let text = rules.line_breaks.replace_all(raw, "\n");
    let text = rules.blank_line.replace_all(&text, "");
    let text = rules.blank_runs.replace_all(&text, "\n\n");
    let text = rules.marker_gap.replace_all(&text, "${1}\n");
    let text = text.trim();
    let text = rules.horizontal.replace_all(text, " ");

    Ok(text.into_owned())
}

/// 判断原始文本在清理后是否为空
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}
