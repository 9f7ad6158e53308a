//! 缓存键规范化与所有者标识

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{helpers, LookupResult};
use super::language::{classify, Language};

/// 规范化后的缓存键
///
/// 两个查询只要产生相同的 `LookupKey`，就必须命中同一条缓存记录。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LookupKey {
    word: String,
    language: Language,
}

impl LookupKey {
    /// 从原始输入构造缓存键
    ///
    /// 语言识别作用于原始输入，随后再做空白折叠和大小写折叠。
    pub fn from_raw(raw: &str) -> LookupResult<Self> {
        if raw.trim().is_empty() {
            return Err(helpers::validation_error("请输入要查询的单词"));
        }

        let language = classify(raw);
        Ok(Self {
            word: normalize_word(raw, language),
            language,
        })
    }

    /// 使用已规范化的字段构造（存储层回读时使用）
    pub fn from_parts(word: impl Into<String>, language: Language) -> Self {
        Self {
            word: word.into(),
            language,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.language, self.word)
    }
}

/// 规范化查询词
///
/// 去除首尾空白，把内部连续空白折叠为单个空格；英文转为小写，中文原样保留。
pub fn normalize_word(raw: &str, language: Language) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match language {
        Language::English => collapsed.to_lowercase(),
        Language::Chinese => collapsed,
    }
}

/// 查询记录的所有者
///
/// 认证由外部负责；未登录的请求共享同一个匿名历史桶。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerId {
    #[default]
    Anonymous,
    User(String),
}

impl OwnerId {
    /// 从可选的用户标识构造，空白标识视为匿名
    pub fn from_optional(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => OwnerId::User(id.to_string()),
            _ => OwnerId::Anonymous,
        }
    }

    pub fn as_option(&self) -> Option<&str> {
        match self {
            OwnerId::Anonymous => None,
            OwnerId::User(id) => Some(id),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, OwnerId::Anonymous)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerId::Anonymous => f.write_str("匿名"),
            OwnerId::User(id) => f.write_str(id),
        }
    }
}
