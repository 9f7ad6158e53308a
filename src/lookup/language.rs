//! 查询语言识别

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CJK 统一表意文字区间
const CJK_UNIFIED_START: char = '\u{4E00}';
const CJK_UNIFIED_END: char = '\u{9FFF}';

/// 查询语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Chinese => "chinese",
            Language::English => "english",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chinese" | "zh" => Ok(Language::Chinese),
            "english" | "en" => Ok(Language::English),
            other => Err(format!("未知语言: {}", other)),
        }
    }
}

/// 判断字符是否属于 CJK 统一表意文字
pub fn is_cjk_ideograph(ch: char) -> bool {
    (CJK_UNIFIED_START..=CJK_UNIFIED_END).contains(&ch)
}

/// 识别文本语言
///
/// 只要出现任意一个 CJK 统一表意文字即视为中文，否则为英文。
/// 必须作用于规范化之前的原始输入。
pub fn classify(text: &str) -> Language {
    if text.chars().any(is_cjk_ideograph) {
        Language::Chinese
    } else {
        Language::English
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("apple"), Language::English);
        assert_eq!(classify("蘋果"), Language::Chinese);
        assert_eq!(classify("  apple 派 "), Language::Chinese);
        assert_eq!(classify(""), Language::English);
        // 假名与全角标点不在统一表意文字区间内
        assert_eq!(classify("りんご！"), Language::English);
    }

    #[test]
    fn test_range_boundaries() {
        assert!(is_cjk_ideograph('\u{4E00}'));
        assert!(is_cjk_ideograph('\u{9FFF}'));
        assert!(!is_cjk_ideograph('\u{4DFF}'));
        assert!(!is_cjk_ideograph('\u{A000}'));
    }

    #[test]
    fn test_language_round_trip_names() {
        assert_eq!("chinese".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert!("klingon".parse::<Language>().is_err());
        assert_eq!(
            serde_json::to_string(&Language::English).unwrap(),
            "\"english\""
        );
    }
}
