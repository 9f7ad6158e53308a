//! 释义提示词模板

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::language::Language;

/// 提示词风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    Standard,
    #[default]
    Detailed,
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(PromptStyle::Standard),
            "detailed" => Ok(PromptStyle::Detailed),
            other => Err(format!("未知提示词风格 '{}'，可选: standard, detailed", other)),
        }
    }
}

const CHINESE_STANDARD: &str = "請提供中文詞彙「{word}」的詳細解釋，包括：
1. 英文翻譯
2. 詞性
3. 詳細定義
4. 使用例句（中英對照）

請以清晰易懂的格式回答。";

const ENGLISH_STANDARD: &str = "Please explain the English word \"{word}\" in detail, including:
1. Chinese translation
2. Part of speech
3. Detailed definition
4. Example sentences (with Chinese translation)

Please format the response clearly.";

const CHINESE_DETAILED: &str = "將下列中文詞彙翻譯成英文，並依照格式說明：
• 標出英文翻譯的詞性（例如 [noun]、[verb]、[adjective]、[adverb]）。
• 用簡單、基礎的英文單詞寫出英文解釋，讓初學者能看懂。
• 如果英文翻譯是動詞，列出原形、過去式、過去分詞、現在分詞和第三人稱單數。
• 列出 3 到 5 個詞性相同的常見英文同義詞。
• 提供三個使用該英文單詞的簡單例句。
-
輸出格式:
【單詞】: [中文單詞]
【英文翻譯】: [English Translation]
【詞性】: [Part of Speech]
【英文解釋】: [Simple English Definition]
【時態變化】: [base], [past], [past participle], [present participle], [third person singular]（僅限動詞）
【同義詞】: [Synonyms]
【例句】: [Example Sentences] [Chinese Translation]
-
請說明中文詞彙「{word}」";

const ENGLISH_DETAILED: &str = "You are an English-Traditional Chinese dictionary assistant.
For the single English word below:
• Translate it into Traditional Chinese.
• Give an English definition using only simple, common words.
• Identify the part of speech (e.g. [noun], [verb], [adjective], [adverb]).
• If it is a verb, list base form, past tense, past participle, present participle and third person singular.
• List 3 to 5 common synonyms with the same part of speech.
• Give three simple example sentences.
-
Output format:
【Word】: [English Word]
【詞性】: [Part of Speech]
【中文翻譯】: [Traditional Chinese Translation]
【英文解釋】: [Simple English Definition]
【時態變化】: [base], [past], [past participle], [present participle], [third person singular] (verbs only)
【同義詞】: [Synonyms]
【例句】: [Example Sentence] [Chinese Translation]
-
Explain the English word \"{word}\"";

/// 选择提示词模板
pub fn template(language: Language, style: PromptStyle) -> &'static str {
    match (language, style) {
        (Language::Chinese, PromptStyle::Standard) => CHINESE_STANDARD,
        (Language::Chinese, PromptStyle::Detailed) => CHINESE_DETAILED,
        (Language::English, PromptStyle::Standard) => ENGLISH_STANDARD,
        (Language::English, PromptStyle::Detailed) => ENGLISH_DETAILED,
    }
}

/// 生成最终发送给释义服务的提示词
pub fn render(language: Language, style: PromptStyle, word: &str) -> String {
    template(language, style).replace("{word}", word)
}
