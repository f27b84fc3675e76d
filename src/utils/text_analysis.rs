// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 文本分析工具
//!
//! 为上下文提示构建与唯一性评分提供词频统计、停用词过滤、
//! 关键句抽取等基础能力。所有函数均为纯函数，便于确定性测试。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// 英文停用词表
///
/// 主题词提取时过滤掉的高频虚词。
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
        "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
        "two", "way", "who", "its", "did", "yes", "with", "that", "this", "have", "from", "they",
        "been", "will", "what", "when", "your", "than", "then", "them", "were", "there", "their",
        "which", "would", "could", "should", "about", "after", "before", "other", "these", "those",
        "into", "over", "under", "more", "most", "some", "such", "only", "also", "just", "very",
        "like", "make", "made", "each", "much", "many", "where", "while", "because", "between",
        "through", "during", "against", "being", "does", "doing", "here",
    ]
    .into_iter()
    .collect()
});

/// 最佳实践指示短语
///
/// 包含这些短语的句子会被抽取为上下文提示中的实践要点。
static BEST_PRACTICE_INDICATORS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "best practice",
        "should",
        "recommend",
        "important to",
        "key to",
        "essential",
        "avoid",
        "tip",
        "strategy",
        "effective",
    ]
});

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z][a-zA-Z'\-]*").unwrap());

static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// 判断词语是否有实义
///
/// 长度大于3且不在停用词表中的词才参与主题与唯一性统计。
pub fn is_significant_word(word: &str) -> bool {
    word.len() > 3 && !STOPWORDS.contains(word)
}

/// 从文本中提取小写词序列
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 提取文本中的实义词集合
pub fn significant_words(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| is_significant_word(w))
        .collect()
}

/// 统计实义词词频
pub fn word_frequencies(text: &str) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for word in tokenize(text) {
        if is_significant_word(&word) {
            *frequencies.entry(word).or_insert(0) += 1;
        }
    }
    frequencies
}

/// 提取出现频率最高的N个实义词
///
/// 频率相同的词按字典序排序，保证结果确定。
pub fn top_terms(text: &str, limit: usize) -> Vec<String> {
    let frequencies = word_frequencies(text);
    let mut terms: Vec<(String, usize)> = frequencies.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.into_iter().take(limit).map(|(w, _)| w).collect()
}

/// 切分文本为句子
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// 抽取包含最佳实践指示短语的句子
pub fn extract_practice_sentences(text: &str, limit: usize) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            BEST_PRACTICE_INDICATORS.iter().any(|p| lower.contains(p))
        })
        .take(limit)
        .collect()
}

/// 提取文本首句
pub fn first_sentence(text: &str) -> Option<String> {
    split_sentences(text).into_iter().next()
}

/// 统计词数
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 估算阅读时长（分钟）
///
/// 按每分钟200词计算，向上取整，最少1分钟。
pub fn reading_time_minutes(text: &str) -> u32 {
    let words = word_count(text);
    ((words + 199) / 200).max(1) as u32
}
