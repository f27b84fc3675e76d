// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::content::SourceDocument;
use crate::utils::text_analysis::{extract_practice_sentences, first_sentence, top_terms};

/// 生成上下文
///
/// 从一组源文档提炼出的提示素材。
#[derive(Debug, Clone)]
pub struct GenerationContext {
    /// 主题，来自源标题高频词
    pub topic: String,
    /// 主题词列表
    pub themes: Vec<String>,
    /// 实践建议句
    pub best_practices: Vec<String>,
    /// 关键洞见（各源首句）
    pub key_insights: Vec<String>,
}

/// 上下文提示构建器
///
/// 列表长度上限可配置，防止提示在源文档很长时无界膨胀。
#[derive(Debug, Clone)]
pub struct ContextPromptBuilder {
    /// 主题词上限
    pub max_themes: usize,
    /// 实践建议句上限
    pub max_practices: usize,
    /// 关键洞见上限
    pub max_insights: usize,
}

impl Default for ContextPromptBuilder {
    fn default() -> Self {
        Self {
            max_themes: 10,
            max_practices: 5,
            max_insights: 5,
        }
    }
}

impl ContextPromptBuilder {
    /// 创建新的上下文提示构建器
    pub fn new(max_themes: usize, max_practices: usize, max_insights: usize) -> Self {
        Self {
            max_themes,
            max_practices,
            max_insights,
        }
    }

    /// 从源文档组构建生成上下文
    pub fn build(&self, sources: &[SourceDocument]) -> GenerationContext {
        let combined_body = sources
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let combined_titles = sources
            .iter()
            .map(|s| s.title.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let themes = top_terms(&combined_body, self.max_themes);

        let best_practices = extract_practice_sentences(&combined_body, self.max_practices);

        let key_insights: Vec<String> = sources
            .iter()
            .filter_map(|s| first_sentence(&s.content))
            .take(self.max_insights)
            .collect();

        // 主题从标题高频词推导，标题为空时退回正文主题词
        let title_terms = top_terms(&combined_titles, 3);
        let topic = if title_terms.is_empty() {
            themes.iter().take(3).cloned().collect::<Vec<_>>().join(" ")
        } else {
            title_terms.join(" ")
        };

        GenerationContext {
            topic,
            themes,
            best_practices,
            key_insights,
        }
    }
}
