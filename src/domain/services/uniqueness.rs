// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::content::SourceDocument;
use crate::utils::text_analysis::significant_words;

/// 唯一性验证器
///
/// 用实义词重合度衡量生成文本对源材料的依赖程度。得分是
/// 纯函数：相同的文本与源集合永远得到相同结果。
#[derive(Debug, Clone, Copy, Default)]
pub struct UniquenessValidator;

impl UniquenessValidator {
    /// 创建新的唯一性验证器
    pub fn new() -> Self {
        Self
    }

    /// 计算唯一性得分
    ///
    /// score = 1 - |共享实义词| / |源实义词全集|，收敛到[0,1]。
    /// 长度不超过3的词不参与统计。源集合没有实义词时视为
    /// 完全唯一。
    pub fn score(&self, generated_text: &str, sources: &[SourceDocument]) -> f64 {
        let mut source_words = std::collections::HashSet::new();
        for source in sources {
            source_words.extend(significant_words(&source.title));
            source_words.extend(significant_words(&source.content));
        }

        if source_words.is_empty() {
            return 1.0;
        }

        let generated_words = significant_words(generated_text);
        let shared = generated_words
            .iter()
            .filter(|w| source_words.contains(*w))
            .count();

        (1.0 - shared as f64 / source_words.len() as f64).clamp(0.0, 1.0)
    }
}
