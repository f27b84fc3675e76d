// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 源文档
///
/// 一篇研究/爬取得到的参考材料，是内容生成任务的输入单元。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// 来源URL
    pub url: String,
    /// 标题
    pub title: String,
    /// 正文内容
    pub content: String,
}

/// 研究作业状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    /// 处理中
    #[default]
    Processing,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
}

impl fmt::Display for ResearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResearchStatus::Processing => write!(f, "processing"),
            ResearchStatus::Completed => write!(f, "completed"),
            ResearchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 研究作业
///
/// 外部研究流水线的产出，包含一组可供内容生成使用的源文档。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchJob {
    /// 研究作业唯一标识符
    pub id: Uuid,
    /// 作业状态
    pub status: ResearchStatus,
    /// 源文档集
    pub sources: Vec<SourceDocument>,
}

/// SEO字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoFields {
    /// 元描述
    pub meta_description: Option<String>,
    /// 关键词
    pub keywords: Vec<String>,
}

/// 生成内容元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// 源文档URL列表
    pub source_urls: Vec<String>,
    /// 词数
    pub word_count: usize,
    /// 预计阅读时长（分钟）
    pub reading_time_minutes: u32,
    /// 实际使用的AI提供方
    pub ai_provider: String,
    /// SEO字段
    pub seo: SeoFields,
}

/// 生成内容实体
///
/// 一次成功的生成任务产出一条记录，创建后不可变
/// （运营人员的编辑发生在核心之外）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// 内容唯一标识符
    pub id: Uuid,
    /// 内容类型
    pub content_type: String,
    /// 标题
    pub title: String,
    /// 正文
    pub body: String,
    /// 摘要
    pub excerpt: String,
    /// 唯一性得分，范围[0,1]
    pub uniqueness_score: f64,
    /// 元数据
    pub metadata: ContentMetadata,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 已审核内容
///
/// 发布编排从外部内容库读取的视图，携带发布所需的全部字段。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovedContent {
    /// 内容唯一标识符
    pub id: Uuid,
    /// 标题
    pub title: String,
    /// 正文
    pub body: String,
    /// 摘要
    pub excerpt: String,
    /// 内容类型
    pub content_type: Option<String>,
    /// 是否已通过运营审核
    pub approved: bool,
    /// 分类
    pub categories: Vec<String>,
    /// 标签
    pub tags: Vec<String>,
    /// 外部内容库给出的质量分，范围[0,100]
    pub quality_score: f64,
    /// 生成该内容的AI提供方，人工撰写的内容为空
    pub ai_provider: Option<String>,
}

impl FromStr for ResearchStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(ResearchStatus::Processing),
            "completed" => Ok(ResearchStatus::Completed),
            "failed" => Ok(ResearchStatus::Failed),
            _ => Err(()),
        }
    }
}
