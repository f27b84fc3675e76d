// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 外部能力契约
//!
//! 内容生成、站点发布、指标采集与已审核内容查询均为编排核心
//! 之外的外部能力，这里只定义与实现无关的接口与错误分类。

use crate::domain::models::content::{ApprovedContent, ResearchJob};
use crate::domain::models::site::SiteConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 内容生成能力错误类型
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// 提供方内部故障
    #[error("Provider error: {0}")]
    Provider(String),
    /// 触发提供方限流
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimit { retry_after_secs: Option<u64> },
    /// 配额耗尽
    #[error("Quota exceeded: {0}")]
    Quota(String),
}

impl GeneratorError {
    /// 判断错误是否可重试
    ///
    /// 三类错误对调用方都是瞬时的，均允许退避重试。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeneratorError::Provider(_)
                | GeneratorError::RateLimit { .. }
                | GeneratorError::Quota(_)
        )
    }
}

/// 发布能力错误类型
#[derive(Error, Debug)]
pub enum PublisherError {
    /// 目标站点不可达
    #[error("Connection error: {0}")]
    Connection(String),
    /// 凭证被拒绝
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl PublisherError {
    /// 连接与凭证错误通常意味着作业级配置问题，任务级不重试
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// 指标采集能力错误类型
#[derive(Error, Debug)]
#[error("Metrics fetch failed: {0}")]
pub struct MetricsError(pub String);

/// 外部只读存储访问错误类型
#[derive(Error, Debug)]
#[error("Capability access failed: {0}")]
pub struct AccessError(pub String);

/// 内容生成请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// 主题，来自源标题高频词
    pub topic: String,
    /// 关键词列表，来自源文档主题词
    pub keywords: Vec<String>,
    /// 品牌语气
    pub brand_voice: String,
    /// 目标受众
    pub target_audience: String,
    /// 内容类型
    pub content_type: String,
    /// 上下文要点，来自源文档的实践建议与关键洞见
    pub context_points: Vec<String>,
    /// 目标词数
    pub target_word_count: u32,
    /// 偏好的提供方标识
    pub provider_preference: Option<String>,
}

/// 内容生成结果草稿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDraft {
    /// 标题
    pub title: String,
    /// 正文
    pub body: String,
    /// 摘要
    pub excerpt: String,
    /// 实际使用的提供方标识
    pub provider: String,
    /// SEO元描述
    pub meta_description: Option<String>,
}

/// 内容生成能力
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// 根据主题与上下文生成一篇内容草稿
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, GeneratorError>;
}

/// 发布回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// 目标站点上的文章ID
    pub external_id: String,
    /// 发布后的URL
    pub external_url: String,
    /// 发布时间
    pub published_at: DateTime<Utc>,
}

/// 发布参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOptions {
    /// 发布状态（publish或draft）
    pub status: String,
    /// 分类
    pub categories: Vec<String>,
    /// 标签
    pub tags: Vec<String>,
    /// 定时发布时间
    pub scheduled_date: Option<DateTime<Utc>>,
}

/// 站点发布能力
#[async_trait]
pub trait Publisher: Send + Sync {
    /// 连通性预检查
    ///
    /// 在作业入队前对目标凭证执行一次，失败时整个作业中止。
    async fn check_connection(&self, credentials_id: &str) -> Result<(), PublisherError>;

    /// 将一篇内容发布到目标站点
    async fn publish(
        &self,
        content: &ApprovedContent,
        destination: &SiteConfig,
        options: &PublishOptions,
    ) -> Result<PublishReceipt, PublisherError>;
}

/// 采集到的原始指标
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollectedMetrics {
    pub views: u64,
    pub comments: u64,
    pub shares: u64,
    pub engagement_rate: f64,
    pub avg_time_on_page: f64,
    pub organic_traffic: u64,
    pub click_through_rate: f64,
    pub bounce_rate: f64,
}

/// 指标采集能力
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// 拉取指定外部文章的当前指标
    async fn fetch(&self, external_post_id: &str) -> Result<CollectedMetrics, MetricsError>;
}

/// 已审核内容查询能力
#[async_trait]
pub trait ApprovedContentStore: Send + Sync {
    /// 按ID查询内容，不存在时返回None
    async fn get_by_id(&self, content_id: Uuid) -> Result<Option<ApprovedContent>, AccessError>;
}

/// 研究结果查询能力
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// 按ID查询研究作业及其源文档集
    async fn get_research_job(&self, id: Uuid) -> Result<Option<ResearchJob>, AccessError>;
}
