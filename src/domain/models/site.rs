// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 站点配置
///
/// 一个可发布的目标站点及其内容亲和性描述。配置驱动、
/// 读多写少，进程启动时加载，配置变更时整体重载。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// 站点标识符
    pub id: String,
    /// 站点名称
    pub name: String,
    /// 站点API基础地址
    pub endpoint: String,
    /// 站点擅长的分类
    pub categories: Vec<String>,
    /// 站点关键词
    pub keywords: Vec<String>,
    /// 是否启用
    pub is_active: bool,
    /// 优先级权重，用于平局裁决与默认站点选择
    pub priority: i32,
}

/// 路由规则
///
/// 将内容特征映射到偏好站点的打分匹配器，概念上每个站点
/// 一条，按定义顺序稳定评估。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    /// 匹配关键词
    pub keywords: Vec<String>,
    /// 匹配分类
    pub categories: Vec<String>,
    /// 目标站点ID
    pub target_site_id: String,
    /// 优先级权重，参与得分缩放
    pub priority: i32,
    /// 规则说明
    pub description: String,
}

/// 路由请求
///
/// 为一篇待发布内容决定目标站点所需的全部特征。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRequest {
    /// 内容ID
    pub content_id: Uuid,
    /// 标题
    pub title: String,
    /// 正文
    pub body: String,
    /// 摘要
    pub excerpt: String,
    /// 分类
    pub categories: Vec<String>,
    /// 标签
    pub tags: Vec<String>,
    /// 内容类型标记
    pub content_type: Option<String>,
    /// 显式指定的目标站点
    pub target_site_id: Option<String>,
}

impl RoutingRequest {
    /// 从已审核内容构建路由请求
    pub fn from_content(
        content: &crate::domain::models::content::ApprovedContent,
        target_site_id: Option<String>,
    ) -> Self {
        Self {
            content_id: content.id,
            title: content.title.clone(),
            body: content.body.clone(),
            excerpt: content.excerpt.clone(),
            categories: content.categories.clone(),
            tags: content.tags.clone(),
            content_type: content.content_type.clone(),
            target_site_id,
        }
    }
}
