// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::site::{RoutingRequest, RoutingRule, SiteConfig};
use crate::domain::repositories::site_store::{RoutingRuleStore, SiteStore};
use crate::utils::errors::OrchestrationError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// 路由打分权重
///
/// 打分公式的命名配置，替代散落在控制流里的魔法常量。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RoutingWeights {
    /// 正文关键词命中权重
    pub keyword_weight: f64,
    /// 分类重合权重
    pub category_weight: f64,
    /// 标签重合权重
    pub tag_weight: f64,
    /// 规则优先级缩放除数
    pub priority_divisor: f64,
}

impl Default for RoutingWeights {
    fn default() -> Self {
        Self {
            keyword_weight: 10.0,
            category_weight: 15.0,
            tag_weight: 10.0,
            priority_divisor: 100.0,
        }
    }
}

/// 目标站点路由服务
///
/// 为一篇待发布内容选择目标站点。整个决策是无副作用的纯
/// 函数：路由预览直接复用同一入口，不会触发发布。
pub struct RoutingService {
    sites: Arc<SiteStore>,
    rules: Arc<RoutingRuleStore>,
    weights: RoutingWeights,
}

impl RoutingService {
    /// 创建新的路由服务实例
    pub fn new(sites: Arc<SiteStore>, rules: Arc<RoutingRuleStore>, weights: RoutingWeights) -> Self {
        Self {
            sites,
            rules,
            weights,
        }
    }

    /// 决定目标站点
    ///
    /// 判定顺序：
    /// 1. 请求显式指定且站点存在时直接采用；
    /// 2. 内容类型命中固定映射表时采用映射站点；
    /// 3. 对全部规则打分，严格最高分的规则胜出，平局时先
    ///    定义的规则胜出；无规则得分时回退默认站点。
    pub fn determine_target_site(
        &self,
        request: &RoutingRequest,
    ) -> Result<SiteConfig, OrchestrationError> {
        if let Some(site_id) = &request.target_site_id {
            if let Some(site) = self.sites.find(site_id) {
                return Ok(site);
            }
        }

        if let Some(content_type) = &request.content_type {
            if let Some(site_id) = self.rules.site_for_content_type(content_type) {
                if let Some(site) = self.sites.find(&site_id) {
                    return Ok(site);
                }
            }
        }

        let rules = self.rules.rules();
        let mut best: Option<(&RoutingRule, f64)> = None;
        for rule in &rules {
            let score = self.score_rule(rule, request);
            debug!(
                target_site = %rule.target_site_id,
                score,
                "Routing rule scored"
            );
            // 严格大于才替换，平局保持先定义的规则
            if score > 0.0 && best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((rule, score));
            }
        }

        if let Some((rule, _)) = best {
            if let Some(site) = self.sites.find(&rule.target_site_id) {
                return Ok(site);
            }
        }

        self.sites
            .default_site()
            .ok_or_else(|| OrchestrationError::NotFound("no active destination site".to_string()))
    }

    /// 路由预览
    ///
    /// 与正式发布走完全相同的决策路径，仅返回站点ID。
    pub fn preview_routing(&self, request: &RoutingRequest) -> Result<String, OrchestrationError> {
        Ok(self.determine_target_site(request)?.id)
    }

    /// 对单条规则打分
    ///
    /// score = keyword_weight × 正文关键词命中数
    ///       + category_weight × 分类重合数
    ///       + tag_weight × 标签重合数，
    /// 再按 rule.priority / priority_divisor 缩放。
    fn score_rule(&self, rule: &RoutingRule, request: &RoutingRequest) -> f64 {
        let haystack = format!(
            "{} {} {}",
            request.title, request.body, request.excerpt
        )
        .to_lowercase();

        let keyword_hits = rule
            .keywords
            .iter()
            .filter(|k| haystack.contains(&k.to_lowercase()))
            .count();

        let category_hits = rule
            .categories
            .iter()
            .filter(|c| {
                request
                    .categories
                    .iter()
                    .any(|rc| rc.eq_ignore_ascii_case(c))
            })
            .count();

        let tag_hits = rule
            .keywords
            .iter()
            .filter(|k| request.tags.iter().any(|t| t.eq_ignore_ascii_case(k)))
            .count();

        let raw = self.weights.keyword_weight * keyword_hits as f64
            + self.weights.category_weight * category_hits as f64
            + self.weights.tag_weight * tag_hits as f64;

        raw * rule.priority as f64 / self.weights.priority_divisor
    }
}

#[cfg(test)]
#[path = "routing_service_test.rs"]
mod tests;
