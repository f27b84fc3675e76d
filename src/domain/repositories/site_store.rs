// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::site::{RoutingRule, SiteConfig};
use parking_lot::RwLock;
use std::collections::HashMap;

/// 站点配置存储
///
/// 构造函数注入的显式存储，替代进程级可变全局表。启动时
/// 加载，配置变更时整体重载，读路径无需异步。
pub struct SiteStore {
    sites: RwLock<Vec<SiteConfig>>,
}

impl SiteStore {
    /// 使用初始站点列表创建存储
    pub fn new(sites: Vec<SiteConfig>) -> Self {
        Self {
            sites: RwLock::new(sites),
        }
    }

    /// 按ID查找站点
    pub fn find(&self, site_id: &str) -> Option<SiteConfig> {
        self.sites.read().iter().find(|s| s.id == site_id).cloned()
    }

    /// 全部启用的站点
    pub fn active_sites(&self) -> Vec<SiteConfig> {
        self.sites
            .read()
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect()
    }

    /// 默认站点
    ///
    /// 没有任何规则得分时的兜底选择：优先级权重最低的启用站点。
    pub fn default_site(&self) -> Option<SiteConfig> {
        self.sites
            .read()
            .iter()
            .filter(|s| s.is_active)
            .min_by_key(|s| s.priority)
            .cloned()
    }

    /// 整体重载站点列表
    pub fn reload(&self, sites: Vec<SiteConfig>) {
        *self.sites.write() = sites;
    }
}

/// 路由规则存储
///
/// 规则保持定义顺序，打分平局时先定义者胜出；同时维护
/// 内容类型到站点的固定映射表。
pub struct RoutingRuleStore {
    rules: RwLock<Vec<RoutingRule>>,
    content_type_map: RwLock<HashMap<String, String>>,
}

impl RoutingRuleStore {
    /// 使用初始规则与内容类型映射创建存储
    pub fn new(rules: Vec<RoutingRule>, content_type_map: HashMap<String, String>) -> Self {
        Self {
            rules: RwLock::new(rules),
            content_type_map: RwLock::new(content_type_map),
        }
    }

    /// 按定义顺序读取全部规则
    pub fn rules(&self) -> Vec<RoutingRule> {
        self.rules.read().clone()
    }

    /// 查询内容类型映射的站点
    pub fn site_for_content_type(&self, content_type: &str) -> Option<String> {
        self.content_type_map.read().get(content_type).cloned()
    }

    /// 整体重载规则与映射
    pub fn reload(&self, rules: Vec<RoutingRule>, content_type_map: HashMap<String, String>) {
        *self.rules.write() = rules;
        *self.content_type_map.write() = content_type_map;
    }
}
