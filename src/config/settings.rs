// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::site::{RoutingRule, SiteConfig};
use crate::domain::services::routing_service::RoutingWeights;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// 应用程序配置设置
///
/// 包含存储、工作池、调度、保留期与路由等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Redis配置，未配置URL时使用内存存储
    #[serde(default)]
    pub redis: RedisSettings,
    /// 工作池配置
    pub workers: WorkerSettings,
    /// 调度配置
    pub scheduling: SchedulingSettings,
    /// 记录保留期配置
    pub retention: RetentionSettings,
    /// 路由打分权重
    pub routing: RoutingWeights,
    /// 目标站点列表
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
    /// 路由规则列表，保持定义顺序
    #[serde(default)]
    pub routing_rules: Vec<RoutingRule>,
    /// 内容类型到站点的固定映射
    #[serde(default)]
    pub content_type_map: HashMap<String, String>,
}

/// Redis配置设置
#[derive(Debug, Default, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: Option<String>,
}

/// 工作池配置设置
#[derive(Debug, Deserialize)]
pub struct WorkerSettings {
    /// 内容生成池并发数
    pub generation_concurrency: usize,
    /// 站点发布池并发数
    pub publishing_concurrency: usize,
    /// 性能跟踪池并发数
    pub tracking_concurrency: usize,
}

/// 调度配置设置
#[derive(Debug, Deserialize)]
pub struct SchedulingSettings {
    /// 相邻生成任务的派发间隔（毫秒）
    pub generation_stagger_ms: i64,
}

/// 记录保留期配置设置
#[derive(Debug, Deserialize)]
pub struct RetentionSettings {
    /// 生成/发布作业记录TTL（秒）
    pub job_ttl_secs: u64,
    /// 性能记录TTL（秒）
    pub performance_ttl_secs: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件与环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default worker pool sizes, aligned with external API rate limits
            .set_default("workers.generation_concurrency", 5)?
            .set_default("workers.publishing_concurrency", 3)?
            .set_default("workers.tracking_concurrency", 2)?
            // Default scheduling settings
            .set_default("scheduling.generation_stagger_ms", 5_000)?
            // Default retention: 2h for jobs, 30d for performance records
            .set_default("retention.job_ttl_secs", 7_200)?
            .set_default("retention.performance_ttl_secs", 2_592_000)?
            // Default routing score weights
            .set_default("routing.keyword_weight", 10.0)?
            .set_default("routing.category_weight", 15.0)?
            .set_default("routing.tag_weight", 10.0)?
            .set_default("routing.priority_divisor", 100.0)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CONTENTFLOW").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
