// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::capabilities::traits::CollectedMetrics;
use crate::domain::models::content::ApprovedContent;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 跟踪周期枚举
///
/// 发布成功后在三个固定延迟点各执行一次性能跟踪。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingPeriod {
    /// 发布后24小时
    Hours24,
    /// 发布后7天
    Days7,
    /// 发布后30天
    Days30,
}

impl TrackingPeriod {
    /// 全部跟踪周期，按时间先后排序
    pub fn all() -> [TrackingPeriod; 3] {
        [
            TrackingPeriod::Hours24,
            TrackingPeriod::Days7,
            TrackingPeriod::Days30,
        ]
    }

    /// 相对发布时间的延迟
    pub fn delay(&self) -> Duration {
        match self {
            TrackingPeriod::Hours24 => Duration::hours(24),
            TrackingPeriod::Days7 => Duration::days(7),
            TrackingPeriod::Days30 => Duration::days(30),
        }
    }
}

impl fmt::Display for TrackingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackingPeriod::Hours24 => write!(f, "24h"),
            TrackingPeriod::Days7 => write!(f, "7d"),
            TrackingPeriod::Days30 => write!(f, "30d"),
        }
    }
}

impl FromStr for TrackingPeriod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(TrackingPeriod::Hours24),
            "7d" => Ok(TrackingPeriod::Days7),
            "30d" => Ok(TrackingPeriod::Days30),
            _ => Err(()),
        }
    }
}

/// 互动指标
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngagementMetrics {
    /// 浏览量
    pub views: u64,
    /// 评论数
    pub comments: u64,
    /// 分享数
    pub shares: u64,
    /// 互动率
    pub engagement_rate: f64,
    /// 平均页面停留时长（秒）
    pub avg_time_on_page: f64,
}

/// SEO指标
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SeoMetrics {
    /// 自然流量
    pub organic_traffic: u64,
    /// 点击率
    pub click_through_rate: f64,
    /// 跳出率
    pub bounce_rate: f64,
}

/// 单次跟踪快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    /// 跟踪周期
    pub period: TrackingPeriod,
    /// 跟踪时间
    pub tracked_at: DateTime<Utc>,
    /// 当时的互动指标
    pub metrics: EngagementMetrics,
}

/// 内容性能记录
///
/// 发布成功时创建，每次跟踪覆盖当前指标并追加历史快照，
/// 只会因TTL过期消失，不会被删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPerformanceMetrics {
    /// 内容ID
    pub content_id: Uuid,
    /// 目标站点上的文章ID
    pub external_post_id: String,
    /// 发布后的URL
    pub published_url: String,
    /// 发布时间
    pub published_at: DateTime<Utc>,
    /// 当前互动指标
    pub current_metrics: EngagementMetrics,
    /// 当前SEO指标
    pub seo_metrics: SeoMetrics,
    /// 内容质量分
    pub quality_score: f64,
    /// AI提供方
    pub ai_provider: String,
    /// 按周期排列的跟踪历史
    pub tracking_history: Vec<TrackingSnapshot>,
    /// 最近一次跟踪时间
    pub last_tracked_at: Option<DateTime<Utc>>,
}

impl ContentPerformanceMetrics {
    /// 创建发布时的初始记录
    pub fn new(
        content_id: Uuid,
        external_post_id: String,
        published_url: String,
        published_at: DateTime<Utc>,
        quality_score: f64,
        ai_provider: String,
    ) -> Self {
        Self {
            content_id,
            external_post_id,
            published_url,
            published_at,
            current_metrics: EngagementMetrics::default(),
            seo_metrics: SeoMetrics::default(),
            quality_score,
            ai_provider,
            tracking_history: Vec::new(),
            last_tracked_at: None,
        }
    }

    /// 指定周期是否已跟踪过
    pub fn has_tracked(&self, period: TrackingPeriod) -> bool {
        self.tracking_history.iter().any(|s| s.period == period)
    }

    /// 应用一次采集结果
    ///
    /// 对同一周期幂等：重复调用不会追加第二条历史快照。
    pub fn apply_collection(&mut self, period: TrackingPeriod, collected: &CollectedMetrics) {
        let metrics = EngagementMetrics {
            views: collected.views,
            comments: collected.comments,
            shares: collected.shares,
            engagement_rate: collected.engagement_rate,
            avg_time_on_page: collected.avg_time_on_page,
        };
        self.current_metrics = metrics;
        self.seo_metrics = SeoMetrics {
            organic_traffic: collected.organic_traffic,
            click_through_rate: collected.click_through_rate,
            bounce_rate: collected.bounce_rate,
        };
        if !self.has_tracked(period) {
            self.tracking_history.push(TrackingSnapshot {
                period,
                tracked_at: Utc::now(),
                metrics,
            });
        }
        self.last_tracked_at = Some(Utc::now());
    }

    /// 判断内容是否属于高表现
    pub fn is_high_performing(&self) -> bool {
        self.current_metrics.views > 500
            && self.current_metrics.engagement_rate > 0.05
            && self.quality_score > 80.0
    }

    /// 推导质量评级，范围[0,10]
    ///
    /// 基础分5分，浏览量加成0-3分，互动率加成0-2分。
    pub fn quality_rating(&self) -> f64 {
        let views = self.current_metrics.views;
        let views_bonus = if views >= 1000 {
            3.0
        } else if views >= 500 {
            2.0
        } else if views >= 200 {
            1.0
        } else {
            0.0
        };

        let engagement = self.current_metrics.engagement_rate;
        let engagement_bonus = if engagement >= 0.08 {
            2.0
        } else if engagement >= 0.05 {
            1.0
        } else {
            0.0
        };

        (5.0_f64 + views_bonus + engagement_bonus).clamp(0.0, 10.0)
    }
}

/// 微调数据集条目
///
/// 高表现内容连同其产出指标进入微调数据集；数据集只追加，
/// 条目加入后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineTuningEntry {
    /// 内容ID
    pub content_id: Uuid,
    /// 触发收录的跟踪周期，与content_id共同构成去重键
    pub period: TrackingPeriod,
    /// 内容快照
    pub content: ApprovedContent,
    /// 性能记录快照
    pub performance: ContentPerformanceMetrics,
    /// 质量评级，范围[0,10]
    pub quality_rating: f64,
    /// 加入时间
    pub added_at: DateTime<Utc>,
}
