// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::batch_job::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// 自动发布设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublishingSettings {
    /// 发布状态（publish或draft）
    pub status: String,
    /// 分类
    pub categories: Vec<String>,
    /// 标签
    pub tags: Vec<String>,
    /// 相邻两次发布之间的间隔（毫秒），限制在10秒到5分钟之间
    #[validate(range(min = 10_000, max = 300_000))]
    pub delay_between_posts_ms: i64,
    /// 是否启用发布后性能跟踪
    pub enable_performance_tracking: bool,
    /// 是否启用自动优化
    pub auto_optimization: bool,
    /// 定时发布时间
    pub scheduled_date: Option<DateTime<Utc>>,
    /// 显式指定的目标站点，为空时由路由决定
    pub target_site_id: Option<String>,
}

/// 发布结果
///
/// 每个发布任务无论成败都会产生一条记录，作业查询时
/// 始终能看到成功子集。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingResult {
    /// 任务唯一标识符
    pub task_id: Uuid,
    /// 内容ID
    pub content_id: Uuid,
    /// 是否成功
    pub success: bool,
    /// 目标站点ID
    pub site_id: Option<String>,
    /// 目标站点上的文章ID
    pub external_id: Option<String>,
    /// 发布后的URL
    pub external_url: Option<String>,
    /// 失败原因
    pub error: Option<String>,
    /// 发布时间
    pub published_at: Option<DateTime<Utc>>,
    /// 是否已安排性能跟踪
    pub performance_tracking_enabled: bool,
}

/// 发布作业状态枚举
///
/// 状态只向前推进：Pending → Processing → 终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    /// 待处理
    #[default]
    Pending,
    /// 处理中
    Processing,
    /// 已完成
    Completed,
    /// 部分完成
    PartiallyCompleted,
    /// 已失败
    Failed,
    /// 已取消
    Cancelled,
}

impl PublishingStatus {
    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PublishingStatus::Completed
                | PublishingStatus::PartiallyCompleted
                | PublishingStatus::Failed
                | PublishingStatus::Cancelled
        )
    }
}

impl fmt::Display for PublishingStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PublishingStatus::Pending => write!(f, "pending"),
            PublishingStatus::Processing => write!(f, "processing"),
            PublishingStatus::Completed => write!(f, "completed"),
            PublishingStatus::PartiallyCompleted => write!(f, "partially_completed"),
            PublishingStatus::Failed => write!(f, "failed"),
            PublishingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for PublishingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PublishingStatus::Pending),
            "processing" => Ok(PublishingStatus::Processing),
            "completed" => Ok(PublishingStatus::Completed),
            "partially_completed" => Ok(PublishingStatus::PartiallyCompleted),
            "failed" => Ok(PublishingStatus::Failed),
            "cancelled" => Ok(PublishingStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 发布进度
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishingProgress {
    /// 任务总数
    pub total: u32,
    /// 已发布数
    pub published: u32,
    /// 已失败数
    pub failed: u32,
    /// 处理中数
    pub processing: u32,
    /// 完成百分比，round((published+failed)/total*100)
    pub percentage: u8,
    /// 当前阶段描述
    pub current_stage: String,
}

impl PublishingProgress {
    /// 创建指定总数的初始进度
    pub fn with_total(total: u32) -> Self {
        Self {
            total,
            current_stage: "queued".to_string(),
            ..Default::default()
        }
    }

    /// 已结束的任务数
    pub fn finished(&self) -> u32 {
        self.published + self.failed
    }

    /// 重新计算完成百分比
    pub fn recompute_percentage(&mut self) {
        self.percentage = if self.total == 0 {
            0
        } else {
            ((self.finished() as f64 / self.total as f64) * 100.0).round() as u8
        };
    }
}

/// 自动发布作业实体
///
/// 按内容顺序错峰派发发布任务的聚合根，进度变更规则与
/// 批量生成作业一致。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatedPublishingJob {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 待发布内容ID列表，保持调用方给定的顺序
    pub content_ids: Vec<Uuid>,
    /// 发布凭证引用
    pub credentials_id: String,
    /// 发布设置
    pub settings: PublishingSettings,
    /// 作业状态
    pub status: PublishingStatus,
    /// 进度
    pub progress: PublishingProgress,
    /// 有序结果列表
    pub results: Vec<PublishingResult>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
}

impl AutomatedPublishingJob {
    /// 创建一个新的自动发布作业
    pub fn new(content_ids: Vec<Uuid>, credentials_id: String, settings: PublishingSettings) -> Self {
        let total = content_ids.len() as u32;
        Self {
            id: Uuid::new_v4(),
            content_ids,
            credentials_id,
            settings,
            status: PublishingStatus::Pending,
            progress: PublishingProgress::with_total(total),
            results: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// 标记某个发布任务开始执行
    pub fn mark_task_started(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition);
        }
        self.progress.processing += 1;
        if self.status == PublishingStatus::Pending {
            self.status = PublishingStatus::Processing;
        }
        self.progress.current_stage = "publishing".to_string();
        Ok(())
    }

    /// 记录一个发布任务的结果
    ///
    /// 作业已取消时结果被丢弃，不再计入进度。
    pub fn apply_result(&mut self, result: PublishingResult) -> Result<(), DomainError> {
        if self.status == PublishingStatus::Cancelled {
            return Ok(());
        }
        if self.progress.finished() >= self.progress.total {
            return Err(DomainError::ProgressInvariant {
                completed: self.progress.published,
                failed: self.progress.failed,
                total: self.progress.total,
            });
        }

        if result.success {
            self.progress.published += 1;
        } else {
            self.progress.failed += 1;
        }
        self.progress.processing = self.progress.processing.saturating_sub(1);
        self.results.push(result);
        self.progress.recompute_percentage();

        if self.progress.finished() == self.progress.total && !self.status.is_terminal() {
            self.status = if self.progress.failed == 0 {
                PublishingStatus::Completed
            } else {
                PublishingStatus::PartiallyCompleted
            };
            if self.completed_at.is_none() {
                self.completed_at = Some(Utc::now());
            }
            self.progress.current_stage = "finished".to_string();
        }
        Ok(())
    }

    /// 取消作业
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition);
        }
        self.status = PublishingStatus::Cancelled;
        self.completed_at = Some(Utc::now());
        self.progress.current_stage = "cancelled".to_string();
        Ok(())
    }

    /// 作业是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.status == PublishingStatus::Cancelled
    }

    /// 取出成功的发布结果
    pub fn successful_results(&self) -> Vec<&PublishingResult> {
        self.results.iter().filter(|r| r.success).collect()
    }
}
