// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::content::{GeneratedContent, SourceDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，状态只允许向前推进
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 进度计数违反不变量 completed + failed <= total
    #[error("Progress invariant violated: completed={completed} failed={failed} total={total}")]
    ProgressInvariant {
        completed: u32,
        failed: u32,
        total: u32,
    },

    /// 任务不属于该作业
    #[error("Unknown task: {0}")]
    UnknownTask(Uuid),
}

/// 内容质量要求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContentRequirements {
    /// 唯一性阈值，低于该值的生成结果被判为确定性失败
    #[validate(range(min = 0.0, max = 1.0))]
    pub uniqueness_threshold: f64,
    /// 目标词数
    #[validate(range(min = 100))]
    pub target_word_count: u32,
}

impl Default for ContentRequirements {
    fn default() -> Self {
        Self {
            uniqueness_threshold: 0.7,
            target_word_count: 1200,
        }
    }
}

/// 批量生成设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerationSettings {
    /// 目标生成条数
    #[validate(range(min = 1, max = 100))]
    pub target_count: u32,
    /// 品牌语气
    pub brand_voice: String,
    /// 目标受众
    pub target_audience: String,
    /// 内容类型
    pub content_type: String,
    /// 质量要求
    #[validate(nested)]
    pub requirements: ContentRequirements,
    /// 偏好的AI提供方
    pub provider_preference: Option<String>,
}

/// 生成任务状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Processing → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 待处理
    #[default]
    Pending,
    /// 处理中
    Processing,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 生成任务实体
///
/// 一个批量作业拆分出的最小调度单元，独占归属于其批量作业。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 所属批量作业ID
    pub batch_job_id: Uuid,
    /// 分配到的源文档组，永不为空
    pub source_group: Vec<SourceDocument>,
    /// 设置快照
    pub settings: GenerationSettings,
    /// 优先级，数值越小越先派发
    pub priority: i32,
    /// 任务状态
    pub status: TaskStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 开始执行时间
    pub started_at: Option<DateTime<Utc>>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 生成结果
    pub result: Option<GeneratedContent>,
    /// 失败原因
    pub error: Option<String>,
}

impl GenerationTask {
    /// 创建一个新的生成任务
    pub fn new(
        batch_job_id: Uuid,
        source_group: Vec<SourceDocument>,
        settings: GenerationSettings,
        priority: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_job_id,
            source_group,
            settings,
            priority,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}

/// 批量作业状态枚举
///
/// 状态只向前推进：Pending → Processing → 终态。
/// 全部任务成功进入Completed，存在失败进入CompletedWithErrors。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// 待处理
    #[default]
    Pending,
    /// 处理中
    Processing,
    /// 已完成
    Completed,
    /// 带错误完成
    CompletedWithErrors,
    /// 已失败
    Failed,
    /// 已取消
    Cancelled,
}

impl BatchStatus {
    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed
                | BatchStatus::CompletedWithErrors
                | BatchStatus::Failed
                | BatchStatus::Cancelled
        )
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BatchStatus::Pending => write!(f, "pending"),
            BatchStatus::Processing => write!(f, "processing"),
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::CompletedWithErrors => write!(f, "completed_with_errors"),
            BatchStatus::Failed => write!(f, "failed"),
            BatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BatchStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BatchStatus::Pending),
            "processing" => Ok(BatchStatus::Processing),
            "completed" => Ok(BatchStatus::Completed),
            "completed_with_errors" => Ok(BatchStatus::CompletedWithErrors),
            "failed" => Ok(BatchStatus::Failed),
            "cancelled" => Ok(BatchStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 作业进度
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobProgress {
    /// 任务总数
    pub total: u32,
    /// 已完成数
    pub completed: u32,
    /// 已失败数
    pub failed: u32,
    /// 处理中数
    pub processing: u32,
    /// 完成百分比，round((completed+failed)/total*100)
    pub percentage: u8,
    /// 当前阶段描述
    pub current_stage: String,
    /// 预计剩余时间（毫秒）
    pub estimated_time_remaining_ms: Option<i64>,
}

impl JobProgress {
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
        self.completed + self.failed
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

/// 批量生成作业实体
///
/// 将一个研究结果集拆分为N个生成任务的聚合根。所有进度
/// 变更都必须经由聚合方法，保证计数不变量与状态单调推进。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchGenerationJob {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 来源研究作业ID
    pub research_job_id: Uuid,
    /// 生成设置
    pub settings: GenerationSettings,
    /// 作业状态
    pub status: BatchStatus,
    /// 进度
    pub progress: JobProgress,
    /// 有序任务列表
    pub tasks: Vec<GenerationTask>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchGenerationJob {
    /// 创建一个新的批量生成作业
    pub fn new(research_job_id: Uuid, settings: GenerationSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            research_job_id,
            settings,
            status: BatchStatus::Pending,
            progress: JobProgress::default(),
            tasks: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// 挂载任务列表并初始化进度
    pub fn attach_tasks(&mut self, tasks: Vec<GenerationTask>) {
        self.progress = JobProgress::with_total(tasks.len() as u32);
        self.tasks = tasks;
    }

    /// 标记任务开始执行
    ///
    /// 作业取消后拒绝启动新任务。至少一次投递语义下同一任务
    /// 可能被重复认领：已处于处理中的任务直接放行，不重复
    /// 计数。
    pub fn mark_task_started(&mut self, task_id: Uuid) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition);
        }
        let task = self.task_mut(task_id)?;
        match task.status {
            TaskStatus::Pending => {
                task.status = TaskStatus::Processing;
                task.started_at = Some(Utc::now());
                self.progress.processing += 1;
            }
            TaskStatus::Processing => return Ok(()),
            _ => return Err(DomainError::InvalidStateTransition),
        }
        if self.status == BatchStatus::Pending {
            self.status = BatchStatus::Processing;
        }
        self.progress.current_stage = "generating".to_string();
        Ok(())
    }

    /// 记录任务成功
    ///
    /// 作业已取消时结果被丢弃，不再计入进度。
    pub fn apply_task_success(
        &mut self,
        task_id: Uuid,
        content: GeneratedContent,
    ) -> Result<(), DomainError> {
        if self.status == BatchStatus::Cancelled {
            return Ok(());
        }
        self.guard_counters()?;
        let task = self.task_mut(task_id)?;
        task.status = TaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        task.result = Some(content);
        task.error = None;
        self.progress.completed += 1;
        self.progress.processing = self.progress.processing.saturating_sub(1);
        self.after_progress_change();
        Ok(())
    }

    /// 记录任务失败
    pub fn apply_task_failure(&mut self, task_id: Uuid, error: String) -> Result<(), DomainError> {
        if self.status == BatchStatus::Cancelled {
            return Ok(());
        }
        self.guard_counters()?;
        let task = self.task_mut(task_id)?;
        task.status = TaskStatus::Failed;
        task.completed_at = Some(Utc::now());
        task.error = Some(error);
        self.progress.failed += 1;
        self.progress.processing = self.progress.processing.saturating_sub(1);
        self.after_progress_change();
        Ok(())
    }

    /// 取消作业
    ///
    /// 已终结的作业不可取消；取消后后续任务结果被丢弃。
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition);
        }
        self.status = BatchStatus::Cancelled;
        self.completed_at = Some(Utc::now());
        self.progress.current_stage = "cancelled".to_string();
        self.progress.estimated_time_remaining_ms = None;
        Ok(())
    }

    /// 作业是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.status == BatchStatus::Cancelled
    }

    /// 取出已成功任务的生成结果
    pub fn results(&self) -> Vec<&GeneratedContent> {
        self.tasks.iter().filter_map(|t| t.result.as_ref()).collect()
    }

    fn task_mut(&mut self, task_id: Uuid) -> Result<&mut GenerationTask, DomainError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(DomainError::UnknownTask(task_id))
    }

    fn guard_counters(&self) -> Result<(), DomainError> {
        if self.progress.finished() >= self.progress.total {
            return Err(DomainError::ProgressInvariant {
                completed: self.progress.completed,
                failed: self.progress.failed,
                total: self.progress.total,
            });
        }
        Ok(())
    }

    fn after_progress_change(&mut self) {
        self.progress.recompute_percentage();
        self.update_estimate();

        if self.progress.finished() == self.progress.total && !self.status.is_terminal() {
            self.status = if self.progress.failed == 0 {
                BatchStatus::Completed
            } else {
                BatchStatus::CompletedWithErrors
            };
            // completed_at只设置一次
            if self.completed_at.is_none() {
                self.completed_at = Some(Utc::now());
            }
            self.progress.current_stage = "finished".to_string();
            self.progress.estimated_time_remaining_ms = None;
        }
    }

    fn update_estimate(&mut self) {
        let finished = self.progress.finished();
        if finished == 0 || finished >= self.progress.total {
            return;
        }
        let elapsed_ms = (Utc::now() - self.created_at).num_milliseconds().max(0);
        let per_task = elapsed_ms as f64 / finished as f64;
        let remaining = (self.progress.total - finished) as f64;
        self.progress.estimated_time_remaining_ms = Some((per_task * remaining) as i64);
    }
}

#[cfg(test)]
#[path = "batch_job_test.rs"]
mod tests;
