// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::capabilities::traits::Publisher;
use crate::domain::models::publishing_job::{
    AutomatedPublishingJob, PublishingResult, PublishingSettings,
};
use crate::domain::repositories::job_store::{JobLockRegistry, JobStore};
use crate::queue::scheduler::TaskScheduler;
use crate::queue::task_queue::{QueuedTask, TaskKind, TaskQueue};
use crate::utils::errors::OrchestrationError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// 发布任务负载
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishingTaskPayload {
    /// 所属发布作业ID
    pub publishing_job_id: Uuid,
    /// 待发布内容ID
    pub content_id: Uuid,
    /// 队列任务ID，写入发布结果
    pub task_id: Uuid,
}

/// 自动发布编排服务
///
/// 为每篇已审核内容派发一个发布任务，按内容顺序错峰入队，
/// 聚合发布结果。连通性预检查在任何任务入队之前执行一次，
/// 失败时整个作业中止。
pub struct AutomatedPublishingService<Q: TaskQueue> {
    publisher: Arc<dyn Publisher>,
    store: Arc<dyn JobStore<AutomatedPublishingJob>>,
    locks: Arc<JobLockRegistry>,
    scheduler: Arc<TaskScheduler<Q>>,
    /// 作业记录TTL
    job_ttl: std::time::Duration,
}

impl<Q: TaskQueue> AutomatedPublishingService<Q> {
    /// 创建新的自动发布编排服务实例
    pub fn new(
        publisher: Arc<dyn Publisher>,
        store: Arc<dyn JobStore<AutomatedPublishingJob>>,
        locks: Arc<JobLockRegistry>,
        scheduler: Arc<TaskScheduler<Q>>,
        job_ttl: std::time::Duration,
    ) -> Self {
        Self {
            publisher,
            store,
            locks,
            scheduler,
            job_ttl,
        }
    }

    /// 调度自动发布作业
    ///
    /// 任务i的派发延迟为 i × delay_between_posts。
    pub async fn schedule_automated_publishing(
        &self,
        content_ids: Vec<Uuid>,
        credentials_id: String,
        settings: PublishingSettings,
    ) -> Result<Uuid, OrchestrationError> {
        if content_ids.is_empty() {
            return Err(OrchestrationError::Validation(
                "content id list is empty".to_string(),
            ));
        }
        settings
            .validate()
            .map_err(|e| OrchestrationError::Validation(e.to_string()))?;

        // 单次前置连通性检查，失败时作业整体中止，不入队任何任务
        self.publisher.check_connection(&credentials_id).await?;

        let job = AutomatedPublishingJob::new(content_ids, credentials_id, settings);
        self.store.put(job.id, &job, self.job_ttl).await?;

        let delay_step = Duration::milliseconds(job.settings.delay_between_posts_ms);
        for (index, content_id) in job.content_ids.iter().enumerate() {
            let task_id = Uuid::new_v4();
            let payload = serde_json::to_value(PublishingTaskPayload {
                publishing_job_id: job.id,
                content_id: *content_id,
                task_id,
            })
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;

            let queued = QueuedTask::new(TaskKind::Publishing, job.id, payload, index as i32);
            self.scheduler
                .schedule_in(queued, delay_step * index as i32)
                .await?;
        }

        metrics::counter!("publishing_jobs_created_total").increment(1);
        info!(
            job_id = %job.id,
            items = job.content_ids.len(),
            "Automated publishing job scheduled"
        );
        Ok(job.id)
    }

    /// 查询发布作业状态
    pub async fn get_publishing_job_status(
        &self,
        job_id: Uuid,
    ) -> Result<AutomatedPublishingJob, OrchestrationError> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound(format!("publishing job {}", job_id)))
    }

    /// 取出发布作业的全部结果
    pub async fn get_publishing_job_results(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<PublishingResult>, OrchestrationError> {
        let job = self.get_publishing_job_status(job_id).await?;
        Ok(job.results)
    }

    /// 取消发布作业
    pub async fn cancel_publishing_job(&self, job_id: Uuid) -> Result<(), OrchestrationError> {
        let lock = self.locks.lock_for(job_id);
        let _guard = lock.lock().await;

        let mut job = self.get_publishing_job_status(job_id).await?;
        job.cancel().map_err(|_| {
            OrchestrationError::InvalidState(format!("publishing job {} is already terminal", job_id))
        })?;
        self.store.put(job_id, &job, self.job_ttl).await?;

        info!(job_id = %job_id, "Publishing job cancelled");
        Ok(())
    }

    /// 认领一个发布任务
    ///
    /// 返回作业快照供工作器解析目标站点与发布参数；作业已
    /// 取消或已过期时返回None，调用方丢弃该队列条目。
    pub async fn begin_task(
        &self,
        job_id: Uuid,
    ) -> Result<Option<AutomatedPublishingJob>, OrchestrationError> {
        let lock = self.locks.lock_for(job_id);
        let _guard = lock.lock().await;

        let mut job = match self.store.get(job_id).await? {
            Some(job) => job,
            None => {
                warn!(job_id = %job_id, "Publishing job missing or expired, dropping task");
                return Ok(None);
            }
        };

        if job.mark_task_started().is_err() {
            info!(job_id = %job_id, "Publishing job not active, dropping task");
            return Ok(None);
        }
        self.store.put(job_id, &job, self.job_ttl).await?;
        Ok(Some(job))
    }

    /// 记录一个发布任务的结果
    pub async fn apply_result(
        &self,
        job_id: Uuid,
        result: PublishingResult,
    ) -> Result<(), OrchestrationError> {
        let lock = self.locks.lock_for(job_id);
        let _guard = lock.lock().await;

        let mut job = match self.store.get(job_id).await? {
            Some(job) => job,
            None => return Ok(()),
        };
        let success = result.success;
        job.apply_result(result)
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
        self.store.put(job_id, &job, self.job_ttl).await?;
        if job.status.is_terminal() {
            self.locks.release(job_id);
        }

        if success {
            metrics::counter!("publish_tasks_succeeded_total").increment(1);
        } else {
            metrics::counter!("publish_tasks_failed_total").increment(1);
        }
        Ok(())
    }
}
