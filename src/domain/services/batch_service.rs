// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::capabilities::traits::ResearchProvider;
use crate::domain::models::batch_job::{
    BatchGenerationJob, GenerationSettings, GenerationTask,
};
use crate::domain::models::content::{GeneratedContent, ResearchStatus, SourceDocument};
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

/// 生成任务负载
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationTaskPayload {
    /// 所属批量作业ID
    pub batch_job_id: Uuid,
    /// 生成任务ID
    pub task_id: Uuid,
}

/// 批量生成编排服务
///
/// 将一个已完成的研究结果集拆分为N个生成任务并错峰入队，
/// 聚合各任务的完成进度。同一作业的全部进度变更经由作业级
/// 互斥锁串行化。
pub struct BatchGenerationService<Q: TaskQueue> {
    research: Arc<dyn ResearchProvider>,
    store: Arc<dyn JobStore<BatchGenerationJob>>,
    locks: Arc<JobLockRegistry>,
    scheduler: Arc<TaskScheduler<Q>>,
    /// 相邻任务派发间隔
    stagger: Duration,
    /// 作业记录TTL
    job_ttl: std::time::Duration,
}

impl<Q: TaskQueue> BatchGenerationService<Q> {
    /// 创建新的批量生成编排服务实例
    pub fn new(
        research: Arc<dyn ResearchProvider>,
        store: Arc<dyn JobStore<BatchGenerationJob>>,
        locks: Arc<JobLockRegistry>,
        scheduler: Arc<TaskScheduler<Q>>,
        stagger: Duration,
        job_ttl: std::time::Duration,
    ) -> Self {
        Self {
            research,
            store,
            locks,
            scheduler,
            stagger,
            job_ttl,
        }
    }

    /// 创建批量生成作业
    ///
    /// 校验研究作业状态，切分源文档，持久化作业并错峰入队
    /// 全部生成任务。任务i的派发延迟为 i × stagger。
    pub async fn create_batch_job(
        &self,
        research_job_id: Uuid,
        settings: GenerationSettings,
    ) -> Result<Uuid, OrchestrationError> {
        settings
            .validate()
            .map_err(|e| OrchestrationError::Validation(e.to_string()))?;

        let research_job = self
            .research
            .get_research_job(research_job_id)
            .await?
            .ok_or_else(|| {
                OrchestrationError::NotFound(format!("research job {}", research_job_id))
            })?;

        if research_job.status != ResearchStatus::Completed {
            return Err(OrchestrationError::InvalidState(format!(
                "research job {} is {}, expected completed",
                research_job_id, research_job.status
            )));
        }
        if research_job.sources.is_empty() {
            return Err(OrchestrationError::EmptySource(format!(
                "research job {} has no source documents",
                research_job_id
            )));
        }

        let groups = partition_sources(&research_job.sources, settings.target_count as usize);

        let mut job = BatchGenerationJob::new(research_job_id, settings.clone());
        let tasks: Vec<GenerationTask> = groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                GenerationTask::new(job.id, group, settings.clone(), index as i32)
            })
            .collect();
        job.attach_tasks(tasks);

        self.store.put(job.id, &job, self.job_ttl).await?;

        for task in &job.tasks {
            let payload = serde_json::to_value(GenerationTaskPayload {
                batch_job_id: job.id,
                task_id: task.id,
            })
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;

            let queued = QueuedTask::new(TaskKind::Generation, job.id, payload, task.priority);
            let delay = self.stagger * task.priority;
            self.scheduler.schedule_in(queued, delay).await?;
        }

        metrics::counter!("batch_jobs_created_total").increment(1);
        info!(
            job_id = %job.id,
            tasks = job.tasks.len(),
            "Batch generation job created"
        );
        Ok(job.id)
    }

    /// 查询批量作业状态
    ///
    /// 作业记录过期等同于不存在。
    pub async fn get_batch_job_status(
        &self,
        job_id: Uuid,
    ) -> Result<BatchGenerationJob, OrchestrationError> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound(format!("batch job {}", job_id)))
    }

    /// 取出批量作业的全部生成结果
    pub async fn get_batch_job_results(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<GeneratedContent>, OrchestrationError> {
        let job = self.get_batch_job_status(job_id).await?;
        Ok(job.results().into_iter().cloned().collect())
    }

    /// 取消批量作业
    ///
    /// 已在途的任务会运行到结束，但结果不再计入进度。
    pub async fn cancel_batch_job(&self, job_id: Uuid) -> Result<(), OrchestrationError> {
        let lock = self.locks.lock_for(job_id);
        let _guard = lock.lock().await;

        let mut job = self.get_batch_job_status(job_id).await?;
        job.cancel().map_err(|_| {
            OrchestrationError::InvalidState(format!("batch job {} is already terminal", job_id))
        })?;
        self.store.put(job_id, &job, self.job_ttl).await?;

        info!(job_id = %job_id, "Batch generation job cancelled");
        Ok(())
    }

    /// 认领一个生成任务
    ///
    /// 在作业锁内将任务标记为处理中并返回任务快照。作业已
    /// 取消、已过期或任务状态不允许启动时返回None，调用方
    /// 直接丢弃该队列条目。
    pub async fn begin_task(
        &self,
        job_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<GenerationTask>, OrchestrationError> {
        let lock = self.locks.lock_for(job_id);
        let _guard = lock.lock().await;

        let mut job = match self.store.get(job_id).await? {
            Some(job) => job,
            None => {
                warn!(job_id = %job_id, "Batch job missing or expired, dropping task");
                return Ok(None);
            }
        };

        if job.mark_task_started(task_id).is_err() {
            info!(job_id = %job_id, task_id = %task_id, "Task not startable, dropping");
            return Ok(None);
        }

        let snapshot = job.tasks.iter().find(|t| t.id == task_id).cloned();
        self.store.put(job_id, &job, self.job_ttl).await?;
        Ok(snapshot)
    }

    /// 记录任务成功
    pub async fn complete_task(
        &self,
        job_id: Uuid,
        task_id: Uuid,
        content: GeneratedContent,
    ) -> Result<(), OrchestrationError> {
        let lock = self.locks.lock_for(job_id);
        let _guard = lock.lock().await;

        let mut job = match self.store.get(job_id).await? {
            Some(job) => job,
            None => return Ok(()),
        };
        job.apply_task_success(task_id, content)
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
        self.store.put(job_id, &job, self.job_ttl).await?;
        if job.status.is_terminal() {
            self.locks.release(job_id);
        }

        metrics::counter!("generation_tasks_completed_total").increment(1);
        Ok(())
    }

    /// 记录任务失败
    pub async fn fail_task(
        &self,
        job_id: Uuid,
        task_id: Uuid,
        error: String,
    ) -> Result<(), OrchestrationError> {
        let lock = self.locks.lock_for(job_id);
        let _guard = lock.lock().await;

        let mut job = match self.store.get(job_id).await? {
            Some(job) => job,
            None => return Ok(()),
        };
        job.apply_task_failure(task_id, error)
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
        self.store.put(job_id, &job, self.job_ttl).await?;
        if job.status.is_terminal() {
            self.locks.release(job_id);
        }

        metrics::counter!("generation_tasks_failed_total").increment(1);
        Ok(())
    }
}

/// 切分源文档集
///
/// 以轮转方式把源文档分发到target_count个组；源数量不足时
/// 用已有源循环回填，保证没有空组，且每个源至少出现在
/// 一个组里。
pub fn partition_sources(
    sources: &[SourceDocument],
    target_count: usize,
) -> Vec<Vec<SourceDocument>> {
    let mut groups: Vec<Vec<SourceDocument>> = vec![Vec::new(); target_count.max(1)];
    let group_count = groups.len();
    for (index, source) in sources.iter().enumerate() {
        groups[index % group_count].push(source.clone());
    }
    for (index, group) in groups.iter_mut().enumerate() {
        if group.is_empty() {
            group.push(sources[index % sources.len()].clone());
        }
    }
    groups
}
