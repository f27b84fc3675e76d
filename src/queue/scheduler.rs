// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::task_queue::{QueueError, QueuedTask, TaskQueue};
use crate::utils::retry_policy::RetryPolicy;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

/// 任务调度器
///
/// 所有延迟与错峰派发都通过条目上的`not_before`时间戳表达，
/// 不使用进程内定时器，后端可持久化时重启后调度依然成立。
pub struct TaskScheduler<Q: TaskQueue> {
    /// 任务队列
    queue: Arc<Q>,
}

impl<Q: TaskQueue> TaskScheduler<Q> {
    /// 创建新的任务调度器实例
    pub fn new(queue: Arc<Q>) -> Self {
        Self { queue }
    }

    /// 立即调度任务执行
    pub async fn schedule_now(&self, task: QueuedTask) -> Result<(), QueueError> {
        self.queue.enqueue(task).await
    }

    /// 在特定时间调度任务执行
    pub async fn schedule_at(
        &self,
        mut task: QueuedTask,
        time: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        task.not_before = Some(time);
        self.queue.enqueue(task).await
    }

    /// 在一段时间后调度任务执行
    pub async fn schedule_in(&self, task: QueuedTask, delay: Duration) -> Result<(), QueueError> {
        let time = Utc::now() + delay;
        self.schedule_at(task, time).await
    }

    /// 按重试策略重新调度失败的任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已按退避时间重新入队
    /// * `Ok(false)` - 重试次数耗尽，任务不再入队
    pub async fn reschedule_retry(
        &self,
        mut task: QueuedTask,
        policy: &RetryPolicy,
    ) -> Result<bool, QueueError> {
        task.attempt_count += 1;
        if task.attempt_count > task.max_retries {
            return Ok(false);
        }

        let next_at = policy.next_retry_time(task.attempt_count, Utc::now());
        info!(
            task_id = %task.id,
            attempt = task.attempt_count,
            next_at = %next_at,
            "Rescheduling task for retry"
        );
        task.not_before = Some(next_at);
        self.queue.enqueue(task).await?;
        Ok(true)
    }
}
