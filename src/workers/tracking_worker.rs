// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::performance_service::{PerformanceTracker, TrackingTaskPayload};
use crate::queue::scheduler::TaskScheduler;
use crate::queue::task_queue::{QueuedTask, TaskKind, TaskQueue};
use crate::utils::retry_policy::RetryPolicy;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 性能跟踪工作器
///
/// 从跟踪队列拉取到期的跟踪任务并委托给性能跟踪服务。
/// 指标采集是瞬时故障多发的外部调用，失败时退避重试。
pub struct TrackingWorker<Q: TaskQueue> {
    tracker: Arc<PerformanceTracker>,
    scheduler: Arc<TaskScheduler<Q>>,
    retry_policy: RetryPolicy,
    worker_id: Uuid,
}

impl<Q: TaskQueue> TrackingWorker<Q> {
    /// 创建新的性能跟踪工作器实例
    pub fn new(
        tracker: Arc<PerformanceTracker>,
        scheduler: Arc<TaskScheduler<Q>>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            tracker,
            scheduler,
            retry_policy,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 运行工作器循环
    pub async fn run(&self, queue: Arc<Q>) {
        info!("Tracking worker {} started", self.worker_id);

        loop {
            match queue.dequeue(TaskKind::Tracking).await {
                Ok(Some(task)) => {
                    if let Err(e) = self.process_task(task).await {
                        error!("Error processing tracking task: {}", e);
                    }
                }
                Ok(None) => sleep(Duration::from_secs(1)).await,
                Err(e) => {
                    error!("Error dequeuing tracking task: {}", e);
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    #[instrument(skip(self, queued), fields(task_id = %queued.id))]
    async fn process_task(&self, queued: QueuedTask) -> Result<()> {
        let payload: TrackingTaskPayload = match serde_json::from_value(queued.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Malformed tracking payload, dropping task: {}", e);
                return Ok(());
            }
        };

        match self
            .tracker
            .track_content_performance(payload.content_id, &payload.external_post_id, payload.period)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                if self
                    .retry_policy
                    .should_retry_with_error(queued.attempt_count, &e)
                    && self
                        .scheduler
                        .reschedule_retry(queued, &self.retry_policy)
                        .await?
                {
                    info!("Tracking task rescheduled after transient error: {}", e);
                    return Ok(());
                }
                // 重试耗尽只损失一个周期的快照，后续周期照常执行
                warn!(
                    content_id = %payload.content_id,
                    period = %payload.period,
                    "Tracking pass abandoned: {}",
                    e
                );
                Ok(())
            }
        }
    }
}
