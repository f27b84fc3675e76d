// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::capabilities::traits::{
    ApprovedContentStore, PublishOptions, PublishReceipt, Publisher,
};
use crate::domain::models::content::ApprovedContent;
use crate::domain::models::performance::{ContentPerformanceMetrics, TrackingPeriod};
use crate::domain::models::publishing_job::{AutomatedPublishingJob, PublishingResult};
use crate::domain::models::site::RoutingRequest;
use crate::domain::repositories::job_store::JobStore;
use crate::domain::services::performance_service::TrackingTaskPayload;
use crate::domain::services::publishing_service::{
    AutomatedPublishingService, PublishingTaskPayload,
};
use crate::domain::services::routing_service::RoutingService;
use crate::queue::scheduler::TaskScheduler;
use crate::queue::task_queue::{QueuedTask, TaskKind, TaskQueue};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 站点发布工作器
///
/// 从发布队列拉取任务：查询已审核内容、经路由决定目标站点、
/// 调用发布能力，并在成功后安排三个延迟点的性能跟踪任务。
pub struct PublishingWorker<Q: TaskQueue> {
    service: Arc<AutomatedPublishingService<Q>>,
    publisher: Arc<dyn Publisher>,
    content_store: Arc<dyn ApprovedContentStore>,
    router: Arc<RoutingService>,
    metrics_store: Arc<dyn JobStore<ContentPerformanceMetrics>>,
    scheduler: Arc<TaskScheduler<Q>>,
    /// 性能记录TTL
    metrics_ttl: Duration,
    worker_id: Uuid,
}

impl<Q: TaskQueue> PublishingWorker<Q> {
    /// 创建新的站点发布工作器实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: Arc<AutomatedPublishingService<Q>>,
        publisher: Arc<dyn Publisher>,
        content_store: Arc<dyn ApprovedContentStore>,
        router: Arc<RoutingService>,
        metrics_store: Arc<dyn JobStore<ContentPerformanceMetrics>>,
        scheduler: Arc<TaskScheduler<Q>>,
        metrics_ttl: Duration,
    ) -> Self {
        Self {
            service,
            publisher,
            content_store,
            router,
            metrics_store,
            scheduler,
            metrics_ttl,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 运行工作器循环
    pub async fn run(&self, queue: Arc<Q>) {
        info!("Publishing worker {} started", self.worker_id);

        loop {
            match queue.dequeue(TaskKind::Publishing).await {
                Ok(Some(task)) => {
                    if let Err(e) = self.process_task(task).await {
                        error!("Error processing publish task: {}", e);
                    }
                }
                Ok(None) => sleep(Duration::from_secs(1)).await,
                Err(e) => {
                    error!("Error dequeuing publish task: {}", e);
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    #[instrument(skip(self, queued), fields(task_id = %queued.id, job_id = %queued.job_id))]
    async fn process_task(&self, queued: QueuedTask) -> Result<()> {
        let payload: PublishingTaskPayload = match serde_json::from_value(queued.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Malformed publish payload, dropping task: {}", e);
                return Ok(());
            }
        };

        let job = match self.service.begin_task(payload.publishing_job_id).await? {
            Some(job) => job,
            None => return Ok(()),
        };

        let result = self.publish_one(&job, &payload).await;
        self.service
            .apply_result(payload.publishing_job_id, result)
            .await?;
        Ok(())
    }

    /// 发布单篇内容
    ///
    /// 无论成败都产出一条PublishingResult；失败不会中止同一
    /// 作业的其余任务。
    async fn publish_one(
        &self,
        job: &AutomatedPublishingJob,
        payload: &PublishingTaskPayload,
    ) -> PublishingResult {
        let content = match self.content_store.get_by_id(payload.content_id).await {
            Ok(Some(content)) if content.approved => content,
            Ok(_) => {
                return self.failure(payload, None, "content missing or not approved");
            }
            Err(e) => {
                return self.failure(payload, None, &e.to_string());
            }
        };

        let routing_request =
            RoutingRequest::from_content(&content, job.settings.target_site_id.clone());
        let site = match self.router.determine_target_site(&routing_request) {
            Ok(site) => site,
            Err(e) => {
                return self.failure(payload, None, &e.to_string());
            }
        };

        let options = PublishOptions {
            status: job.settings.status.clone(),
            categories: job.settings.categories.clone(),
            tags: job.settings.tags.clone(),
            scheduled_date: job.settings.scheduled_date,
        };

        match self.publisher.publish(&content, &site, &options).await {
            Ok(receipt) => {
                info!(
                    content_id = %content.id,
                    site_id = %site.id,
                    external_id = %receipt.external_id,
                    "Content published"
                );
                let tracking_enabled = job.settings.enable_performance_tracking;
                if tracking_enabled {
                    if let Err(e) = self.schedule_tracking(job, &content, &receipt).await {
                        // 跟踪排期失败不回滚已成功的发布
                        warn!(content_id = %content.id, "Failed to schedule tracking: {}", e);
                    }
                }
                PublishingResult {
                    task_id: payload.task_id,
                    content_id: payload.content_id,
                    success: true,
                    site_id: Some(site.id),
                    external_id: Some(receipt.external_id),
                    external_url: Some(receipt.external_url),
                    error: None,
                    published_at: Some(receipt.published_at),
                    performance_tracking_enabled: tracking_enabled,
                }
            }
            Err(e) => {
                warn!(content_id = %content.id, "Publish failed: {}", e);
                self.failure(payload, Some(site.id), &e.to_string())
            }
        }
    }

    /// 创建性能记录并安排24h/7d/30d三次跟踪
    async fn schedule_tracking(
        &self,
        job: &AutomatedPublishingJob,
        content: &ApprovedContent,
        receipt: &PublishReceipt,
    ) -> Result<()> {
        let record = ContentPerformanceMetrics::new(
            content.id,
            receipt.external_id.clone(),
            receipt.external_url.clone(),
            receipt.published_at,
            content.quality_score,
            content
                .ai_provider
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        );
        self.metrics_store
            .put(content.id, &record, self.metrics_ttl)
            .await?;

        for period in TrackingPeriod::all() {
            let payload = serde_json::to_value(TrackingTaskPayload {
                content_id: content.id,
                external_post_id: receipt.external_id.clone(),
                period,
            })?;
            let task = QueuedTask::new(TaskKind::Tracking, job.id, payload, 0);
            self.scheduler
                .schedule_at(task, receipt.published_at + period.delay())
                .await?;
        }
        Ok(())
    }

    fn failure(
        &self,
        payload: &PublishingTaskPayload,
        site_id: Option<String>,
        error: &str,
    ) -> PublishingResult {
        PublishingResult {
            task_id: payload.task_id,
            content_id: payload.content_id,
            success: false,
            site_id,
            external_id: None,
            external_url: None,
            error: Some(error.to_string()),
            published_at: None,
            performance_tracking_enabled: false,
        }
    }
}
