// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::capabilities::traits::{ContentGenerator, GenerationRequest};
use crate::domain::models::batch_job::GenerationTask;
use crate::domain::models::content::{ContentMetadata, GeneratedContent, SeoFields};
use crate::domain::services::batch_service::{BatchGenerationService, GenerationTaskPayload};
use crate::domain::services::context_builder::ContextPromptBuilder;
use crate::domain::services::uniqueness::UniquenessValidator;
use crate::queue::scheduler::TaskScheduler;
use crate::queue::task_queue::{QueuedTask, TaskKind, TaskQueue};
use crate::utils::errors::OrchestrationError;
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::text_analysis::{reading_time_minutes, word_count};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 内容生成工作器
///
/// 从生成队列拉取任务：构建上下文提示、调用内容生成能力、
/// 执行唯一性门禁，并把结果写回作业聚合。
pub struct GenerationWorker<Q: TaskQueue> {
    service: Arc<BatchGenerationService<Q>>,
    generator: Arc<dyn ContentGenerator>,
    context_builder: ContextPromptBuilder,
    uniqueness: UniquenessValidator,
    scheduler: Arc<TaskScheduler<Q>>,
    retry_policy: RetryPolicy,
    worker_id: Uuid,
}

impl<Q: TaskQueue> GenerationWorker<Q> {
    /// 创建新的内容生成工作器实例
    pub fn new(
        service: Arc<BatchGenerationService<Q>>,
        generator: Arc<dyn ContentGenerator>,
        context_builder: ContextPromptBuilder,
        scheduler: Arc<TaskScheduler<Q>>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            service,
            generator,
            context_builder,
            uniqueness: UniquenessValidator::new(),
            scheduler,
            retry_policy,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 运行工作器循环
    pub async fn run(&self, queue: Arc<Q>) {
        info!("Generation worker {} started", self.worker_id);

        loop {
            match queue.dequeue(TaskKind::Generation).await {
                Ok(Some(task)) => {
                    if let Err(e) = self.process_task(task).await {
                        error!("Error processing generation task: {}", e);
                    }
                }
                Ok(None) => sleep(Duration::from_secs(1)).await,
                Err(e) => {
                    error!("Error dequeuing generation task: {}", e);
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    #[instrument(skip(self, queued), fields(task_id = %queued.id, job_id = %queued.job_id))]
    async fn process_task(&self, queued: QueuedTask) -> Result<()> {
        let payload: GenerationTaskPayload = match serde_json::from_value(queued.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Malformed generation payload, dropping task: {}", e);
                return Ok(());
            }
        };

        let task = match self
            .service
            .begin_task(payload.batch_job_id, payload.task_id)
            .await?
        {
            Some(task) => task,
            None => return Ok(()),
        };

        match self.generate_content(&task).await {
            Ok(content) => {
                info!(
                    content_id = %content.id,
                    uniqueness = content.uniqueness_score,
                    "Content generated"
                );
                self.service
                    .complete_task(payload.batch_job_id, payload.task_id, content)
                    .await?;
            }
            Err(e) => {
                if self
                    .retry_policy
                    .should_retry_with_error(queued.attempt_count, &e)
                    && self
                        .scheduler
                        .reschedule_retry(queued, &self.retry_policy)
                        .await?
                {
                    info!("Generation task rescheduled after transient error: {}", e);
                    return Ok(());
                }
                warn!("Generation task failed: {}", e);
                self.service
                    .fail_task(payload.batch_job_id, payload.task_id, e.to_string())
                    .await?;
            }
        }
        Ok(())
    }

    /// 为单个任务生成内容
    ///
    /// 唯一性低于阈值是确定性失败：相同输入重试仍会失败，
    /// 因此直接返回不可重试的错误。
    async fn generate_content(
        &self,
        task: &GenerationTask,
    ) -> Result<GeneratedContent, OrchestrationError> {
        let context = self.context_builder.build(&task.source_group);

        let mut context_points = context.best_practices.clone();
        context_points.extend(context.key_insights.clone());

        let request = GenerationRequest {
            topic: context.topic.clone(),
            keywords: context.themes.clone(),
            brand_voice: task.settings.brand_voice.clone(),
            target_audience: task.settings.target_audience.clone(),
            content_type: task.settings.content_type.clone(),
            context_points,
            target_word_count: task.settings.requirements.target_word_count,
            provider_preference: task.settings.provider_preference.clone(),
        };

        let draft = self.generator.generate(&request).await?;

        let score = self.uniqueness.score(&draft.body, &task.source_group);
        let threshold = task.settings.requirements.uniqueness_threshold;
        if score < threshold {
            return Err(OrchestrationError::Uniqueness { score, threshold });
        }

        Ok(GeneratedContent {
            id: Uuid::new_v4(),
            content_type: task.settings.content_type.clone(),
            title: draft.title,
            excerpt: draft.excerpt,
            uniqueness_score: score,
            metadata: ContentMetadata {
                source_urls: task.source_group.iter().map(|s| s.url.clone()).collect(),
                word_count: word_count(&draft.body),
                reading_time_minutes: reading_time_minutes(&draft.body),
                ai_provider: draft.provider,
                seo: SeoFields {
                    meta_description: draft.meta_description,
                    keywords: context.themes.into_iter().take(5).collect(),
                },
            },
            body: draft.body,
            created_at: Utc::now(),
        })
    }
}
