// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::capabilities::traits::{ApprovedContentStore, MetricsCollector};
use crate::domain::models::performance::{
    ContentPerformanceMetrics, FineTuningEntry, TrackingPeriod,
};
use crate::domain::repositories::dataset_repository::DatasetRepository;
use crate::domain::repositories::job_store::{JobLockRegistry, JobStore};
use crate::utils::errors::OrchestrationError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 跟踪任务负载
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingTaskPayload {
    /// 内容ID
    pub content_id: Uuid,
    /// 目标站点上的文章ID
    pub external_post_id: String,
    /// 跟踪周期
    pub period: TrackingPeriod,
}

/// 性能跟踪服务
///
/// 在发布后的固定延迟点拉取外部指标、更新性能记录，并把
/// 高表现内容收录进微调数据集。对同一(content_id, period)
/// 幂等：跟踪历史与数据集都不会出现重复条目。
pub struct PerformanceTracker {
    collector: Arc<dyn MetricsCollector>,
    content_store: Arc<dyn ApprovedContentStore>,
    metrics_store: Arc<dyn JobStore<ContentPerformanceMetrics>>,
    dataset: Arc<dyn DatasetRepository>,
    locks: Arc<JobLockRegistry>,
    /// 性能记录TTL
    metrics_ttl: std::time::Duration,
}

impl PerformanceTracker {
    /// 创建新的性能跟踪服务实例
    pub fn new(
        collector: Arc<dyn MetricsCollector>,
        content_store: Arc<dyn ApprovedContentStore>,
        metrics_store: Arc<dyn JobStore<ContentPerformanceMetrics>>,
        dataset: Arc<dyn DatasetRepository>,
        locks: Arc<JobLockRegistry>,
        metrics_ttl: std::time::Duration,
    ) -> Self {
        Self {
            collector,
            content_store,
            metrics_store,
            dataset,
            locks,
            metrics_ttl,
        }
    }

    /// 执行一次性能跟踪
    ///
    /// 记录不存在（未创建或已过期）时记一条日志并静默返回，
    /// 不让跟踪作业失败。
    pub async fn track_content_performance(
        &self,
        content_id: Uuid,
        external_post_id: &str,
        period: TrackingPeriod,
    ) -> Result<(), OrchestrationError> {
        let lock = self.locks.lock_for(content_id);
        let _guard = lock.lock().await;

        let mut record = match self.metrics_store.get(content_id).await? {
            Some(record) => record,
            None => {
                warn!(
                    content_id = %content_id,
                    period = %period,
                    "Performance record missing or expired, skipping tracking pass"
                );
                return Ok(());
            }
        };

        let collected = self.collector.fetch(external_post_id).await?;
        record.apply_collection(period, &collected);
        self.metrics_store
            .put(content_id, &record, self.metrics_ttl)
            .await?;

        metrics::counter!("tracking_passes_total", "period" => period.to_string()).increment(1);

        if record.is_high_performing() {
            self.promote(&record, period).await?;
        }
        Ok(())
    }

    /// 读取微调数据集
    pub async fn get_fine_tuning_dataset(
        &self,
        limit: usize,
    ) -> Result<Vec<FineTuningEntry>, OrchestrationError> {
        Ok(self.dataset.list(limit).await?)
    }

    /// 将高表现内容收录进微调数据集
    ///
    /// 数据集按(content_id, period)去重，重复收录是无操作。
    async fn promote(
        &self,
        record: &ContentPerformanceMetrics,
        period: TrackingPeriod,
    ) -> Result<(), OrchestrationError> {
        let content = match self.content_store.get_by_id(record.content_id).await? {
            Some(content) => content,
            None => {
                warn!(
                    content_id = %record.content_id,
                    "Content disappeared before promotion, skipping dataset append"
                );
                return Ok(());
            }
        };

        let entry = FineTuningEntry {
            content_id: record.content_id,
            period,
            content,
            performance: record.clone(),
            quality_rating: record.quality_rating(),
            added_at: Utc::now(),
        };

        if self.dataset.append(entry).await? {
            metrics::counter!("fine_tuning_entries_total").increment(1);
            info!(
                content_id = %record.content_id,
                period = %period,
                "High-performing content promoted into fine-tuning dataset"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "performance_service_test.rs"]
mod tests;
