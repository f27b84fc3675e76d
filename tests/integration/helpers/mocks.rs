// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::Utc;
use contentflow::capabilities::traits::{
    AccessError, ApprovedContentStore, CollectedMetrics, ContentGenerator, GeneratedDraft,
    GenerationRequest, GeneratorError, MetricsCollector, MetricsError, PublishOptions,
    PublishReceipt, Publisher, PublisherError, ResearchProvider,
};
use contentflow::domain::models::content::{ApprovedContent, ResearchJob, SourceDocument};
use contentflow::domain::models::site::SiteConfig;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// 固定研究结果的提供方
pub struct StaticResearchProvider {
    jobs: DashMap<Uuid, ResearchJob>,
}

impl StaticResearchProvider {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    pub fn insert(&self, job: ResearchJob) {
        self.jobs.insert(job.id, job);
    }
}

#[async_trait]
impl ResearchProvider for StaticResearchProvider {
    async fn get_research_job(&self, id: Uuid) -> Result<Option<ResearchJob>, AccessError> {
        Ok(self.jobs.get(&id).map(|j| j.value().clone()))
    }
}

/// 产出与源材料无关文本的生成器
///
/// 可选的信号量门闸用于在测试中控制任务完成节奏。
pub struct UnrelatedTextGenerator {
    pub calls: AtomicUsize,
    pub gate: Option<Arc<Semaphore>>,
}

impl UnrelatedTextGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl ContentGenerator for UnrelatedTextGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedDraft, GeneratorError> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| GeneratorError::Provider(e.to_string()))?;
            permit.forget();
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedDraft {
            title: format!("Fresh perspective number {}", n),
            body: "Orchards thrive under patient stewardship. Beekeeping rewards \
                   meticulous observation across seasons. Pruning calendars differ \
                   sharply between hemispheres and cultivars."
                .to_string(),
            excerpt: "Stewardship notes.".to_string(),
            provider: "mock-provider".to_string(),
            meta_description: Some("Orchard stewardship notes".to_string()),
        })
    }
}

/// 逐字复述源材料的生成器，触发唯一性门禁
pub struct EchoGenerator {
    sources_text: String,
}

impl EchoGenerator {
    pub fn new(sources: &[SourceDocument]) -> Self {
        Self {
            sources_text: sources
                .iter()
                .map(|s| s.content.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[async_trait]
impl ContentGenerator for EchoGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GeneratedDraft, GeneratorError> {
        Ok(GeneratedDraft {
            title: "Copied".to_string(),
            body: self.sources_text.clone(),
            excerpt: self.sources_text.clone(),
            provider: "mock-provider".to_string(),
            meta_description: None,
        })
    }
}

/// 总是限流的生成器
pub struct RateLimitedGenerator {
    pub calls: AtomicUsize,
}

impl RateLimitedGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentGenerator for RateLimitedGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GeneratedDraft, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GeneratorError::RateLimit {
            retry_after_secs: Some(1),
        })
    }
}

/// 记录发布调用的发布器
pub struct RecordingPublisher {
    pub connection_ok: bool,
    pub published: DashMap<Uuid, String>,
    counter: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new(connection_ok: bool) -> Self {
        Self {
            connection_ok,
            published: DashMap::new(),
            counter: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn check_connection(&self, _credentials_id: &str) -> Result<(), PublisherError> {
        if self.connection_ok {
            Ok(())
        } else {
            Err(PublisherError::Connection(
                "destination unreachable".to_string(),
            ))
        }
    }

    async fn publish(
        &self,
        content: &ApprovedContent,
        destination: &SiteConfig,
        _options: &PublishOptions,
    ) -> Result<PublishReceipt, PublisherError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let external_id = format!("post-{}", n);
        self.published.insert(content.id, destination.id.clone());
        Ok(PublishReceipt {
            external_id: external_id.clone(),
            external_url: format!("https://{}.example.com/{}", destination.id, external_id),
            published_at: Utc::now(),
        })
    }
}

/// 内存已审核内容库
pub struct StaticContentStore {
    contents: DashMap<Uuid, ApprovedContent>,
}

impl StaticContentStore {
    pub fn new() -> Self {
        Self {
            contents: DashMap::new(),
        }
    }

    pub fn insert(&self, content: ApprovedContent) {
        self.contents.insert(content.id, content);
    }
}

#[async_trait]
impl ApprovedContentStore for StaticContentStore {
    async fn get_by_id(&self, content_id: Uuid) -> Result<Option<ApprovedContent>, AccessError> {
        Ok(self.contents.get(&content_id).map(|c| c.value().clone()))
    }
}

/// 固定读数的指标采集器
pub struct StaticCollector {
    pub metrics: CollectedMetrics,
}

#[async_trait]
impl MetricsCollector for StaticCollector {
    async fn fetch(&self, _external_post_id: &str) -> Result<CollectedMetrics, MetricsError> {
        Ok(self.metrics)
    }
}
