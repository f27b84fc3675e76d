// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod mocks;

use chrono::Duration;
use contentflow::capabilities::traits::{CollectedMetrics, ContentGenerator};
use contentflow::domain::models::batch_job::{ContentRequirements, GenerationSettings};
use contentflow::domain::models::content::{ApprovedContent, SourceDocument};
use contentflow::domain::models::publishing_job::PublishingSettings;
use contentflow::domain::models::site::{RoutingRule, SiteConfig};
use contentflow::domain::repositories::job_store::JobLockRegistry;
use contentflow::domain::repositories::site_store::{RoutingRuleStore, SiteStore};
use contentflow::domain::services::batch_service::BatchGenerationService;
use contentflow::domain::services::performance_service::PerformanceTracker;
use contentflow::domain::services::publishing_service::AutomatedPublishingService;
use contentflow::domain::services::routing_service::{RoutingService, RoutingWeights};
use contentflow::domain::services::context_builder::ContextPromptBuilder;
use contentflow::infrastructure::stores::memory_dataset::MemoryDatasetRepository;
use contentflow::infrastructure::stores::memory_job_store::MemoryJobStore;
use contentflow::queue::scheduler::TaskScheduler;
use contentflow::queue::task_queue::MemoryTaskQueue;
use contentflow::utils::retry_policy::RetryPolicy;
use contentflow::workers::generation_worker::GenerationWorker;
use contentflow::workers::manager::WorkerManager;
use contentflow::workers::publishing_worker::PublishingWorker;
use contentflow::workers::tracking_worker::TrackingWorker;
use mocks::{RecordingPublisher, StaticCollector, StaticContentStore, StaticResearchProvider};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// 组装完整的编排栈供端到端测试使用
pub struct TestApp {
    pub queue: Arc<MemoryTaskQueue>,
    pub batch_store: Arc<MemoryJobStore>,
    pub publishing_store: Arc<MemoryJobStore>,
    pub metrics_store: Arc<MemoryJobStore>,
    pub dataset: Arc<MemoryDatasetRepository>,
    pub batch_service: Arc<BatchGenerationService<MemoryTaskQueue>>,
    pub publishing_service: Arc<AutomatedPublishingService<MemoryTaskQueue>>,
    pub tracker: Arc<PerformanceTracker>,
    pub router: Arc<RoutingService>,
    pub publisher: Arc<RecordingPublisher>,
    pub content_store: Arc<StaticContentStore>,
    pub research: Arc<StaticResearchProvider>,
    pub manager: WorkerManager<MemoryTaskQueue>,
}

/// 测试用的快速重试策略，退避短且无抖动
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_backoff: std::time::Duration::from_millis(50),
        max_backoff: std::time::Duration::from_millis(200),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
        enable_jitter: false,
    }
}

pub fn test_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            id: "site-weddings".to_string(),
            name: "Wedding Stories".to_string(),
            endpoint: "https://weddings.example.com/wp-json".to_string(),
            categories: vec!["bridal".to_string(), "venues".to_string()],
            keywords: vec!["wedding".to_string(), "bride".to_string(), "venue".to_string()],
            is_active: true,
            priority: 80,
        },
        SiteConfig {
            id: "site-general".to_string(),
            name: "The Daily Reader".to_string(),
            endpoint: "https://general.example.com/wp-json".to_string(),
            categories: vec![],
            keywords: vec![],
            is_active: true,
            priority: 10,
        },
    ]
}

pub fn test_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            keywords: vec!["wedding".to_string(), "bride".to_string(), "venue".to_string()],
            categories: vec!["bridal".to_string()],
            target_site_id: "site-weddings".to_string(),
            priority: 80,
            description: "Wedding and bridal content".to_string(),
        },
        RoutingRule {
            keywords: vec![],
            categories: vec![],
            target_site_id: "site-general".to_string(),
            priority: 50,
            description: "Generic fallback".to_string(),
        },
    ]
}

/// 组装测试应用
///
/// stagger为生成任务的错峰间隔；发布间隔来自各测试的设置。
pub fn create_test_app(
    generator: Arc<dyn ContentGenerator>,
    connection_ok: bool,
    stagger: Duration,
) -> TestApp {
    let queue = Arc::new(MemoryTaskQueue::new());
    let scheduler = Arc::new(TaskScheduler::new(queue.clone()));
    let locks = Arc::new(JobLockRegistry::new());

    let batch_store = Arc::new(MemoryJobStore::new());
    let publishing_store = Arc::new(MemoryJobStore::new());
    let metrics_store = Arc::new(MemoryJobStore::new());
    let dataset = Arc::new(MemoryDatasetRepository::new());

    let research = Arc::new(StaticResearchProvider::new());
    let content_store = Arc::new(StaticContentStore::new());
    let publisher = Arc::new(RecordingPublisher::new(connection_ok));
    let collector = Arc::new(StaticCollector {
        metrics: CollectedMetrics {
            views: 800,
            comments: 25,
            shares: 12,
            engagement_rate: 0.07,
            avg_time_on_page: 110.0,
            organic_traffic: 400,
            click_through_rate: 0.05,
            bounce_rate: 0.35,
        },
    });

    let sites = Arc::new(SiteStore::new(test_sites()));
    let rules = Arc::new(RoutingRuleStore::new(test_rules(), Default::default()));
    let router = Arc::new(RoutingService::new(sites, rules, RoutingWeights::default()));

    let job_ttl = std::time::Duration::from_secs(7_200);
    let metrics_ttl = std::time::Duration::from_secs(2_592_000);

    let batch_service = Arc::new(BatchGenerationService::new(
        research.clone(),
        batch_store.clone(),
        locks.clone(),
        scheduler.clone(),
        stagger,
        job_ttl,
    ));
    let publishing_service = Arc::new(AutomatedPublishingService::new(
        publisher.clone(),
        publishing_store.clone(),
        locks.clone(),
        scheduler.clone(),
        job_ttl,
    ));
    let tracker = Arc::new(PerformanceTracker::new(
        collector,
        content_store.clone(),
        metrics_store.clone(),
        dataset.clone(),
        locks.clone(),
        metrics_ttl,
    ));

    let generation_worker = Arc::new(GenerationWorker::new(
        batch_service.clone(),
        generator,
        ContextPromptBuilder::default(),
        scheduler.clone(),
        fast_retry_policy(),
    ));
    let publishing_worker = Arc::new(PublishingWorker::new(
        publishing_service.clone(),
        publisher.clone(),
        content_store.clone(),
        router.clone(),
        metrics_store.clone(),
        scheduler.clone(),
        metrics_ttl,
    ));
    let tracking_worker = Arc::new(TrackingWorker::new(
        tracker.clone(),
        scheduler.clone(),
        fast_retry_policy(),
    ));

    let manager = WorkerManager::new(
        queue.clone(),
        generation_worker,
        publishing_worker,
        tracking_worker,
    );

    TestApp {
        queue,
        batch_store,
        publishing_store,
        metrics_store,
        dataset,
        batch_service,
        publishing_service,
        tracker,
        router,
        publisher,
        content_store,
        research,
        manager,
    }
}

pub fn sources(count: usize) -> Vec<SourceDocument> {
    (0..count)
        .map(|i| SourceDocument {
            url: format!("https://research.example.com/article-{}", i),
            title: format!("Wedding venue research {}", i),
            content: format!(
                "Venue pricing varies with season {}. You should compare quotes \
                 from several venues before committing a deposit.",
                i
            ),
        })
        .collect()
}

pub fn generation_settings(target_count: u32) -> GenerationSettings {
    GenerationSettings {
        target_count,
        brand_voice: "professional".to_string(),
        target_audience: "engaged couples".to_string(),
        content_type: "blog_post".to_string(),
        requirements: ContentRequirements {
            uniqueness_threshold: 0.7,
            target_word_count: 800,
        },
        provider_preference: None,
    }
}

pub fn publishing_settings(delay_ms: i64) -> PublishingSettings {
    PublishingSettings {
        status: "publish".to_string(),
        categories: vec!["bridal".to_string()],
        tags: vec!["wedding".to_string()],
        delay_between_posts_ms: delay_ms,
        enable_performance_tracking: true,
        auto_optimization: false,
        scheduled_date: None,
        target_site_id: None,
    }
}

pub fn approved_content(title: &str, body: &str) -> ApprovedContent {
    ApprovedContent {
        id: Uuid::new_v4(),
        title: title.to_string(),
        body: body.to_string(),
        excerpt: body.chars().take(40).collect(),
        content_type: None,
        approved: true,
        categories: vec!["bridal".to_string()],
        tags: vec!["wedding".to_string()],
        quality_score: 85.0,
        ai_provider: Some("mock-provider".to_string()),
    }
}

/// 轮询等待条件成立，超时则panic
pub async fn wait_until<F, Fut>(timeout_ms: u64, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
    loop {
        if condition().await {
            return;
        }
        if std::time::Instant::now() > deadline {
            panic!("condition not met within {}ms", timeout_ms);
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
}
