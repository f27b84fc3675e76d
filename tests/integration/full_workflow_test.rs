// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::mocks::UnrelatedTextGenerator;
use crate::helpers::{create_test_app, generation_settings, publishing_settings, sources, wait_until};
use chrono::Duration;
use contentflow::domain::models::content::{ApprovedContent, ResearchJob, ResearchStatus};
use contentflow::domain::models::publishing_job::PublishingStatus;
use contentflow::queue::task_queue::TaskKind;
use std::sync::Arc;
use uuid::Uuid;

/// 完整链路：研究结果 → 批量生成 → 运营审核（外部，测试中
/// 直接把生成结果放入已审核内容库）→ 自动发布 → 跟踪排期。
#[tokio::test]
async fn test_research_to_publishing_workflow() {
    let mut app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::zero(),
    );

    let research = ResearchJob {
        id: Uuid::new_v4(),
        status: ResearchStatus::Completed,
        sources: sources(4),
    };
    let research_id = research.id;
    app.research.insert(research);

    let batch_id = app
        .batch_service
        .create_batch_job(research_id, generation_settings(2))
        .await
        .unwrap();

    app.manager.start_workers(2, 2, 1);
    wait_until(5_000, || async {
        let job = app.batch_service.get_batch_job_status(batch_id).await.unwrap();
        job.status.is_terminal()
    })
    .await;

    let generated = app
        .batch_service
        .get_batch_job_results(batch_id)
        .await
        .unwrap();
    assert_eq!(generated.len(), 2);

    // 运营审核在核心之外，这里直接把生成结果标记为已审核
    let mut content_ids = Vec::new();
    for content in &generated {
        content_ids.push(content.id);
        app.content_store.insert(ApprovedContent {
            id: content.id,
            title: content.title.clone(),
            body: content.body.clone(),
            excerpt: content.excerpt.clone(),
            content_type: Some(content.content_type.clone()),
            approved: true,
            categories: vec!["bridal".to_string()],
            tags: vec!["wedding".to_string()],
            quality_score: 85.0,
            ai_provider: Some(content.metadata.ai_provider.clone()),
        });
    }

    let publish_id = app
        .publishing_service
        .schedule_automated_publishing(
            vec![content_ids[0]],
            "creds-main".to_string(),
            publishing_settings(10_000),
        )
        .await
        .unwrap();

    wait_until(5_000, || async {
        let job = app
            .publishing_service
            .get_publishing_job_status(publish_id)
            .await
            .unwrap();
        job.status.is_terminal()
    })
    .await;

    let job = app
        .publishing_service
        .get_publishing_job_status(publish_id)
        .await
        .unwrap();
    assert_eq!(job.status, PublishingStatus::Completed);
    assert!(app.publisher.published.contains_key(&content_ids[0]));

    // 发布成功自动排期三个跟踪点
    assert_eq!(app.queue.pending(TaskKind::Tracking).len(), 3);
}
