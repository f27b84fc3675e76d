// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::mocks::UnrelatedTextGenerator;
use crate::helpers::{approved_content, create_test_app, publishing_settings, wait_until};
use chrono::Duration;
use contentflow::domain::models::performance::{ContentPerformanceMetrics, TrackingPeriod};
use contentflow::domain::models::publishing_job::PublishingStatus;
use contentflow::domain::repositories::job_store::JobStore;
use contentflow::queue::task_queue::{TaskKind, TaskQueue};
use contentflow::utils::errors::OrchestrationError;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_publishing_pipeline_completes_and_schedules_tracking() {
    let mut app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::zero(),
    );

    let content = approved_content(
        "Planning the perfect wedding",
        "A wedding venue checklist every bride should read.",
    );
    let content_id = content.id;
    app.content_store.insert(content);

    let job_id = app
        .publishing_service
        .schedule_automated_publishing(
            vec![content_id],
            "creds-main".to_string(),
            publishing_settings(10_000),
        )
        .await
        .unwrap();

    app.manager.start_workers(2, 2, 1);
    wait_until(5_000, || async {
        let job = app
            .publishing_service
            .get_publishing_job_status(job_id)
            .await
            .unwrap();
        job.status.is_terminal()
    })
    .await;

    let job = app
        .publishing_service
        .get_publishing_job_status(job_id)
        .await
        .unwrap();
    assert_eq!(job.status, PublishingStatus::Completed);
    assert_eq!(job.progress.published, 1);
    assert_eq!(job.progress.percentage, 100);

    let results = app
        .publishing_service
        .get_publishing_job_results(job_id)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.success);
    assert!(result.external_id.is_some());
    assert!(result.performance_tracking_enabled);
    // 婚礼内容按规则路由到婚礼站点
    assert_eq!(result.site_id.as_deref(), Some("site-weddings"));

    // 发布成功后创建性能记录并安排三个跟踪点
    let record: Option<ContentPerformanceMetrics> =
        app.metrics_store.get(content_id).await.unwrap();
    let record = record.expect("performance record should exist");
    assert_eq!(record.quality_score, 85.0);

    let tracking = app.queue.pending(TaskKind::Tracking);
    assert_eq!(tracking.len(), 3);
    let published_at = record.published_at;
    for (period, task) in TrackingPeriod::all().iter().zip(&tracking) {
        let offset = task.not_before.unwrap() - published_at;
        assert_eq!(offset.num_seconds(), period.delay().num_seconds());
    }
}

#[tokio::test]
async fn test_publish_tasks_are_staggered_by_delay_between_posts() {
    let app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::zero(),
    );

    let mut ids = Vec::new();
    for i in 0..3 {
        let content = approved_content(
            &format!("Wedding checklist part {}", i),
            "Venue, catering, and flowers for the bride.",
        );
        ids.push(content.id);
        app.content_store.insert(content);
    }

    let before = chrono::Utc::now();
    app.publishing_service
        .schedule_automated_publishing(ids, "creds-main".to_string(), publishing_settings(30_000))
        .await
        .unwrap();

    let mut pending = app.queue.pending(TaskKind::Publishing);
    pending.sort_by_key(|t| t.priority);
    assert_eq!(pending.len(), 3);

    // 相对派发延迟应为 0ms、30000ms、60000ms
    for (i, task) in pending.iter().enumerate() {
        let offset_ms = (task.not_before.unwrap() - before).num_milliseconds();
        let expected = i as i64 * 30_000;
        assert!(
            (offset_ms - expected).abs() < 1_000,
            "task {} dispatch offset {}ms, expected about {}ms",
            i,
            offset_ms,
            expected
        );
    }
}

#[tokio::test]
async fn test_connection_precheck_aborts_whole_job() {
    let app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        false,
        Duration::zero(),
    );

    let content = approved_content("Title", "Body for the bride.");
    let content_id = content.id;
    app.content_store.insert(content);

    let err = app
        .publishing_service
        .schedule_automated_publishing(
            vec![content_id],
            "creds-main".to_string(),
            publishing_settings(10_000),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestrationError::Publisher(_)));
    // 预检查失败时不入队任何任务
    assert_eq!(
        app.queue.depth(TaskKind::Publishing).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_unapproved_content_yields_partial_completion() {
    let mut app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::zero(),
    );

    let good = approved_content(
        "Wedding venue tour notes",
        "What every bride should ask the venue.",
    );
    let good_id = good.id;
    app.content_store.insert(good);
    let missing_id = Uuid::new_v4();

    let job_id = app
        .publishing_service
        .schedule_automated_publishing(
            vec![good_id, missing_id],
            "creds-main".to_string(),
            publishing_settings(10_000),
        )
        .await
        .unwrap();

    // 第二个条目在+10s派发，给足轮询时间
    app.manager.start_workers(1, 2, 1);
    wait_until(20_000, || async {
        let job = app
            .publishing_service
            .get_publishing_job_status(job_id)
            .await
            .unwrap();
        job.status.is_terminal()
    })
    .await;

    let job = app
        .publishing_service
        .get_publishing_job_status(job_id)
        .await
        .unwrap();
    assert_eq!(job.status, PublishingStatus::PartiallyCompleted);
    assert_eq!(job.progress.published, 1);
    assert_eq!(job.progress.failed, 1);

    // 失败条目的错误被保留，成功子集仍可访问
    let failures: Vec<_> = job.results.iter().filter(|r| !r.success).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].content_id, missing_id);
    assert!(failures[0]
        .error
        .as_ref()
        .unwrap()
        .contains("not approved"));
}

#[tokio::test]
async fn test_cancel_publishing_job() {
    let app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::zero(),
    );

    let mut ids = Vec::new();
    for i in 0..3 {
        let content = approved_content(&format!("Post {}", i), "Body for the bride.");
        ids.push(content.id);
        app.content_store.insert(content);
    }

    // 不启动工作器，作业保持pending
    let job_id = app
        .publishing_service
        .schedule_automated_publishing(ids, "creds-main".to_string(), publishing_settings(60_000))
        .await
        .unwrap();

    app.publishing_service
        .cancel_publishing_job(job_id)
        .await
        .unwrap();

    let job = app
        .publishing_service
        .get_publishing_job_status(job_id)
        .await
        .unwrap();
    assert_eq!(job.status, PublishingStatus::Cancelled);

    // 已取消的作业不可再次取消
    assert!(app
        .publishing_service
        .cancel_publishing_job(job_id)
        .await
        .is_err());
}
