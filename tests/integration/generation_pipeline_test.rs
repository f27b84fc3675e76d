// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::mocks::{EchoGenerator, RateLimitedGenerator, UnrelatedTextGenerator};
use crate::helpers::{create_test_app, generation_settings, sources, wait_until};
use chrono::Duration;
use contentflow::domain::models::batch_job::BatchStatus;
use contentflow::domain::models::content::{ResearchJob, ResearchStatus};
use contentflow::utils::errors::OrchestrationError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

fn research_job(source_count: usize) -> ResearchJob {
    ResearchJob {
        id: Uuid::new_v4(),
        status: ResearchStatus::Completed,
        sources: sources(source_count),
    }
}

#[tokio::test]
async fn test_batch_pipeline_completes() {
    let mut app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::zero(),
    );
    let research = research_job(6);
    let research_id = research.id;
    app.research.insert(research);

    let job_id = app
        .batch_service
        .create_batch_job(research_id, generation_settings(3))
        .await
        .unwrap();

    app.manager.start_workers(5, 3, 2);
    wait_until(5_000, || async {
        let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
        job.status.is_terminal()
    })
    .await;

    let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
    assert_eq!(job.status, BatchStatus::Completed);
    assert_eq!(job.progress.completed, 3);
    assert_eq!(job.progress.failed, 0);
    assert_eq!(job.progress.percentage, 100);
    assert!(job.completed_at.is_some());

    let results = app.batch_service.get_batch_job_results(job_id).await.unwrap();
    assert_eq!(results.len(), 3);
    for content in &results {
        assert!(content.uniqueness_score >= 0.7);
        assert!(!content.metadata.source_urls.is_empty());
        assert_eq!(content.metadata.ai_provider, "mock-provider");
        assert!(content.metadata.word_count > 0);
    }
}

#[tokio::test]
async fn test_verbatim_output_fails_uniqueness_gate() {
    let docs = sources(4);
    let generator = Arc::new(EchoGenerator::new(&docs));
    let mut app = create_test_app(generator, true, Duration::zero());

    let research = ResearchJob {
        id: Uuid::new_v4(),
        status: ResearchStatus::Completed,
        sources: docs,
    };
    let research_id = research.id;
    app.research.insert(research);

    let job_id = app
        .batch_service
        .create_batch_job(research_id, generation_settings(2))
        .await
        .unwrap();

    app.manager.start_workers(5, 3, 2);
    wait_until(5_000, || async {
        let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
        job.status.is_terminal()
    })
    .await;

    let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
    assert_eq!(job.status, BatchStatus::CompletedWithErrors);
    assert_eq!(job.progress.failed, 2);
    assert!(app
        .batch_service
        .get_batch_job_results(job_id)
        .await
        .unwrap()
        .is_empty());
    // 失败原因附着在任务上，状态查询可见
    for task in &job.tasks {
        assert!(task.error.as_ref().unwrap().contains("Uniqueness"));
    }
}

#[tokio::test]
async fn test_rate_limited_generator_retries_then_fails() {
    let generator = Arc::new(RateLimitedGenerator::new());
    let mut app = create_test_app(generator.clone(), true, Duration::zero());

    let research = research_job(2);
    let research_id = research.id;
    app.research.insert(research);

    let job_id = app
        .batch_service
        .create_batch_job(research_id, generation_settings(1))
        .await
        .unwrap();

    app.manager.start_workers(2, 1, 1);
    wait_until(10_000, || async {
        let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
        job.status.is_terminal()
    })
    .await;

    let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
    assert_eq!(job.status, BatchStatus::CompletedWithErrors);
    // 首次尝试加三次退避重试
    assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_cancel_preserves_finished_results() {
    let gate = Arc::new(Semaphore::new(4));
    let generator = Arc::new(UnrelatedTextGenerator::gated(gate.clone()));
    let mut app = create_test_app(generator, true, Duration::zero());

    let research = research_job(10);
    let research_id = research.id;
    app.research.insert(research);

    let job_id = app
        .batch_service
        .create_batch_job(research_id, generation_settings(10))
        .await
        .unwrap();

    app.manager.start_workers(2, 1, 1);
    wait_until(5_000, || async {
        let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
        job.progress.completed == 4
    })
    .await;

    app.batch_service.cancel_batch_job(job_id).await.unwrap();

    // 放行剩余任务，它们的结果必须被丢弃
    gate.add_permits(20);
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let job = app.batch_service.get_batch_job_status(job_id).await.unwrap();
    assert_eq!(job.status, BatchStatus::Cancelled);
    assert_eq!(job.progress.completed, 4);
    assert_eq!(
        app.batch_service
            .get_batch_job_results(job_id)
            .await
            .unwrap()
            .len(),
        4
    );
}

#[tokio::test]
async fn test_create_batch_job_validations() {
    let app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::zero(),
    );

    // 研究作业不存在
    let missing = app
        .batch_service
        .create_batch_job(Uuid::new_v4(), generation_settings(2))
        .await;
    assert!(matches!(missing, Err(OrchestrationError::NotFound(_))));

    // 研究作业未完成
    let incomplete = ResearchJob {
        id: Uuid::new_v4(),
        status: ResearchStatus::Processing,
        sources: sources(3),
    };
    let incomplete_id = incomplete.id;
    app.research.insert(incomplete);
    let state = app
        .batch_service
        .create_batch_job(incomplete_id, generation_settings(2))
        .await;
    assert!(matches!(state, Err(OrchestrationError::InvalidState(_))));

    // 源文档集为空
    let empty = ResearchJob {
        id: Uuid::new_v4(),
        status: ResearchStatus::Completed,
        sources: vec![],
    };
    let empty_id = empty.id;
    app.research.insert(empty);
    let no_sources = app
        .batch_service
        .create_batch_job(empty_id, generation_settings(2))
        .await;
    assert!(matches!(no_sources, Err(OrchestrationError::EmptySource(_))));

    // target_count为0不通过设置校验
    let research = research_job(3);
    let research_id = research.id;
    app.research.insert(research);
    let invalid = app
        .batch_service
        .create_batch_job(research_id, generation_settings(0))
        .await;
    assert!(matches!(invalid, Err(OrchestrationError::Validation(_))));
}

#[tokio::test]
async fn test_generation_tasks_are_staggered() {
    let app = create_test_app(
        Arc::new(UnrelatedTextGenerator::new()),
        true,
        Duration::milliseconds(5_000),
    );
    let research = research_job(3);
    let research_id = research.id;
    app.research.insert(research);

    let before = chrono::Utc::now();
    app.batch_service
        .create_batch_job(research_id, generation_settings(3))
        .await
        .unwrap();

    let mut pending = app
        .queue
        .pending(contentflow::queue::task_queue::TaskKind::Generation);
    pending.sort_by_key(|t| t.priority);
    assert_eq!(pending.len(), 3);

    // 任务i的派发时间约为 i × 5s
    for (i, task) in pending.iter().enumerate() {
        let offset_ms = (task.not_before.unwrap() - before).num_milliseconds();
        let expected = i as i64 * 5_000;
        assert!(
            (offset_ms - expected).abs() < 1_000,
            "task {} dispatch offset {}ms, expected about {}ms",
            i,
            offset_ms,
            expected
        );
    }
}
