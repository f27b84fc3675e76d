// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::generation_worker::GenerationWorker;
use crate::workers::publishing_worker::PublishingWorker;
use crate::workers::tracking_worker::TrackingWorker;
use crate::queue::task_queue::TaskQueue;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 为三类任务各启动一个有界工作池。每个池的并发上限等于
/// 池内工作器数量，分别对齐内容生成、站点发布与指标采集
/// 的外部API限流。
pub struct WorkerManager<Q: TaskQueue + 'static> {
    queue: Arc<Q>,
    generation_worker: Arc<GenerationWorker<Q>>,
    publishing_worker: Arc<PublishingWorker<Q>>,
    tracking_worker: Arc<TrackingWorker<Q>>,
    handles: Vec<JoinHandle<()>>,
}

impl<Q: TaskQueue> WorkerManager<Q> {
    /// 创建新的工作管理器实例
    pub fn new(
        queue: Arc<Q>,
        generation_worker: Arc<GenerationWorker<Q>>,
        publishing_worker: Arc<PublishingWorker<Q>>,
        tracking_worker: Arc<TrackingWorker<Q>>,
    ) -> Self {
        Self {
            queue,
            generation_worker,
            publishing_worker,
            tracking_worker,
            handles: Vec::new(),
        }
    }

    /// 启动全部工作池
    ///
    /// # 参数
    ///
    /// * `generation_count` - 内容生成池工作器数量
    /// * `publishing_count` - 站点发布池工作器数量
    /// * `tracking_count` - 性能跟踪池工作器数量
    pub fn start_workers(
        &mut self,
        generation_count: usize,
        publishing_count: usize,
        tracking_count: usize,
    ) {
        for _ in 0..generation_count {
            let worker = self.generation_worker.clone();
            let queue = self.queue.clone();
            self.handles.push(tokio::spawn(async move {
                worker.run(queue).await;
            }));
        }

        for _ in 0..publishing_count {
            let worker = self.publishing_worker.clone();
            let queue = self.queue.clone();
            self.handles.push(tokio::spawn(async move {
                worker.run(queue).await;
            }));
        }

        for _ in 0..tracking_count {
            let worker = self.tracking_worker.clone();
            let queue = self.queue.clone();
            self.handles.push(tokio::spawn(async move {
                worker.run(queue).await;
            }));
        }

        info!(
            generation = generation_count,
            publishing = publishing_count,
            tracking = tracking_count,
            "Worker pools started"
        );
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并停止所有工作器循环。
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}
