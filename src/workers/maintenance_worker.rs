// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::stores::memory_job_store::MemoryJobStore;
use crate::queue::task_queue::{TaskKind, TaskQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 存储维护工作器
///
/// 定期物理清理内存存储中已过期的作业记录，并上报各队列
/// 深度。Redis后端的TTL由服务端保证，不在清扫范围内。
pub struct MaintenanceWorker<Q: TaskQueue + 'static> {
    stores: Vec<Arc<MemoryJobStore>>,
    queue: Arc<Q>,
    interval: Duration,
}

impl<Q: TaskQueue> MaintenanceWorker<Q> {
    /// 创建新的维护工作器实例
    pub fn new(stores: Vec<Arc<MemoryJobStore>>, queue: Arc<Q>) -> Self {
        Self {
            stores,
            queue,
            interval: Duration::from_secs(60),
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Maintenance worker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            self.run_once().await;
        }
    }

    /// 执行一轮维护清扫
    pub async fn run_once(&self) -> usize {
        let purged: usize = self.stores.iter().map(|s| s.purge_expired()).sum();
        if purged > 0 {
            info!("Purged {} expired job records", purged);
        }

        for kind in [TaskKind::Generation, TaskKind::Publishing, TaskKind::Tracking] {
            match self.queue.depth(kind).await {
                Ok(depth) => {
                    metrics::gauge!("queue_depth", "kind" => kind.to_string()).set(depth as f64);
                }
                Err(e) => error!("Failed to read queue depth: {}", e),
            }
        }
        purged
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }
}
