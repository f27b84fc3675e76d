// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 负载序列化错误
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// 后端错误
    #[error("Backend error: {0}")]
    Backend(String),
}

/// 任务类别枚举
///
/// 每个类别对应一个独立的工作池，并发上限各自配置，
/// 互不挤占外部API配额。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 内容生成
    Generation,
    /// 站点发布
    Publishing,
    /// 性能跟踪
    Tracking,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskKind::Generation => write!(f, "generation"),
            TaskKind::Publishing => write!(f, "publishing"),
            TaskKind::Tracking => write!(f, "tracking"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generation" => Ok(TaskKind::Generation),
            "publishing" => Ok(TaskKind::Publishing),
            "tracking" => Ok(TaskKind::Tracking),
            _ => Err(()),
        }
    }
}

/// 队列任务条目
///
/// 最小的可调度工作单元。`not_before`是任务之间唯一的排序
/// 机制：队列对不同延迟的任务不保证FIFO。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTask {
    /// 条目唯一标识符
    pub id: Uuid,
    /// 任务类别
    pub kind: TaskKind,
    /// 所属作业ID
    pub job_id: Uuid,
    /// 任务负载数据
    pub payload: serde_json::Value,
    /// 优先级，数值越小越先派发
    pub priority: i32,
    /// 最早派发时间，为空表示立即可派发
    pub not_before: Option<DateTime<Utc>>,
    /// 已尝试次数
    pub attempt_count: u32,
    /// 最大重试次数
    pub max_retries: u32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl QueuedTask {
    /// 创建一个新的队列任务条目
    pub fn new(kind: TaskKind, job_id: Uuid, payload: serde_json::Value, priority: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            job_id,
            payload,
            priority,
            not_before: None,
            attempt_count: 0,
            max_retries: 3,
            created_at: Utc::now(),
        }
    }

    /// 当前时刻是否已到派发时间
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.not_before.map(|t| t <= now).unwrap_or(true)
    }
}

/// 任务队列特质
///
/// 至少一次投递语义：出队即认领，处理失败由调度器重新入队。
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 入队任务
    async fn enqueue(&self, task: QueuedTask) -> Result<(), QueueError>;

    /// 出队一个指定类别的就绪任务
    ///
    /// 就绪条目中优先级数值最小者先出队，优先级相同时按
    /// 创建时间排序；没有就绪条目时返回None。
    async fn dequeue(&self, kind: TaskKind) -> Result<Option<QueuedTask>, QueueError>;

    /// 指定类别的当前队列深度
    async fn depth(&self, kind: TaskKind) -> Result<usize, QueueError>;
}

#[async_trait]
impl<Q: TaskQueue + ?Sized> TaskQueue for std::sync::Arc<Q> {
    async fn enqueue(&self, task: QueuedTask) -> Result<(), QueueError> {
        (**self).enqueue(task).await
    }

    async fn dequeue(&self, kind: TaskKind) -> Result<Option<QueuedTask>, QueueError> {
        (**self).dequeue(kind).await
    }

    async fn depth(&self, kind: TaskKind) -> Result<usize, QueueError> {
        (**self).depth(kind).await
    }
}

/// 内存任务队列
///
/// 每个任务类别维护一个独立的延迟队列，出队时惰性筛选
/// 就绪条目。
#[derive(Default)]
pub struct MemoryTaskQueue {
    queues: DashMap<TaskKind, Vec<QueuedTask>>,
}

impl MemoryTaskQueue {
    /// 创建新的内存任务队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取指定类别全部待处理条目的快照
    ///
    /// 包含尚未到派发时间的延迟条目，用于观测与测试。
    pub fn pending(&self, kind: TaskKind) -> Vec<QueuedTask> {
        self.queues
            .get(&kind)
            .map(|q| q.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn enqueue(&self, task: QueuedTask) -> Result<(), QueueError> {
        metrics::counter!("queue_enqueued_total", "kind" => task.kind.to_string()).increment(1);
        self.queues.entry(task.kind).or_default().push(task);
        Ok(())
    }

    async fn dequeue(&self, kind: TaskKind) -> Result<Option<QueuedTask>, QueueError> {
        let mut entry = match self.queues.get_mut(&kind) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let now = Utc::now();
        let best = entry
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_ready(now))
            .min_by(|(_, a), (_, b)| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
            .map(|(i, _)| i);

        Ok(best.map(|i| entry.remove(i)))
    }

    async fn depth(&self, kind: TaskKind) -> Result<usize, QueueError> {
        Ok(self.queues.get(&kind).map(|q| q.len()).unwrap_or(0))
    }
}
