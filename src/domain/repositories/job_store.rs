// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// 存储层错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 后端错误
    #[error("Backend error: {0}")]
    Backend(String),
}

/// 带TTL的键值作业存储特质
///
/// 定义作业与性能记录的统一访问接口。条目到期后读取结果
/// 等同于不存在，调用方必须按"未找到"处理，不得视为错误。
#[async_trait]
pub trait JobStore<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// 写入记录并设置过期时间
    async fn put(&self, id: Uuid, value: &T, ttl: Duration) -> Result<(), StoreError>;

    /// 按ID读取记录，不存在或已过期时返回None
    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError>;

    /// 删除记录
    async fn remove(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
impl<T, S> JobStore<T> for Arc<S>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    S: JobStore<T> + ?Sized,
{
    async fn put(&self, id: Uuid, value: &T, ttl: Duration) -> Result<(), StoreError> {
        (**self).put(id, value, ttl).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        (**self).get(id).await
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        (**self).remove(id).await
    }
}

/// 作业级互斥锁注册表
///
/// 同一作业的进度读改写必须串行执行，否则并发的任务完成
/// 回调会互相覆盖计数。不同作业之间互不阻塞。
#[derive(Default)]
pub struct JobLockRegistry {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl JobLockRegistry {
    /// 创建新的锁注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定作业的互斥锁
    pub fn lock_for(&self, job_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(job_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 释放指定作业的互斥锁条目
    ///
    /// 作业进入终态后调用，避免注册表无界增长。
    pub fn release(&self, job_id: Uuid) {
        self.locks.remove(&job_id);
    }
}
