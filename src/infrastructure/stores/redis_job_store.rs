// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::job_store::{JobStore, StoreError};
use crate::infrastructure::cache::redis_client::RedisClient;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use uuid::Uuid;

/// Redis作业存储
///
/// 记录以JSON写入，TTL由Redis的SETEX语义保证，进程重启后
/// 未到期的作业状态仍可恢复。
pub struct RedisJobStore<T> {
    client: RedisClient,
    /// 键前缀，区分不同记录类型的命名空间
    prefix: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RedisJobStore<T> {
    /// 创建新的Redis作业存储
    pub fn new(client: RedisClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            _marker: PhantomData,
        }
    }

    fn key(&self, id: Uuid) -> String {
        format!("{}:{}", self.prefix, id)
    }
}

#[async_trait]
impl<T> JobStore<T> for RedisJobStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn put(&self, id: Uuid, value: &T, ttl: std::time::Duration) -> Result<(), StoreError> {
        let payload = serde_json::to_string(value)?;
        self.client
            .set_ex(&self.key(id), &payload, ttl.as_secs().max(1))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let payload = self
            .client
            .get(&self.key(id))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        self.client
            .del(&self.key(id))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
