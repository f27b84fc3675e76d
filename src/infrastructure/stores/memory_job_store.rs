// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::job_store::{JobStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// 内存条目
struct StoredEntry {
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// 内存作业存储
///
/// 基于DashMap的带TTL键值存储，用于单机部署与测试。过期
/// 条目在读取时惰性失效，并由维护清扫周期性物理删除。
#[derive(Default)]
pub struct MemoryJobStore {
    entries: DashMap<Uuid, StoredEntry>,
}

impl MemoryJobStore {
    /// 创建新的内存作业存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 物理删除所有已过期条目
    ///
    /// # 返回值
    ///
    /// 被删除的条目数
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|e| e.value().expires_at <= now)
            .map(|e| *e.key())
            .collect();
        let count = expired.len();
        for id in expired {
            self.entries.remove(&id);
        }
        count
    }

    /// 当前存活条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 存储是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl<T> JobStore<T> for MemoryJobStore
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn put(&self, id: Uuid, value: &T, ttl: std::time::Duration) -> Result<(), StoreError> {
        let entry = StoredEntry {
            value: serde_json::to_value(value)?,
            expires_at: Utc::now() + Duration::milliseconds(ttl.as_millis() as i64),
        };
        self.entries.insert(id, entry);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        // 过期条目等同于不存在
        if let Some(entry) = self.entries.get(&id) {
            if entry.expires_at <= Utc::now() {
                drop(entry);
                self.entries.remove(&id);
                return Ok(None);
            }
            let value = serde_json::from_value(entry.value.clone())?;
            return Ok(Some(value));
        }
        Ok(None)
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        self.entries.remove(&id);
        Ok(())
    }
}
