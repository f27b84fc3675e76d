// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::performance::FineTuningEntry;
use crate::domain::repositories::dataset_repository::DatasetRepository;
use crate::domain::repositories::job_store::StoreError;
use crate::infrastructure::cache::redis_client::RedisClient;
use crate::utils::idempotency::idempotency_key;
use async_trait::async_trait;

/// Redis微调数据集仓库
///
/// 条目顺序保存在列表中，幂等键保存在伴生集合中；SADD的
/// 返回值决定是否真正追加，保证(content_id, period)唯一。
pub struct RedisDatasetRepository {
    client: RedisClient,
    list_key: String,
    keys_key: String,
}

impl RedisDatasetRepository {
    /// 创建新的Redis数据集仓库
    pub fn new(client: RedisClient, namespace: &str) -> Self {
        Self {
            client,
            list_key: format!("{}:entries", namespace),
            keys_key: format!("{}:keys", namespace),
        }
    }
}

#[async_trait]
impl DatasetRepository for RedisDatasetRepository {
    async fn append(&self, entry: FineTuningEntry) -> Result<bool, StoreError> {
        let key = idempotency_key(entry.content_id, &entry.period.to_string());
        let added = self
            .client
            .sadd(&self.keys_key, &key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        if !added {
            return Ok(false);
        }

        let payload = serde_json::to_string(&entry)?;
        self.client
            .rpush(&self.list_key, &payload)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(true)
    }

    async fn list(&self, limit: usize) -> Result<Vec<FineTuningEntry>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let raw = self
            .client
            .lrange(&self.list_key, 0, limit as isize - 1)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        raw.iter()
            .map(|item| serde_json::from_str(item).map_err(StoreError::from))
            .collect()
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let len = self
            .client
            .llen(&self.list_key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(len.max(0) as usize)
    }
}
