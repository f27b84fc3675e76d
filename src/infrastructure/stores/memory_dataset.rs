// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::performance::FineTuningEntry;
use crate::domain::repositories::dataset_repository::DatasetRepository;
use crate::domain::repositories::job_store::StoreError;
use crate::utils::idempotency::idempotency_key;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;

/// 内存微调数据集仓库
///
/// 只追加的有序列表，按(content_id, period)幂等键去重。
#[derive(Default)]
pub struct MemoryDatasetRepository {
    inner: Mutex<DatasetInner>,
}

#[derive(Default)]
struct DatasetInner {
    entries: Vec<FineTuningEntry>,
    seen_keys: HashSet<String>,
}

impl MemoryDatasetRepository {
    /// 创建新的内存数据集仓库
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatasetRepository for MemoryDatasetRepository {
    async fn append(&self, entry: FineTuningEntry) -> Result<bool, StoreError> {
        let key = idempotency_key(entry.content_id, &entry.period.to_string());
        let mut inner = self.inner.lock();
        if !inner.seen_keys.insert(key) {
            return Ok(false);
        }
        inner.entries.push(entry);
        Ok(true)
    }

    async fn list(&self, limit: usize) -> Result<Vec<FineTuningEntry>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.entries.iter().take(limit).cloned().collect())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock().entries.len())
    }
}
