// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::performance::FineTuningEntry;
use crate::domain::repositories::job_store::StoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// 微调数据集仓库特质
///
/// 数据集是只追加的有序列表；唯一允许的写操作是条目追加，
/// 且按(content_id, period)去重。
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// 追加条目
    ///
    /// 相同(content_id, period)的条目已存在时不做任何修改并
    /// 返回false，首次追加返回true。
    async fn append(&self, entry: FineTuningEntry) -> Result<bool, StoreError>;

    /// 按加入顺序读取最多limit条
    async fn list(&self, limit: usize) -> Result<Vec<FineTuningEntry>, StoreError>;

    /// 当前条目总数
    async fn len(&self) -> Result<usize, StoreError>;
}

#[async_trait]
impl<S: DatasetRepository + ?Sized> DatasetRepository for Arc<S> {
    async fn append(&self, entry: FineTuningEntry) -> Result<bool, StoreError> {
        (**self).append(entry).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<FineTuningEntry>, StoreError> {
        (**self).list(limit).await
    }

    async fn len(&self) -> Result<usize, StoreError> {
        (**self).len().await
    }
}
