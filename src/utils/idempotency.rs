// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// 计算应用级幂等键
///
/// 对(内容ID, 作用域)取SHA-256，作为跟踪历史与微调数据集
/// 去重的稳定键。同一(content_id, scope)的重复操作得到相同键。
pub fn idempotency_key(content_id: Uuid, scope: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content_id.as_bytes());
    hasher.update(b":");
    hasher.update(scope.as_bytes());
    hex::encode(hasher.finalize())
}
