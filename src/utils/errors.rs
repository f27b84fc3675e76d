// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::capabilities::traits::{AccessError, GeneratorError, MetricsError, PublisherError};
use crate::domain::repositories::job_store::StoreError;
use crate::queue::task_queue::QueueError;
use thiserror::Error;

/// 编排层错误类型
///
/// 覆盖批量生成与自动发布编排过程中可能出现的全部错误分类。
/// 可重试与不可重试的错误通过`is_retryable`区分，供任务队列
/// 的重试策略使用。
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// 输入验证失败，永不重试
    #[error("Validation error: {0}")]
    Validation(String),

    /// 目标资源不存在（任务、内容、站点或已过期的记录）
    #[error("Not found: {0}")]
    NotFound(String),

    /// 前置资源状态不满足操作要求
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 研究结果源文档集为空
    #[error("Empty source set: {0}")]
    EmptySource(String),

    /// 生成内容与源材料重合度过高，确定性失败，永不重试
    #[error("Uniqueness check failed: score {score:.3} below threshold {threshold:.3}")]
    Uniqueness { score: f64, threshold: f64 },

    /// 存储层错误
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// 队列错误
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// 内容生成能力错误
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// 发布能力错误
    #[error("Publisher error: {0}")]
    Publisher(#[from] PublisherError),

    /// 指标采集能力错误
    #[error("Metrics collector error: {0}")]
    Metrics(#[from] MetricsError),

    /// 外部只读存储访问错误
    #[error("Capability access error: {0}")]
    Access(#[from] AccessError),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrchestrationError {
    /// 判断错误是否可重试
    ///
    /// 仅瞬时的外部能力错误（限流、配额、提供方故障）可重试；
    /// 验证、缺失、唯一性与凭证类错误重试没有意义。
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestrationError::Generator(e) => e.is_retryable(),
            OrchestrationError::Publisher(e) => e.is_retryable(),
            OrchestrationError::Metrics(_) | OrchestrationError::Access(_) => true,
            OrchestrationError::Store(_) | OrchestrationError::Queue(_) => true,
            _ => false,
        }
    }
}
