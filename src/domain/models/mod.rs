// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 批量生成作业模型
pub mod batch_job;

/// 内容与源文档模型
pub mod content;

/// 性能跟踪与微调数据集模型
pub mod performance;

/// 自动发布作业模型
pub mod publishing_job;

/// 站点与路由模型
pub mod site;
