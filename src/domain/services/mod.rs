// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 批量生成编排服务
pub mod batch_service;

/// 上下文提示构建器
pub mod context_builder;

/// 性能跟踪服务
pub mod performance_service;

/// 自动发布编排服务
pub mod publishing_service;

/// 目标站点路由服务
pub mod routing_service;

/// 唯一性验证器
pub mod uniqueness;
