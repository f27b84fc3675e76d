// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;

/// Redis客户端
///
/// 提供作业存储与数据集后端所需的异步操作子集。
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 获取指定键的值
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    /// 设置键值对并指定过期时间（秒）
    pub async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    /// 删除键
    pub async fn del(&self, key: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }

    /// 向列表尾部追加元素
    pub async fn rpush(&self, key: &str, value: &str) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let len: i64 = con.rpush(key, value).await?;
        Ok(len)
    }

    /// 读取列表区间
    pub async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let values: Vec<String> = con.lrange(key, start, stop).await?;
        Ok(values)
    }

    /// 列表长度
    pub async fn llen(&self, key: &str) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let len: i64 = con.llen(key).await?;
        Ok(len)
    }

    /// 向集合添加成员
    ///
    /// # 返回值
    ///
    /// 成员此前不存在时返回true，用于追加去重判定。
    pub async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let added: i64 = con.sadd(key, member).await?;
        Ok(added == 1)
    }
}
