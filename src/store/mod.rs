use anyhow::Result;
use async_trait::async_trait;

pub mod memory;
pub mod redis;

pub use memory::MemoryInvalidationStore;
pub use redis::RedisInvalidationStore;

/// 失效记录存储接口：按键读写时间戳字符串
///
/// 任何满足 get / set / del 语义且保证单键原子性的持久化存储都可以接入。
/// 键空间与其他使用方共享，`user::` / `client::` 前缀由本库保留。
#[async_trait]
pub trait InvalidationStore: Send + Sync {
    /// 读取键对应的值，键不存在时返回 `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入（覆盖）键对应的值
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// 删除键，键不存在时不报错
    async fn del(&self, key: &str) -> Result<()>;
}
