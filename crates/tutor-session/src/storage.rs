//! # Storage Traits
//!
//! 聊天记录的持久化后端：按键读写整段文本，由 `HistoryManager` 注入使用。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{StorageError, StorageResult};

/// 键值文本存储
///
/// 只需要支持单键的 `get` / `set` / `delete`。写入是整体替换。
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 读取键对应的值，不存在时返回 `None`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// 写入（完整替换）
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// 删除键，键不存在时也视为成功
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// 健康检查
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        (**self).health_check().await
    }
}

/// 校验存储键
///
/// 文件后端会把键当作文件名，只允许字母、数字、`_` 和 `-`。
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// 进程内存储
///
/// 用于测试以及 `storage.type = memory`，进程退出后数据丢失。
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个键值（测试损坏数据时使用）
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.write().insert(key.into(), value.into());
        self
    }

    /// 当前键值对数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 全部键，按字典序排列
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// 不经过异步接口直接读取原始值
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().remove(key);
        Ok(())
    }
}
