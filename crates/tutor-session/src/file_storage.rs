//! # FileStore Implementation
//!
//! 基于 JSON 文件的键值存储，每个键对应一个文件。
//!
//! 存储结构:
//! ```text
//! <base_path>/
//! ├── ai_tutor_history.json      # 整个聊天记录集合
//! └── ...
//! ```
//!
//! 写入先落到同目录的临时文件再重命名，避免进程中断时留下半截 JSON。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::error::StorageResult;
use crate::storage::{validate_key, HistoryStore};

/// FileStore 配置
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// 存储根目录，支持 `~`
    pub base_path: PathBuf,
}

impl FileStoreConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self::new(crate::default_storage_path())
    }
}

/// 文件存储
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// 创建 FileStore 并确保目录存在
    pub async fn new(config: FileStoreConfig) -> StorageResult<Self> {
        let base_path_str = config.base_path.to_string_lossy().to_string();
        let root = PathBuf::from(shellexpand::tilde(&base_path_str).as_ref());

        fs::create_dir_all(&root).await?;
        info!("FileStore initialized at {:?}", root);

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 键对应的文件路径
    pub fn path_for_key(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn temp_path_for_key(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{}.json.tmp", key))
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.path_for_key(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.path_for_key(key);
        let tmp = self.temp_path_for_key(key);

        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        match fs::remove_file(self.path_for_key(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        // 检查目录是否可写
        let marker = self.root.join(".health_check");
        fs::write(&marker, "ok").await?;
        fs::remove_file(&marker).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(FileStoreConfig::new(temp_dir.path()))
            .await
            .unwrap();

        assert_eq!(store.get("history").await.unwrap(), None);

        store.set("history", r#"{"version":1}"#).await.unwrap();
        assert!(store.path_for_key("history").exists());
        assert_eq!(
            store.get("history").await.unwrap().as_deref(),
            Some(r#"{"version":1}"#)
        );

        store.delete("history").await.unwrap();
        assert!(!store.path_for_key("history").exists());
        tokio_test::assert_ok!(store.delete("history").await);
    }

    #[tokio::test]
    async fn test_file_store_creates_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = FileStore::new(FileStoreConfig::new(&nested)).await.unwrap();

        assert!(nested.is_dir());
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_file_store_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(FileStoreConfig::new(temp_dir.path()))
            .await
            .unwrap();

        store.set("history", "data").await.unwrap();
        store.set("history", "data2").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["history.json".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(FileStoreConfig::new(temp_dir.path()))
            .await
            .unwrap();

        assert!(store.set("../outside", "x").await.is_err());
        assert!(store.get("a/b").await.is_err());
    }
}
