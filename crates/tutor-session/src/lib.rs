//! # Tutor Session Storage
//!
//! AI 编程家教的会话与聊天记录持久化。
//!
//! ## 功能特性
//!
//! - **会话值类型**：消息只追加，标题由首条消息推导
//! - **聊天记录集合**：按会话 ID 去重，最近更新的排在最前
//! - **可注入存储**：`HistoryStore` 只有单键 `get` / `set` / `delete`
//! - **版本化格式**：持久化数据带 schema 版本，损坏数据回退为空记录
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tutor_session::{HistoryManager, MemoryStore, Message, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut history = HistoryManager::new(Arc::new(MemoryStore::new()));
//!     history.load().await;
//!
//!     let session = Session::start_new().append_message(Message::user("你好"));
//!     history.save(&session).await?;
//!
//!     let restored = history.restore(&session.id)?;
//!     assert_eq!(restored.title, "你好...");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod file_storage;
pub mod history;
pub mod storage;
pub mod types;

// 重新导出主要类型
pub use error::{HistoryLoadError, StorageError, StorageResult};
pub use file_storage::{FileStore, FileStoreConfig};
pub use history::{
    decode_history, encode_history, HistoryManager, DEFAULT_HISTORY_KEY, HISTORY_SCHEMA_VERSION,
};
pub use storage::{validate_key, HistoryStore, MemoryStore};
pub use types::{title_for, Message, Role, Session, SessionSummary, TITLE_MAX_CHARS, TITLE_SUFFIX};

/// 创建默认存储路径
pub fn default_storage_path() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".tutor").join("history"))
        .unwrap_or_else(|| std::path::PathBuf::from("./tutor_history"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_file_backed_history_survives_restart() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(FileStoreConfig::new(temp_dir.path()))
            .await
            .unwrap();
        let mut history = HistoryManager::new(Arc::new(store));

        let session = Session::start_new()
            .append_message(Message::user("画一个圆"))
            .append_message(Message::assistant("好的"));
        history.save(&session).await.unwrap();

        // 重新打开同一目录
        let store = FileStore::new(FileStoreConfig::new(temp_dir.path()))
            .await
            .unwrap();
        let mut reopened = HistoryManager::new(Arc::new(store));
        let sessions = reopened.load().await;

        assert_eq!(sessions, vec![session]);
    }

    #[test]
    fn test_default_storage_path() {
        let path = default_storage_path();
        assert!(path.to_string_lossy().contains("history"));
    }
}
