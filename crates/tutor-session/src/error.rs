//! # Storage Error Types
//!
//! 定义聊天记录存储相关的错误类型。

use thiserror::Error;

/// 聊天记录加载错误
///
/// 持久化数据损坏或格式不兼容时产生。`HistoryManager::load` 会记录日志并回退为空记录。
#[derive(Error, Debug)]
pub enum HistoryLoadError {
    /// JSON 解析失败
    #[error("Malformed history data: {0}")]
    Malformed(#[from] serde_json::Error),

    /// 缺少 schema 版本字段
    #[error("History data has no schema version")]
    MissingVersion,

    /// 不支持的 schema 版本
    #[error("Unsupported history schema version {found} (supported: {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },
}

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 聊天记录无法解析
    #[error("History load error: {0}")]
    HistoryLoad(#[from] HistoryLoadError),

    /// 会话不存在
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// 非法的存储键
    #[error("Invalid storage key: {key:?}")]
    InvalidKey { key: String },

    /// 其他错误
    #[error("Storage error: {message}")]
    Other { message: String },
}

impl StorageError {
    /// 创建其他错误
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// 创建会话不存在错误
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound { .. })
    }
}

/// 存储结果类型
pub type StorageResult<T> = Result<T, StorageError>;
