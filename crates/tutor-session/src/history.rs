//! # History Manager
//!
//! 维护聊天记录集合（最近更新的会话在前），并通过注入的 `HistoryStore`
//! 把整个集合写入单个键。
//!
//! 持久化格式:
//! ```text
//! {"version": 1, "sessions": [{"id": ..., "title": ..., "lastUpdatedAt": ..., "messages": [...]}]}
//! ```
//!
//! 每次 `save` 都会重写整个集合，开销为 O(n)。
//!
//! 加载失败时原始数据不会被直接覆盖：下一次写入前先复制到
//! `<key>_backup_<时间戳>`，备份失败则放弃本次写入。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{HistoryLoadError, StorageError, StorageResult};
use crate::storage::HistoryStore;
use crate::types::{title_for, Session, SessionSummary};

/// 默认存储键
pub const DEFAULT_HISTORY_KEY: &str = "ai_tutor_history";

/// 当前持久化 schema 版本
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    version: u32,
    sessions: Vec<Session>,
}

/// 序列化聊天记录集合
pub fn encode_history(sessions: &[Session]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        version: u32,
        sessions: &'a [Session],
    }

    serde_json::to_string(&Borrowed {
        version: HISTORY_SCHEMA_VERSION,
        sessions,
    })
}

/// 解析聊天记录集合
///
/// 先检查版本号再解析完整结构；重复的会话 ID 只保留第一次出现的条目。
pub fn decode_history(raw: &str) -> Result<Vec<Session>, HistoryLoadError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let found = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .ok_or(HistoryLoadError::MissingVersion)?;

    if found != u64::from(HISTORY_SCHEMA_VERSION) {
        return Err(HistoryLoadError::UnsupportedVersion {
            found,
            supported: HISTORY_SCHEMA_VERSION,
        });
    }

    let document: HistoryDocument = serde_json::from_value(value)?;
    let mut seen = HashSet::new();
    Ok(document
        .sessions
        .into_iter()
        .filter(|session| seen.insert(session.id.clone()))
        .collect())
}

/// 聊天记录管理器
pub struct HistoryManager {
    store: Arc<dyn HistoryStore>,
    key: String,
    sessions: Vec<Session>,
    /// 上次加载失败，存储中的原始数据尚未备份
    unreadable: bool,
    backup_key: Option<String>,
}

impl HistoryManager {
    /// 使用默认键创建管理器，记录集合初始为空，需要调用 `load`
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            store,
            key: DEFAULT_HISTORY_KEY.to_string(),
            sessions: Vec::new(),
            unreadable: false,
            backup_key: None,
        }
    }

    /// 设置存储键
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 从存储读取，错误原样返回
    pub async fn try_load(&self) -> StorageResult<Vec<Session>> {
        match self.store.get(&self.key).await? {
            None => Ok(Vec::new()),
            Some(raw) => Ok(decode_history(&raw)?),
        }
    }

    /// 从存储加载聊天记录
    ///
    /// 数据缺失时返回空集合；数据损坏或读取失败时记录警告并回退为空集合，
    /// 原始数据在下一次写入前备份。
    pub async fn load(&mut self) -> Vec<Session> {
        let (sessions, unreadable) = match self.try_load().await {
            Ok(sessions) => {
                info!("Loaded {} sessions from history", sessions.len());
                (sessions, false)
            }
            Err(StorageError::HistoryLoad(e)) => {
                warn!(
                    "Unreadable history under key {:?}, it will be backed up before the next save: {}",
                    self.key, e
                );
                (Vec::new(), true)
            }
            Err(e) => {
                warn!(
                    "Failed to read history under key {:?}, it will be backed up before the next save: {}",
                    self.key, e
                );
                (Vec::new(), true)
            }
        };
        self.sessions = sessions;
        self.unreadable = unreadable;
        self.sessions.clone()
    }

    /// 写入会话
    ///
    /// 已存在同 ID 的会话时替换并移动到最前，否则插入最前。没有消息的会话不会写入。
    /// 内存集合总是先更新，写存储失败时返回错误。
    pub async fn save(&mut self, session: &Session) -> StorageResult<()> {
        if session.is_empty() {
            debug!("Skipping save of empty session {}", session.id);
            return Ok(());
        }

        let mut stored = session.clone();
        stored.title = title_for(&stored);

        self.sessions.retain(|s| s.id != stored.id);
        self.sessions.insert(0, stored);

        self.persist().await?;
        debug!(
            "Saved session {} ({} sessions in history)",
            session.id,
            self.sessions.len()
        );
        Ok(())
    }

    /// 清空全部聊天记录并删除存储项
    pub async fn clear(&mut self) -> StorageResult<()> {
        let count = self.sessions.len();
        self.sessions.clear();
        self.store.delete(&self.key).await?;
        self.unreadable = false;
        info!("Cleared {} sessions from history", count);
        Ok(())
    }

    /// 按 ID 取回会话
    pub fn restore(&self, id: &str) -> StorageResult<Session> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StorageError::session_not_found(id))
    }

    /// 最近更新在前的会话列表
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(Session::summary).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 最近一次备份无法读取的数据时使用的键
    pub fn backup_key(&self) -> Option<&str> {
        self.backup_key.as_deref()
    }

    async fn persist(&mut self) -> StorageResult<()> {
        if self.unreadable {
            self.back_up_unreadable().await?;
        }
        let content = encode_history(&self.sessions)?;
        self.store.set(&self.key, &content).await
    }

    /// 把加载失败的原始数据复制到备份键，读取失败时返回错误，主键保持不变
    async fn back_up_unreadable(&mut self) -> StorageResult<()> {
        if let Some(raw) = self.store.get(&self.key).await? {
            let backup_key = format!(
                "{}_backup_{}",
                self.key,
                Utc::now().format("%Y%m%d%H%M%S%3f")
            );
            self.store.set(&backup_key, &raw).await?;
            warn!("Backed up unreadable history {:?} to {:?}", self.key, backup_key);
            self.backup_key = Some(backup_key);
        }
        self.unreadable = false;
        Ok(())
    }
}
