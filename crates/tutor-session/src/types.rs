//! # Tutor Session Types
//!
//! 消息、会话以及会话列表摘要。会话是一个值：追加消息会返回新的会话。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 标题截取的最大字符数
pub const TITLE_MAX_CHARS: usize = 30;

/// 标题截断后缀（无论原文长短都会追加）
pub const TITLE_SUFFIX: &str = "...";

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// 消息结构，创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_sample: Option<String>,
}

impl Message {
    /// 创建用户消息
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
            code_sample: None,
        }
    }

    /// 创建助手消息
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::Assistant,
            text: text.into(),
            created_at: Utc::now(),
            code_sample: None,
        }
    }

    /// 创建附带代码示例的助手消息
    pub fn assistant_with_code(text: impl Into<String>, code_sample: impl Into<String>) -> Self {
        Self {
            code_sample: Some(code_sample.into()),
            ..Self::assistant(text)
        }
    }

    pub fn has_code_sample(&self) -> bool {
        self.code_sample.as_deref().is_some_and(|code| !code.is_empty())
    }
}

/// 一次完整的对话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// 使用指定 ID 创建空会话
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            last_updated_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// 开始一个新的空会话（生成新 ID）
    pub fn start_new() -> Self {
        Self::new(new_id())
    }

    /// 追加消息，返回更新后的会话，更新时间记为追加时刻
    pub fn append_message(mut self, message: Message) -> Self {
        self.last_updated_at = Utc::now().max(self.last_updated_at);
        self.messages.push(message);
        self.title = title_for(&self);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// 侧边栏展示用的摘要
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            last_updated_at: self.last_updated_at,
            message_count: self.messages.len(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::start_new()
    }
}

/// 由首条消息推导会话标题
///
/// 没有消息时为空字符串；否则取首条消息前 30 个字符并追加 `...`。
pub fn title_for(session: &Session) -> String {
    match session.messages.first() {
        None => String::new(),
        Some(first) => {
            let mut title: String = first.text.chars().take(TITLE_MAX_CHARS).collect();
            title.push_str(TITLE_SUFFIX);
            title
        }
    }
}

/// 会话摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub last_updated_at: DateTime<Utc>,
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_empty_session() {
        let session = Session::start_new();
        assert_eq!(title_for(&session), "");
        assert_eq!(session.title, "");
    }

    #[test]
    fn test_title_short_text_still_gets_suffix() {
        let session = Session::start_new().append_message(Message::user("你好"));
        assert_eq!(session.title, "你好...");
    }

    #[test]
    fn test_title_truncates_by_chars() {
        let text = "创意编程".repeat(10);
        let session = Session::start_new().append_message(Message::user(text.clone()));

        let expected: String = text.chars().take(TITLE_MAX_CHARS).collect();
        assert_eq!(session.title, format!("{}...", expected));
        assert_eq!(session.title.chars().count(), TITLE_MAX_CHARS + TITLE_SUFFIX.len());
    }

    #[test]
    fn test_title_uses_first_message_only() {
        let session = Session::start_new()
            .append_message(Message::user("first"))
            .append_message(Message::assistant("second"));
        assert_eq!(session.title, "first...");
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let user = Message::user("question");
        let reply = Message::assistant("answer");
        let session = Session::start_new();
        let started_at = session.last_updated_at;

        let session = session
            .append_message(user.clone())
            .append_message(reply.clone());

        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[0], user);
        assert_eq!(session.messages()[1], reply);
        // 消息在会话之前创建，更新时间仍不早于会话创建时间
        assert!(session.last_updated_at >= started_at);
        assert!(session.last_updated_at >= reply.created_at);
    }

    #[test]
    fn test_append_stamps_update_time() {
        let session = Session::start_new().append_message(Message::user("first"));
        let first_update = session.last_updated_at;

        let before_second = Utc::now();
        let session = session.append_message(Message::assistant("second"));

        assert!(session.last_updated_at >= before_second);
        assert!(session.last_updated_at >= first_update);
    }

    #[test]
    fn test_start_new_generates_distinct_ids() {
        let a = Session::start_new();
        let b = Session::start_new();
        assert_ne!(a.id, b.id);
        assert!(a.is_empty());
    }

    #[test]
    fn test_message_serialization_shape() {
        let message = Message::assistant_with_code("hi", "ellipse(1, 2, 3, 4);");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["role"], "assistant");
        assert_eq!(json["codeSample"], "ellipse(1, 2, 3, 4);");
        assert!(json.get("createdAt").is_some());

        let plain = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(plain.get("codeSample").is_none());
    }

    #[test]
    fn test_has_code_sample() {
        assert!(Message::assistant_with_code("a", "b").has_code_sample());
        assert!(!Message::assistant_with_code("a", "").has_code_sample());
        assert!(!Message::assistant("a").has_code_sample());
    }
}
