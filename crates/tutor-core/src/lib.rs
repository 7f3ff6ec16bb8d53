//! # Tutor Core
//!
//! AI 编程家教的对话核心：主题与快速提问、固定回复分发器以及对话控制器。
//! 持久化由 `tutor-session` 提供。

pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod topic;

pub use controller::{PendingReply, ReadyReply, TutorController, TutorControllerConfig, TutorState};
pub use dispatcher::{CannedDispatcher, CannedReply, ResponseDispatcher};
pub use error::{Result, TutorError};
pub use topic::{QuickPrompt, Topic, UnknownTopic, LEARNING_TIPS, QUICK_PROMPTS};

// 存储层类型
pub use tutor_session::{
    validate_key, FileStore, FileStoreConfig, HistoryManager, HistoryStore, MemoryStore, Message,
    Role, Session, SessionSummary,
};
