//! # Tutor Controller
//!
//! 对话控制器：把用户输入写入当前会话、调度回复，并在每次追加消息后写入聊天记录。
//!
//! 状态机:
//! ```text
//! Idle --submit(text)--> Awaiting --complete(reply)--> Idle
//! ```
//!
//! 回复通过 `PendingReply` 异步等待，控制器本身不被借用，因此等待期间仍可以
//! 切换会话或开始新对话。切换会取消挂起的回复，过期回复在 `complete` 时被丢弃。
//! 挂起的回复在未完成前被丢弃时，控制器视为放弃该回复并回到 Idle。

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tutor_session::{HistoryManager, Message, Session, SessionSummary};

use crate::dispatcher::ResponseDispatcher;
use crate::error::Result;
use crate::topic::Topic;

/// 控制器配置
#[derive(Debug, Clone)]
pub struct TutorControllerConfig {
    /// 模拟的回复延迟
    pub reply_delay: Duration,
    /// 新对话的默认主题
    pub default_topic: Option<Topic>,
}

impl Default for TutorControllerConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(1000),
            default_topic: None,
        }
    }
}

impl TutorControllerConfig {
    /// 设置回复延迟
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    /// 设置默认主题
    pub fn with_default_topic(mut self, topic: Option<Topic>) -> Self {
        self.default_topic = topic;
        self
    }
}

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorState {
    /// 没有等待中的回复
    Idle,
    /// 用户消息已追加，等待回复
    Awaiting,
}

impl std::fmt::Display for TutorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TutorState::Idle => write!(f, "idle"),
            TutorState::Awaiting => write!(f, "awaiting"),
        }
    }
}

#[derive(Debug)]
struct PendingTicket {
    ticket: u64,
    session_id: String,
    cancel: CancellationToken,
    lease: Weak<()>,
}

impl PendingTicket {
    /// 对应的 `PendingReply`/`ReadyReply` 已全部被丢弃
    fn is_abandoned(&self) -> bool {
        self.lease.strong_count() == 0
    }
}

/// 已调度、尚未就绪的回复
///
/// 在 `complete` 之前丢弃它（以及由它得到的 `ReadyReply`）等同于放弃这次回复，
/// 控制器在下一次提交时回到 Idle。
pub struct PendingReply {
    ticket: u64,
    session_id: String,
    user_text: String,
    topic: Option<Topic>,
    delay: Duration,
    dispatcher: Arc<dyn ResponseDispatcher>,
    cancel: CancellationToken,
    lease: Arc<()>,
}

impl PendingReply {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn topic(&self) -> Option<Topic> {
        self.topic
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 等待模拟延迟后生成回复
    ///
    /// 等待期间被取消（新对话、切换会话、清空记录）时返回 `None`。
    pub async fn wait(self) -> Option<ReadyReply> {
        let cancelled = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(self.delay) => false,
        };

        if cancelled || self.cancel.is_cancelled() {
            debug!("Reply for session {} cancelled before delivery", self.session_id);
            return None;
        }

        let message = self.dispatcher.dispatch(&self.user_text, self.topic);
        Some(ReadyReply {
            ticket: self.ticket,
            session_id: self.session_id,
            message,
            lease: self.lease,
        })
    }
}

/// 已生成、等待追加的回复
#[derive(Debug, Clone)]
pub struct ReadyReply {
    ticket: u64,
    session_id: String,
    message: Message,
    lease: Arc<()>,
}

impl ReadyReply {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn message(&self) -> &Message {
        &self.message
    }
}

/// 对话控制器
pub struct TutorController {
    config: TutorControllerConfig,
    history: HistoryManager,
    dispatcher: Arc<dyn ResponseDispatcher>,
    session: Session,
    topic: Option<Topic>,
    state: TutorState,
    pending: Option<PendingTicket>,
    next_ticket: u64,
}

impl TutorController {
    /// 创建控制器，加载聊天记录并开始一个空会话
    pub async fn new(
        config: TutorControllerConfig,
        mut history: HistoryManager,
        dispatcher: Arc<dyn ResponseDispatcher>,
    ) -> Self {
        history.load().await;
        let topic = config.default_topic;

        info!(
            "TutorController initialized with {} sessions in history",
            history.len()
        );

        Self {
            config,
            history,
            dispatcher,
            session: Session::start_new(),
            topic,
            state: TutorState::Idle,
            pending: None,
            next_ticket: 0,
        }
    }

    /// 提交用户输入
    ///
    /// 空白输入或正在等待回复时忽略并返回 `None`。否则立即追加用户消息并写入记录，
    /// 返回需要等待的回复。
    #[instrument(skip(self, text), fields(session_id = %self.session.id))]
    pub async fn submit(&mut self, text: &str) -> Option<PendingReply> {
        if text.trim().is_empty() {
            debug!("Ignoring blank submission");
            return None;
        }
        self.release_abandoned();
        if self.state == TutorState::Awaiting {
            debug!("Ignoring submission while a reply is pending");
            return None;
        }

        self.append(Message::user(text)).await;

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let cancel = CancellationToken::new();
        let lease = Arc::new(());
        self.pending = Some(PendingTicket {
            ticket,
            session_id: self.session.id.clone(),
            cancel: cancel.clone(),
            lease: Arc::downgrade(&lease),
        });
        self.state = TutorState::Awaiting;

        Some(PendingReply {
            ticket,
            session_id: self.session.id.clone(),
            user_text: text.to_string(),
            topic: self.topic,
            delay: self.config.reply_delay,
            dispatcher: Arc::clone(&self.dispatcher),
            cancel,
            lease,
        })
    }

    /// 追加已就绪的回复
    ///
    /// 回复不属于当前挂起的请求（已取消或会话已切换）时丢弃并返回 `false`。
    #[instrument(skip(self, reply), fields(session_id = %reply.session_id))]
    pub async fn complete(&mut self, reply: ReadyReply) -> bool {
        let is_current = matches!(
            &self.pending,
            Some(p) if p.ticket == reply.ticket
                && p.session_id == reply.session_id
                && p.session_id == self.session.id
                && !p.cancel.is_cancelled()
        );
        if !is_current {
            warn!("Dropping stale reply for session {}", reply.session_id);
            return false;
        }

        self.pending = None;
        self.append(reply.message).await;
        self.state = TutorState::Idle;
        true
    }

    /// 提交并等待回复，返回追加的助手消息
    pub async fn ask(&mut self, text: &str) -> Option<Message> {
        let pending = self.submit(text).await?;
        let ready = pending.wait().await?;
        let message = ready.message.clone();
        self.complete(ready).await.then_some(message)
    }

    /// 快速提问：选中主题并提交预设问题
    pub async fn quick_prompt(&mut self, topic: Topic) -> Option<PendingReply> {
        self.release_abandoned();
        if self.state == TutorState::Awaiting {
            debug!("Ignoring quick prompt while a reply is pending");
            return None;
        }
        self.topic = Some(topic);
        self.submit(topic.quick_prompt().prompt).await
    }

    /// 切换到历史中的会话
    pub fn select_session(&mut self, id: &str) -> Result<()> {
        let restored = self.history.restore(id)?;
        self.cancel_pending();
        self.session = restored;
        info!("Switched to session {}", id);
        Ok(())
    }

    /// 开始新对话，聊天记录在首条消息追加前不变
    pub fn new_session(&mut self) {
        self.cancel_pending();
        self.session = Session::start_new();
        self.topic = self.config.default_topic;
        info!("Started new session {}", self.session.id);
    }

    /// 清空全部聊天记录并开始新对话
    pub async fn clear_all(&mut self) {
        self.cancel_pending();
        if let Err(e) = self.history.clear().await {
            error!("Failed to erase stored history: {}", e);
        }
        self.new_session();
    }

    pub fn set_topic(&mut self, topic: Option<Topic>) {
        self.topic = topic;
    }

    pub fn topic(&self) -> Option<Topic> {
        self.topic
    }

    /// 挂起的回复已被丢弃时报告 Idle
    pub fn state(&self) -> TutorState {
        match &self.pending {
            Some(pending) if pending.is_abandoned() => TutorState::Idle,
            _ => self.state,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.state() == TutorState::Awaiting
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn active_session_id(&self) -> &str {
        &self.session.id
    }

    /// 聊天记录（最近更新在前）
    pub fn history(&self) -> &[Session] {
        self.history.sessions()
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.history.summaries()
    }

    pub fn config(&self) -> &TutorControllerConfig {
        &self.config
    }

    async fn append(&mut self, message: Message) {
        let session = std::mem::take(&mut self.session);
        self.session = session.append_message(message);

        if let Err(e) = self.history.save(&self.session).await {
            error!("Failed to persist session {}: {}", self.session.id, e);
        }
    }

    /// 回复在完成前被丢弃时释放挂起状态
    fn release_abandoned(&mut self) {
        let abandoned = matches!(&self.pending, Some(pending) if pending.is_abandoned());
        if abandoned {
            if let Some(pending) = self.pending.take() {
                warn!(
                    "Reply for session {} was dropped before completion, releasing",
                    pending.session_id
                );
            }
            self.state = TutorState::Idle;
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
            info!("Cancelled pending reply for session {}", pending.session_id);
        }
        self.state = TutorState::Idle;
    }
}
