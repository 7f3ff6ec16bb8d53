use std::sync::Arc;
use std::time::Duration;

use tutor_core::{
    CannedDispatcher, CannedReply, HistoryManager, MemoryStore, Role, Topic, TutorController,
    TutorControllerConfig, TutorError, TutorState,
};
use tutor_session::DEFAULT_HISTORY_KEY;

async fn tutor_with(store: Arc<MemoryStore>) -> TutorController {
    let config = TutorControllerConfig::default().with_reply_delay(Duration::ZERO);
    TutorController::new(
        config,
        HistoryManager::new(store),
        Arc::new(CannedDispatcher::new()),
    )
    .await
}

#[tokio::test]
async fn greeting_without_topic_gets_default_reply() {
    let mut tutor = tutor_with(Arc::new(MemoryStore::new())).await;

    let reply = tutor.ask("你好").await.expect("reply");

    let messages = tutor.session().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].text, "你好");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(reply.text, CannedDispatcher::reply_for(None).text);

    assert_eq!(tutor.history().len(), 1);
    assert_eq!(tutor.history()[0].title, "你好...");
}

#[tokio::test]
async fn basics_topic_reply_carries_code_sample() {
    let mut tutor = tutor_with(Arc::new(MemoryStore::new())).await;
    tutor.set_topic(Some(Topic::Basics));

    let reply = tutor.ask("anything at all").await.expect("reply");

    let CannedReply { text, code_sample } = CannedDispatcher::reply_for(Some(Topic::Basics));
    assert_eq!(reply.text, text);
    assert_eq!(reply.code_sample.as_deref(), code_sample);
    assert!(reply.has_code_sample());
}

#[tokio::test]
async fn new_session_creates_second_history_entry() {
    let mut tutor = tutor_with(Arc::new(MemoryStore::new())).await;

    tutor.ask("first").await.expect("reply");
    let first_id = tutor.active_session_id().to_string();

    tutor.new_session();
    tutor.ask("second").await.expect("reply");
    let second_id = tutor.active_session_id().to_string();

    assert_ne!(first_id, second_id);
    let ids: Vec<_> = tutor.history().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![second_id.as_str(), first_id.as_str()]);
}

#[tokio::test]
async fn selecting_unknown_session_fails() {
    let mut tutor = tutor_with(Arc::new(MemoryStore::new())).await;

    let err = tutor.select_session("never-saved").unwrap_err();
    assert!(matches!(err, TutorError::SessionNotFound(_)));
}

#[tokio::test]
async fn clear_all_after_three_sessions() {
    let store = Arc::new(MemoryStore::new());
    let mut tutor = tutor_with(store.clone()).await;

    for text in ["one", "two", "three"] {
        tutor.new_session();
        tutor.ask(text).await.expect("reply");
    }
    assert_eq!(tutor.history().len(), 3);

    tutor.clear_all().await;

    assert!(tutor.history().is_empty());
    assert!(tutor.session().is_empty());
    assert_eq!(tutor.state(), TutorState::Idle);
    assert!(store.raw(DEFAULT_HISTORY_KEY).is_none());
}

#[tokio::test]
async fn history_is_restored_on_restart() {
    let store = Arc::new(MemoryStore::new());

    let session = {
        let mut tutor = tutor_with(store.clone()).await;
        tutor.quick_prompt(Topic::Creative).await.expect("pending");
        // 未完成的回复不会写入，只有用户消息
        tutor.session().clone()
    };

    let mut tutor = tutor_with(store).await;
    assert_eq!(tutor.history().len(), 1);
    assert_eq!(tutor.history()[0], session);

    tokio_test::assert_ok!(tutor.select_session(&session.id));
    let reply = tutor.ask("继续").await.expect("reply");
    // 主题不随会话保存，恢复后使用默认回复
    assert_eq!(reply.text, CannedDispatcher::reply_for(None).text);
    assert_eq!(tutor.session().len(), 3);
}

#[tokio::test]
async fn corrupt_history_starts_empty() {
    let store = Arc::new(MemoryStore::new().with_entry(DEFAULT_HISTORY_KEY, "not json"));
    let mut tutor = tutor_with(store.clone()).await;
    assert!(tutor.history().is_empty());

    tutor.ask("fresh start").await.expect("reply");

    let raw = store.raw(DEFAULT_HISTORY_KEY).expect("rewritten");
    assert!(raw.contains("\"version\":1"));
}

#[tokio::test]
async fn newer_history_survives_first_save() {
    let newer = r#"{"version":2,"sessions":[{"id":"from-the-future"}]}"#;
    let store = Arc::new(MemoryStore::new().with_entry(DEFAULT_HISTORY_KEY, newer));
    let mut tutor = tutor_with(store.clone()).await;
    assert!(tutor.history().is_empty());

    tutor.ask("still here?").await.expect("reply");

    // 无法识别的数据先备份再改写主键
    let backup = store
        .keys()
        .into_iter()
        .find(|key| key.starts_with("ai_tutor_history_backup_"))
        .expect("backup key");
    assert_eq!(store.raw(&backup).as_deref(), Some(newer));
    assert!(store
        .raw(DEFAULT_HISTORY_KEY)
        .expect("rewritten")
        .contains("\"version\":1"));
}
