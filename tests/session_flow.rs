//! Integration tests for the session store over real storage.

use floatchat::core::{
    ACTIVE_ID_KEY, Content, DEFAULT_TITLE, HISTORY_KEY, Message, SessionStore, record,
};
use floatchat::storage::{FileBackend, KeyValueStore, MemoryBackend};
use floatchat::Error;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn file_store(dir: &TempDir) -> (SessionStore, Arc<FileBackend>) {
    let backend = Arc::new(FileBackend::new(dir.path().to_path_buf()).unwrap());
    (SessionStore::load(backend.clone()), backend)
}

#[test]
fn conversation_survives_restart() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = file_store(&dir);
    let id = store.active_id().to_string();

    store
        .append_message(&id, Message::user("Show me salinity profiles near Chennai"))
        .unwrap();
    store
        .append_message(
            &id,
            Message::bot(
                Content::Records(vec![
                    record([("pressure", json!(5.0)), ("salinity", json!(34.2))]),
                    record([("pressure", json!(50.0)), ("salinity", json!(34.9))]),
                ]),
                Some("SELECT pressure, salinity FROM measurements".to_string()),
                Some("line_chart".into()),
            ),
        )
        .unwrap();
    let other = store.create_session().unwrap();
    store.switch_session(&id).unwrap();

    let (reloaded, _) = file_store(&dir);
    assert_eq!(reloaded.active_id(), id);
    assert_eq!(reloaded.len(), 2);
    assert_eq!(
        reloaded.active().title,
        "Show me salinity profiles near Chennai"
    );
    assert_eq!(reloaded.active().messages, store.active().messages);
    assert_eq!(reloaded.session(&other).unwrap().title, DEFAULT_TITLE);
}

#[test]
fn persisted_layout_uses_fixed_keys() {
    let dir = TempDir::new().unwrap();
    let (store, backend) = file_store(&dir);

    let history = backend.get(HISTORY_KEY).unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&history).unwrap();
    let session = &parsed[store.active_id()];
    assert_eq!(session["id"], json!(store.active_id()));
    assert_eq!(session["title"], json!("New Chat"));
    assert_eq!(session["messages"], json!([]));

    assert_eq!(
        backend.get(ACTIVE_ID_KEY).unwrap().as_deref(),
        Some(store.active_id())
    );
}

#[test]
fn corrupt_file_is_replaced_with_fresh_state() {
    let dir = TempDir::new().unwrap();
    let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
    backend.set(HISTORY_KEY, r#"{"chat_1": {"id": "chat_1""#).unwrap();

    let (store, backend) = file_store(&dir);
    assert_eq!(store.len(), 1);
    assert!(store.active().is_empty());

    let history = backend.get(HISTORY_KEY).unwrap().unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&history).is_ok());
}

#[test]
fn wrong_schema_is_treated_as_no_state() {
    let storage = Arc::new(MemoryBackend::new());
    storage
        .set(HISTORY_KEY, r#"{"chat_1": {"name": "not a session"}}"#)
        .unwrap();

    let store = SessionStore::load(storage);
    assert_eq!(store.len(), 1);
    assert_ne!(store.active_id(), "chat_1");
}

#[test]
fn delete_then_restart_keeps_fallback_active() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = file_store(&dir);
    let first = store.active_id().to_string();
    let second = store.create_session().unwrap();

    store.delete_active_session(|_| true).unwrap();
    assert_eq!(store.active_id(), first);

    let (reloaded, _) = file_store(&dir);
    assert_eq!(reloaded.active_id(), first);
    assert!(reloaded.session(&second).is_none());

    let mut reloaded = reloaded;
    assert!(matches!(
        reloaded.delete_active_session(|_| true),
        Err(Error::LastSession)
    ));
}

#[test]
fn two_processes_on_one_history_file_keep_both_conversations() {
    let dir = TempDir::new().unwrap();
    let (mut first, _) = file_store(&dir);
    let (mut second, _) = file_store(&dir);
    let shared = first.active_id().to_string();

    let other = second.create_session().unwrap();
    second.append_message(&other, Message::user("float locations")).unwrap();
    first.append_message(&shared, Message::user("salinity near Chennai")).unwrap();
    second.append_message(&shared, Message::user("and temperature?")).unwrap();

    let (reloaded, _) = file_store(&dir);
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.session(&other).unwrap().title, "float locations");
    let messages = &reloaded.session(&shared).unwrap().messages;
    assert_eq!(
        messages,
        &vec![
            Message::user("salinity near Chennai"),
            Message::user("and temperature?"),
        ]
    );
    assert_eq!(
        reloaded.session(&shared).unwrap().title,
        "salinity near Chennai"
    );
}

#[derive(Debug, Clone)]
enum Op {
    Create,
    Delete(bool),
    Switch(usize),
    Append(usize, bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        any::<bool>().prop_map(Op::Delete),
        (0..8usize).prop_map(Op::Switch),
        (0..8usize, any::<bool>()).prop_map(|(i, user)| Op::Append(i, user)),
    ]
}

proptest! {
    #[test]
    fn store_invariants_hold(ops in prop::collection::vec(op(), 0..40)) {
        let storage = Arc::new(MemoryBackend::new());
        let mut store = SessionStore::load(storage.clone());
        let mut appended: std::collections::HashMap<String, Vec<Message>> = Default::default();

        for op in ops {
            let ids: Vec<String> = store.sessions().map(|s| s.id.clone()).collect();
            match op {
                Op::Create => {
                    store.create_session().unwrap();
                }
                Op::Delete(confirmed) => {
                    let result = store.delete_active_session(|_| confirmed);
                    if ids.len() == 1 {
                        prop_assert!(matches!(result, Err(Error::LastSession)));
                    } else {
                        result.unwrap();
                    }
                }
                Op::Switch(i) => {
                    store.switch_session(&ids[i % ids.len()]).unwrap();
                }
                Op::Append(i, user) => {
                    let id = &ids[i % ids.len()];
                    let message = if user {
                        Message::user(&format!("q{i}"))
                    } else {
                        Message::bot_text(format!("a{i}"))
                    };
                    store.append_message(id, message.clone()).unwrap();
                    appended.entry(id.clone()).or_default().push(message);
                }
            }

            prop_assert!(!store.is_empty());
            prop_assert!(store.session(store.active_id()).is_some());
        }

        for session in store.sessions() {
            let expected = appended.get(&session.id).cloned().unwrap_or_default();
            prop_assert_eq!(&session.messages, &expected);
            let title = match expected.first() {
                Some(first) if first.role == floatchat::core::Role::User => {
                    first.text().unwrap().to_string()
                }
                _ => DEFAULT_TITLE.to_string(),
            };
            prop_assert_eq!(&session.title, &title);
        }

        let reloaded = SessionStore::load(storage);
        prop_assert_eq!(reloaded.active_id(), store.active_id());
        let before: Vec<_> = store.sessions().cloned().collect();
        let after: Vec<_> = reloaded.sessions().cloned().collect();
        prop_assert_eq!(before, after);
    }
}
