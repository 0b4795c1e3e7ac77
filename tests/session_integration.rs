//! Copilot session driven end to end over HTTP with a SQLite usage store

mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use governai::api::{ApiClient, UploadFilters};
use governai::session::{CopilotSession, DataEvent, Role, SessionState, SubmitOutcome};
use governai::storage::{keys, SqliteUsageStore, UsageStore};

fn session(server: &MockServer, store: Arc<SqliteUsageStore>) -> CopilotSession {
    let api = ApiClient::new(&common::api_config(&server.uri())).expect("client");
    CopilotSession::new(Arc::new(api), store, &common::instant_copilot()).expect("session")
}

async fn mount_answer(server: &MockServer, answer: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/copilot/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": answer})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_five_free_queries_then_gate() {
    let server = MockServer::start().await;
    mount_answer(&server, "Here you go.").await;
    let (store, _dir) = common::create_temp_store();
    let session = session(&server, store.clone());

    for i in 1..=5 {
        let outcome = session.submit_query(&format!("question {}", i)).await;
        assert_eq!(outcome, SubmitOutcome::Completed { failed: false });
        assert_eq!(session.usage().query_count, i);
    }
    assert!(session.upgrade_prompt_visible());

    session.dismiss_upgrade_prompt();
    assert_eq!(session.submit_query("sixth").await, SubmitOutcome::GateRejected);
    assert!(session.upgrade_prompt_visible());

    assert_eq!(session.transcript().len(), 10);
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
    assert_eq!(store.get(keys::QUERY_COUNT).unwrap().as_deref(), Some("5"));
}

#[tokio::test]
async fn test_usage_persists_across_sessions() {
    let server = MockServer::start().await;
    mount_answer(&server, "ok").await;
    let (store, _dir) = common::create_temp_store();

    {
        let first = session(&server, store.clone());
        first.submit_query("one").await;
        first.submit_query("two").await;
    }

    let reopened = Arc::new(SqliteUsageStore::new_with_path(store.path()).unwrap());
    let second = session(&server, reopened);
    assert_eq!(second.usage().query_count, 2);
    assert!(second.transcript().is_empty());
}

#[tokio::test]
async fn test_server_error_still_counts_and_commits_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/copilot/query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (store, _dir) = common::create_temp_store();
    let session = session(&server, store);

    let outcome = session.submit_query("status?").await;

    assert_eq!(outcome, SubmitOutcome::Completed { failed: true });
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].role(), Role::Assistant);
    assert!(transcript[1].content().starts_with("**Server Error**"));
    assert_eq!(session.usage().query_count, 1);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_upload_from_disk_notifies_subscribers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/contracts/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::contract_json()))
        .expect(1)
        .mount(&server)
        .await;
    let (store, dir) = common::create_temp_store();
    let file = dir.path().join("csa.pdf");
    std::fs::write(&file, b"%PDF-1.4 contract").unwrap();

    let session = session(&server, store);
    let mut events = session.subscribe();

    let outcome = session.submit_upload_path(&file, UploadFilters::default()).await;

    assert_eq!(outcome, SubmitOutcome::Completed { failed: false });
    let transcript = session.transcript();
    let attached = transcript[0].attached_file().expect("attachment");
    assert_eq!(attached.name, "csa.pdf");
    assert_eq!(attached.mime_type, "application/pdf");
    assert_eq!(attached.size_bytes, 17);

    let summary = transcript[1].content();
    assert!(summary.contains("**Contract Number:** CSA-2025-014"));
    assert!(summary.contains("**Risk Score:** 63.4%"));
    assert!(summary.contains("**Value:** EUR 480,000"));
    assert!(summary.contains("**Expiration:** 2027-01-31"));

    assert_eq!(events.recv().await.unwrap(), DataEvent::ContractsChanged);
    assert_eq!(session.upload_progress(), 0);
}

#[tokio::test]
async fn test_paid_flag_from_store_skips_gate() {
    let server = MockServer::start().await;
    mount_answer(&server, "unlimited").await;
    let (store, _dir) = common::create_temp_store();
    store.set(keys::QUERY_COUNT, "9").unwrap();
    store.set(keys::PAID, "true").unwrap();

    let session = session(&server, store);
    assert!(session.submit_query("more").await.is_success());
    assert!(!session.upgrade_prompt_visible());
    assert_eq!(session.usage().query_count, 10);
}
