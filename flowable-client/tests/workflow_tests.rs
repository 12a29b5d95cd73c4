//! Integration tests for the case/process/task wrappers.

use flowable_client::{
    ApiFamily, Case, Client, ClientConfig, ClientError, Process, SnapshotPolicy, Task,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    let config = ClientConfig::builder()
        .host("127.0.0.1")
        .port(server.address().port())
        .context_root("")
        .build();
    Client::new(config).unwrap()
}

async fn mount_case(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/case-instances/case-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "case-1",
            "businessKey": "order-77",
            "caseDefinitionId": "orderCase:1:7"
        })))
        .mount(server)
        .await;
}

fn page(items: serde_json::Value) -> serde_json::Value {
    let total = items.as_array().map_or(0, Vec::len);
    json!({ "data": items, "total": total, "start": 0, "size": total })
}

#[tokio::test]
async fn test_wait_for_task_appears_on_third_poll() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cmmn-api/cmmn-runtime/case-instances"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "case-1"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/tasks"))
        .and(query_param("caseInstanceId", "case-1"))
        .and(query_param("name", "review"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/tasks"))
        .and(query_param("caseInstanceId", "case-1"))
        .and(query_param("name", "review"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"id": "t-1", "name": "review", "caseInstanceId": "case-1"}
        ]))))
        .mount(&mock_server)
        .await;

    let mut case = Case::new(client_for(&mock_server));
    case.start("orderCase", None, None).await.unwrap();

    let task = case
        .wait_for_task("review", Duration::from_secs(2), Duration::from_millis(500))
        .await
        .unwrap();

    assert_eq!(task.id(), Some("t-1"));
    assert_eq!(task.instance_id(), Some("case-1"));

    let polls = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.url.path() == "/cmmn-api/cmmn-runtime/tasks")
        .count();
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn test_wait_for_task_times_out() {
    let mock_server = MockServer::start().await;
    mount_case(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .mount(&mock_server)
        .await;

    let mut case = Case::new(client_for(&mock_server));
    case.load("case-1").await.unwrap();

    let err = case
        .wait_for_task("review", Duration::from_millis(300), Duration::from_millis(100))
        .await
        .unwrap_err();

    match err {
        ClientError::TaskTimeout { name, timeout } => {
            assert_eq!(name, "review");
            assert_eq!(timeout, Duration::from_millis(300));
        }
        other => panic!("Expected TaskTimeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_find_by_business_key_without_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/case-instances"))
        .and(query_param("businessKey", "nope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .mount(&mock_server)
        .await;

    let mut case = Case::new(client_for(&mock_server));
    assert!(!case.find_by_business_key("nope").await.unwrap());
    assert!(!case.is_loaded());
    assert_eq!(case.id(), None);

    let err = case.tasks().await.unwrap_err();
    assert!(matches!(err, ClientError::NotLoaded(_)));
}

#[tokio::test]
async fn test_process_tasks_runs_matching_handlers() {
    let mock_server = MockServer::start().await;
    mount_case(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/tasks"))
        .and(query_param("caseInstanceId", "case-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"id": "t-1", "name": "review"},
            {"id": "t-2", "name": "approve", "endTime": "2024-03-01T12:00:00.000Z"},
            {"id": "t-3", "name": "archive"}
        ]))))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cmmn-api/cmmn-runtime/tasks/t-1"))
        .and(body_json(json!({"action": "complete"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handled = Arc::new(AtomicUsize::new(0));
    let mut case = Case::new(client_for(&mock_server));
    case.load("case-1").await.unwrap();

    let counter = Arc::clone(&handled);
    case.on_task("review", move |mut task: Task| {
        let counter = Arc::clone(&counter);
        async move {
            task.complete(None, None).await?;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), ClientError>(())
        }
    })
    .on_task("approve", |_task: Task| async { Ok::<(), ClientError>(()) });

    assert_eq!(case.process_tasks().await.unwrap(), 1);
    assert_eq!(handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_process_tasks_without_handlers() {
    let mock_server = MockServer::start().await;
    mount_case(&mock_server).await;

    let mut case = Case::new(client_for(&mock_server));
    case.load("case-1").await.unwrap();

    assert_eq!(case.process_tasks().await.unwrap(), 0);
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_claim_patches_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cmmn-api/cmmn-runtime/tasks/t-1"))
        .and(body_json(json!({"action": "claim", "assignee": "kermit"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = json!({"id": "t-1", "name": "review", "assignee": null});
    let mut task = Task::from_snapshot(client_for(&mock_server), ApiFamily::Cmmn, snapshot);
    task.claim("kermit").await.unwrap();

    assert_eq!(task.assignee(), Some("kermit"));
    assert!(task.is_patched());

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_claim_refetches_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cmmn-api/cmmn-runtime/tasks/t-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/tasks/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t-1",
            "name": "review",
            "assignee": "kermit",
            "claimTime": "2024-03-01T12:00:00.000Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = json!({"id": "t-1", "name": "review"});
    let mut task = Task::from_snapshot(client_for(&mock_server), ApiFamily::Cmmn, snapshot)
        .with_policy(SnapshotPolicy::Refetch);
    task.claim("kermit").await.unwrap();

    assert_eq!(task.assignee(), Some("kermit"));
    assert!(!task.is_patched());
    assert_eq!(task.snapshot()["claimTime"], "2024-03-01T12:00:00.000Z");
}

#[tokio::test]
async fn test_completed_task_refreshes_from_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/service/runtime/tasks/t-5"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/service/runtime/tasks/t-5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not found"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/service/history/historic-task-instances/t-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t-5",
            "name": "approve",
            "endTime": "2024-03-01T12:00:00.000Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let snapshot = json!({"id": "t-5", "name": "approve", "processInstanceId": "p-1"});
    let mut task = Task::from_snapshot(client_for(&mock_server), ApiFamily::Bpmn, snapshot)
        .with_policy(SnapshotPolicy::Refetch);
    assert!(!task.is_completed());

    task.complete(None, Some("approved")).await.unwrap();
    assert!(task.is_completed());
}

#[tokio::test]
async fn test_process_delete_with_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/service/runtime/process-instances/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "suspended": true
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/service/runtime/process-instances/p-1"))
        .and(query_param("deleteReason", "obsolete"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut process = Process::new(client_for(&mock_server));
    process.load("p-1").await.unwrap();
    assert!(process.is_suspended());

    process.delete(Some("obsolete")).await.unwrap();
    assert!(!process.is_loaded());
}

#[tokio::test]
async fn test_wait_for_task_zero_interval_is_throttled() {
    let mock_server = MockServer::start().await;
    mount_case(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/cmmn-api/cmmn-runtime/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .mount(&mock_server)
        .await;

    let mut case = Case::new(client_for(&mock_server));
    case.load("case-1").await.unwrap();

    let err = case
        .wait_for_task("review", Duration::from_millis(300), Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::TaskTimeout { .. }));

    let polls = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.url.path() == "/cmmn-api/cmmn-runtime/tasks")
        .count();
    assert!(polls >= 2, "polled {} times", polls);
    assert!(polls <= 8, "polled {} times", polls);
}

#[tokio::test]
async fn test_suspend_without_body_keeps_instance() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/service/runtime/process-instances/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "suspended": false
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/service/runtime/process-instances/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "suspended": true
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/service/runtime/process-instances/p-1"))
        .and(body_json(json!({"action": "suspend"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut process = Process::new(client_for(&mock_server));
    process.load("p-1").await.unwrap();
    assert!(!process.is_suspended());

    process.suspend().await.unwrap();

    assert_eq!(process.id(), Some("p-1"));
    assert!(process.is_suspended());
}

#[tokio::test]
async fn test_activate_uses_returned_representation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/service/runtime/process-instances/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "suspended": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/service/runtime/process-instances/p-1"))
        .and(body_json(json!({"action": "activate"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p-1",
            "suspended": false
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut process = Process::new(client_for(&mock_server));
    process.load("p-1").await.unwrap();

    process.activate().await.unwrap();

    assert_eq!(process.id(), Some("p-1"));
    assert!(!process.is_suspended());
}
