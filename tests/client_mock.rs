//! End-to-end client flows against a mock daemon.

use lxd_client::{
    ApiErrorKind, CreateOptions, Error, LxdClient, MigrateOptions, MigrationSource,
    OperationOutcome, SyncPolicy,
};
use mockito::ServerGuard;
use std::collections::HashMap;

async fn mock_client(server: &ServerGuard) -> LxdClient {
    LxdClient::builder()
        .api_endpoint(server.url())
        .auto_sync(true)
        .build()
        .expect("failed to build client")
}

fn accepted_envelope(id: &str) -> String {
    format!(
        r#"{{"type":"async","status":"Operation created","status_code":100,
            "operation":"/1.0/operations/{id}",
            "metadata":{{"id":"{id}","status":"Running","status_code":103,"may_cancel":true,"err":""}}}}"#
    )
}

fn finished_envelope(id: &str, status_code: i64, err: &str) -> String {
    format!(
        r#"{{"type":"sync","status":"Success","status_code":200,
            "metadata":{{"id":"{id}","status":"Finished","status_code":{status_code},"err":"{err}"}}}}"#
    )
}

#[tokio::test]
async fn create_container_waits_for_completion() {
    let mut server = mockito::Server::new_async().await;

    let create = server
        .mock("POST", "/1.0/containers")
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(accepted_envelope("op-1"))
        .create_async()
        .await;
    let wait = server
        .mock("GET", "/1.0/operations/op-1/wait")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(finished_envelope("op-1", 200, ""))
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let opts = CreateOptions {
        alias: Some("ubuntu/22.04".to_string()),
        ..CreateOptions::default()
    };
    let outcome = client
        .create_container("test", &opts, SyncPolicy::Inherit, None)
        .await
        .expect("create should succeed");

    assert!(outcome.is_completed());
    assert!(outcome.operation().succeeded());
    create.assert_async().await;
    wait.assert_async().await;
}

#[tokio::test]
async fn async_policy_returns_unresolved_handle() {
    let mut server = mockito::Server::new_async().await;

    let create = server
        .mock("POST", "/1.0/containers")
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(accepted_envelope("op-2"))
        .create_async()
        .await;
    // No wait mock: a sync=false call must never hit the wait endpoint.

    let client = mock_client(&server).await;
    let opts = CreateOptions {
        fingerprint: Some("abc123".to_string()),
        ..CreateOptions::default()
    };
    let outcome = client
        .create_container("test", &opts, SyncPolicy::Async, None)
        .await
        .expect("create should be accepted");

    match outcome {
        OperationOutcome::Accepted(op) => {
            assert_eq!(op.id, "op-2");
            assert!(!op.is_terminal());
        }
        OperationOutcome::Completed(_) => panic!("sync=false must not resolve"),
    }
    create.assert_async().await;
}

#[tokio::test]
async fn inherit_follows_a_false_auto_sync_default() {
    let mut server = mockito::Server::new_async().await;

    let create = server
        .mock("POST", "/1.0/containers")
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(accepted_envelope("op-10"))
        .create_async()
        .await;
    let wait = server
        .mock("GET", "/1.0/operations/op-10/wait")
        .expect(0)
        .create_async()
        .await;

    let client = LxdClient::builder()
        .api_endpoint(server.url())
        .auto_sync(false)
        .build()
        .expect("failed to build client");
    let opts = CreateOptions {
        alias: Some("ubuntu/22.04".to_string()),
        ..CreateOptions::default()
    };
    let outcome = client
        .create_container("test", &opts, SyncPolicy::Inherit, None)
        .await
        .expect("create should be accepted");

    match outcome {
        OperationOutcome::Accepted(op) => assert!(!op.is_terminal()),
        OperationOutcome::Completed(_) => panic!("auto_sync=false must not resolve"),
    }
    create.assert_async().await;
    wait.assert_async().await;
}

#[tokio::test]
async fn bounded_wait_cut_short_stays_unresolved() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/1.0/containers")
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(accepted_envelope("op-11"))
        .create_async()
        .await;
    // The server gives up on the bound with the operation still running.
    server
        .mock("GET", "/1.0/operations/op-11/wait?timeout=1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"type":"sync","status":"Success","status_code":200,
                "metadata":{"id":"op-11","status":"Running","status_code":103,"may_cancel":true,"err":""}}"#,
        )
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let opts = CreateOptions {
        fingerprint: Some("abc123".to_string()),
        ..CreateOptions::default()
    };
    let outcome = client
        .create_container("test", &opts, SyncPolicy::Sync, Some(1))
        .await
        .expect("wait should return");

    match outcome {
        OperationOutcome::Accepted(op) => assert!(!op.is_terminal()),
        OperationOutcome::Completed(op) => {
            panic!("non-terminal operation wrapped as completed: {:?}", op.status_code)
        }
    }
}

#[tokio::test]
async fn failed_operation_propagates_as_classified_error() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("POST", "/1.0/containers")
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(accepted_envelope("op-3"))
        .create_async()
        .await;
    server
        .mock("GET", "/1.0/operations/op-3/wait")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(finished_envelope("op-3", 400, "test already exists"))
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let opts = CreateOptions {
        alias: Some("ubuntu/22.04".to_string()),
        ..CreateOptions::default()
    };
    let err = client
        .create_container("test", &opts, SyncPolicy::Sync, None)
        .await
        .expect_err("failed operation must raise");

    let api = err.api().expect("should be an API error");
    assert_eq!(api.kind, ApiErrorKind::BadRequest);
    assert_eq!(api.status, 400);
    assert!(api.message.contains("test already exists"), "{}", api.message);
}

#[tokio::test]
async fn wait_timeout_is_forwarded_to_the_server() {
    let mut server = mockito::Server::new_async().await;

    let wait = server
        .mock("GET", "/1.0/operations/op-4/wait?timeout=30")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(finished_envelope("op-4", 200, ""))
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let operation = client
        .wait_operation("op-4", Some(30))
        .await
        .expect("wait should succeed");
    assert!(operation.succeeded());
    wait.assert_async().await;
}

#[tokio::test]
async fn non_positive_timeout_waits_without_bound() {
    let mut server = mockito::Server::new_async().await;

    let wait = server
        .mock("GET", "/1.0/operations/op-5/wait")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(finished_envelope("op-5", 200, ""))
        .create_async()
        .await;

    let client = mock_client(&server).await;
    client
        .wait_operation("op-5", Some(0))
        .await
        .expect("wait should succeed");
    wait.assert_async().await;
}

#[tokio::test]
async fn cancel_operation_issues_delete() {
    let mut server = mockito::Server::new_async().await;

    let cancel = server
        .mock("DELETE", "/1.0/operations/op-6")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type":"sync","status":"Success","status_code":200,"metadata":{}}"#)
        .create_async()
        .await;

    let client = mock_client(&server).await;
    client.cancel_operation("op-6").await.expect("cancel");
    cancel.assert_async().await;
}

#[tokio::test]
async fn get_operation_returns_the_current_state() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/1.0/operations/op-9")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"type":"sync","status":"Success","status_code":200,
                "metadata":{"id":"op-9","status":"Running","status_code":103,
                            "resources":{"containers":["/1.0/containers/test"]},
                            "may_cancel":true,"err":""}}"#,
        )
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let operation = client.get_operation("op-9").await.expect("get");
    assert_eq!(operation.state(), Some(lxd_client::OperationStatus::Running));
    assert!(operation.may_cancel);
    assert_eq!(
        operation.resources.as_ref().and_then(|r| r.get("containers")).map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn http_errors_are_classified() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/1.0/containers/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type":"error","error":"not found","error_code":404}"#)
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let err = client.container("missing").await.expect_err("404");
    let api = err.api().expect("API error");
    assert_eq!(api.kind, ApiErrorKind::NotFound);
    assert!(api.message.contains("not found"));
}

#[tokio::test]
async fn builder_failures_send_nothing() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/1.0/containers")
        .expect(0)
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let err = client
        .create_container("test", &CreateOptions::default(), SyncPolicy::Sync, None)
        .await
        .expect_err("no image identifier");
    assert!(matches!(err, Error::ImageIdentifierRequired));
    create.assert_async().await;
}

fn migration_source(profiles: Vec<&str>) -> MigrationSource {
    MigrationSource {
        architecture: Some("x86_64".to_string()),
        config: HashMap::from([
            ("volatile.eth0.hwaddr".to_string(), "00:16:3e:00:00:01".to_string()),
            ("limits.cpu".to_string(), "2".to_string()),
        ]),
        profiles: profiles.into_iter().map(str::to_string).collect(),
        websocket_url: "wss://src.example:8443/1.0/operations/op-src/websocket".to_string(),
        websocket_secrets: HashMap::from([("control".to_string(), "ctl".to_string())]),
        certificate: Some("src-cert".to_string()),
        ephemeral: Some(false),
        snapshot: false,
    }
}

#[tokio::test]
async fn migrate_rejects_missing_target_profiles() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/1.0/profiles")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"type":"sync","status":"Success","status_code":200,
                "metadata":["/1.0/profiles/default"]}"#,
        )
        .create_async()
        .await;
    let create = server
        .mock("POST", "/1.0/containers")
        .expect(0)
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let err = client
        .migrate_container(
            &migration_source(vec!["default", "gpu"]),
            "dest",
            &MigrateOptions::default(),
            SyncPolicy::Sync,
            None,
        )
        .await
        .expect_err("missing profile");

    assert!(matches!(err, Error::MissingProfiles(missing) if missing == vec!["gpu".to_string()]));
    create.assert_async().await;
}

#[tokio::test]
async fn migrate_builds_a_pull_request() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/1.0/profiles")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"type":"sync","status":"Success","status_code":200,
                "metadata":["/1.0/profiles/default"]}"#,
        )
        .create_async()
        .await;
    let create = server
        .mock("POST", "/1.0/containers")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "name": "dest",
            "source": {
                "type": "migration",
                "mode": "pull",
                "operation": "wss://src.example:8443/1.0/operations/op-src/websocket",
                "secrets": {"control": "ctl"}
            }
        })))
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(accepted_envelope("op-7"))
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let outcome = client
        .migrate_container(
            &migration_source(vec!["default"]),
            "dest",
            &MigrateOptions::default(),
            SyncPolicy::Async,
            None,
        )
        .await
        .expect("migration accepted");

    assert!(!outcome.is_completed());
    create.assert_async().await;
}

#[tokio::test]
async fn init_migration_captures_the_source() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/1.0/containers/web")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"type":"sync","status":"Success","status_code":200,
                "metadata":{"name":"web","architecture":"x86_64",
                            "config":{"volatile.base_image":"feedbeef"},
                            "profiles":["default"],"ephemeral":false}}"#,
        )
        .create_async()
        .await;
    server
        .mock("POST", "/1.0/containers/web")
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"type":"async","status":"Operation created","status_code":100,
                "operation":"/1.0/operations/op-8",
                "metadata":{"id":"op-8","status":"Running","status_code":103,
                            "metadata":{"control":"ctl-secret","fs":"fs-secret"},
                            "may_cancel":true,"err":""}}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/1.0")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"type":"sync","status":"Success","status_code":200,
                "metadata":{"environment":{"certificate":"-----BEGIN CERTIFICATE-----"}}}"#,
        )
        .create_async()
        .await;

    let client = mock_client(&server).await;
    let source = client.init_migration("web").await.expect("capture");

    assert_eq!(source.architecture.as_deref(), Some("x86_64"));
    assert!(!source.snapshot);
    assert_eq!(source.profiles, vec!["default".to_string()]);
    assert_eq!(
        source.websocket_secrets.get("control").map(String::as_str),
        Some("ctl-secret")
    );
    assert_eq!(
        source.websocket_url,
        format!("{}/1.0/operations/op-8", server.url())
    );
    assert_eq!(source.certificate.as_deref(), Some("-----BEGIN CERTIFICATE-----"));
}
