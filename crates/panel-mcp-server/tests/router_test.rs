//! Integration tests for the session router.

use std::collections::HashSet;
use std::time::Duration;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use panel_mcp_server::SESSION_HEADER;
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;

use common::{ScriptedPanel, delete, get, initialize_request, post, test_router};

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Initialize a session and return its id
async fn open_session(router: &panel_mcp_server::SessionRouter) -> String {
    let response = router
        .clone()
        .into_router()
        .oneshot(post(&initialize_request(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string()
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
}

// ============================================================================
// Session creation
// ============================================================================

#[tokio::test]
async fn test_initialize_creates_session() {
    let (router, _) = test_router(ScriptedPanel::new());

    let response = router
        .clone()
        .into_router()
        .oneshot(post(&initialize_request(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let id = response
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap();
    assert!(!id.is_empty());

    let json = body_json(response).await;
    assert_eq!(json["id"], 1);
    assert_eq!(json["result"]["protocolVersion"], "2025-06-18");
    assert!(json["result"]["capabilities"]["tools"].is_object());

    assert_eq!(router.session_count().await, 1);
    assert!(router.lookup(&id).await.is_some());
}

#[tokio::test]
async fn test_post_without_session_rejected() {
    let (router, panel) = test_router(ScriptedPanel::new());

    let response = router
        .clone()
        .into_router()
        .oneshot(post(&tool_call(5, "get-daemons", json!({})), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(SESSION_HEADER).is_none());
    assert_eq!(
        body_json(response).await,
        json!({
            "jsonrpc": "2.0",
            "error": { "code": -32000, "message": "Bad Request: No valid session ID provided" },
            "id": null
        })
    );
    assert_eq!(router.session_count().await, 0);
    assert!(panel.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_with_unknown_session_rejected() {
    let (router, _) = test_router(ScriptedPanel::new());

    let response = router
        .clone()
        .into_router()
        .oneshot(post(&initialize_request(), Some("no-such-session")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], -32000);
    assert_eq!(router.session_count().await, 0);
}

/// Request carrying a session header that is not visible ASCII
fn with_unreadable_session(
    method: &str,
    body: axum::body::Body,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .header(
            SESSION_HEADER,
            axum::http::HeaderValue::from_bytes(b"stale-\xff").unwrap(),
        )
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn test_initialize_with_unreadable_session_rejected() {
    let (router, _) = test_router(ScriptedPanel::new());

    let body = axum::body::Body::from(initialize_request().to_string());
    let response = router
        .clone()
        .into_router()
        .oneshot(with_unreadable_session("POST", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(SESSION_HEADER).is_none());
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], -32000);
    assert!(json["id"].is_null());
    assert_eq!(router.session_count().await, 0);
}

#[tokio::test]
async fn test_get_and_delete_with_unreadable_session_rejected() {
    let (router, _) = test_router(ScriptedPanel::new());
    let id = open_session(&router).await;

    for method in ["GET", "DELETE"] {
        let response = router
            .clone()
            .into_router()
            .oneshot(with_unreadable_session(method, axum::body::Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid or missing session ID");
    }
    assert!(router.lookup(&id).await.is_some());
}

#[tokio::test]
async fn test_unparseable_body() {
    let (router, _) = test_router(ScriptedPanel::new());

    let request = axum::http::Request::post("/mcp")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{oops"))
        .unwrap();
    let response = router.clone().into_router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], -32700);
    assert_eq!(router.session_count().await, 0);
}

#[tokio::test]
async fn test_failed_handshake_leaves_no_session() {
    let (router, _) = test_router(ScriptedPanel::new());

    let bad_init = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}});
    let response = router
        .clone()
        .into_router()
        .oneshot(post(&bad_init, None))
        .await
        .unwrap();

    assert!(response.headers().get(SESSION_HEADER).is_none());
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], -32602);
    assert_eq!(router.session_count().await, 0);
}

#[tokio::test]
async fn test_session_ids_are_distinct() {
    let (router, _) = test_router(ScriptedPanel::new());

    let mut ids = HashSet::new();
    for _ in 0..20 {
        ids.insert(open_session(&router).await);
    }

    assert_eq!(ids.len(), 20);
    assert_eq!(router.session_count().await, 20);
}

#[tokio::test]
async fn test_notification_is_accepted() {
    let (router, _) = test_router(ScriptedPanel::new());
    let id = open_session(&router).await;

    let response = router
        .clone()
        .into_router()
        .oneshot(post(
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            Some(&id),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

// ============================================================================
// Tool calls
// ============================================================================

#[tokio::test]
async fn test_start_instance_over_session() {
    let (router, panel) = test_router(
        ScriptedPanel::new().respond("instance_action", 200, json!({"status": 200, "data": true})),
    );
    let id = open_session(&router).await;

    let response = router
        .clone()
        .into_router()
        .oneshot(post(
            &tool_call(2, "start-instance", json!({"daemonId": "d1", "instanceId": "i1"})),
            Some(&id),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], 2);
    assert_eq!(json["result"]["isError"], false);
    assert_eq!(
        json["result"]["content"][0]["text"],
        "Successfully started instance `i1`"
    );
    assert_eq!(*panel.calls.lock().unwrap(), vec!["instance_action"]);
}

#[tokio::test]
async fn test_upstream_failure_is_tool_error() {
    let (router, _) = test_router(ScriptedPanel::new().respond(
        "instance_action",
        500,
        json!({"status": 500, "data": "Instance is busy"}),
    ));
    let id = open_session(&router).await;

    let response = router
        .clone()
        .into_router()
        .oneshot(post(
            &tool_call(3, "stop-instance", json!({"daemonId": "d1", "instanceId": "i1"})),
            Some(&id),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"]["isError"], true);
    let text = json["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("500"));
    assert!(text.contains("Instance is busy"));
}

#[tokio::test]
async fn test_missing_arguments_never_reach_panel() {
    let (router, panel) = test_router(ScriptedPanel::new());
    let id = open_session(&router).await;

    let response = router
        .clone()
        .into_router()
        .oneshot(post(
            &tool_call(4, "send-command", json!({"daemonId": "d1", "instanceId": "i1"})),
            Some(&id),
        ))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], -32602);
    assert!(panel.calls.lock().unwrap().is_empty());
}

// ============================================================================
// Notification stream
// ============================================================================

#[tokio::test]
async fn test_get_with_valid_session_streams() {
    let (router, _) = test_router(ScriptedPanel::new());
    let id = open_session(&router).await;

    let response = router
        .clone()
        .into_router()
        .oneshot(get(Some(&id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let second = router
        .clone()
        .into_router()
        .oneshot(get(Some(&id)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_with_unknown_session() {
    let (router, _) = test_router(ScriptedPanel::new());

    for session in [None, Some("nope")] {
        let response = router
            .clone()
            .into_router()
            .oneshot(get(session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid or missing session ID");
    }
}

#[tokio::test]
async fn test_delete_ends_stream() {
    let (router, _) = test_router(ScriptedPanel::new());
    let id = open_session(&router).await;

    let stream = router
        .clone()
        .into_router()
        .oneshot(get(Some(&id)))
        .await
        .unwrap();

    let response = router
        .clone()
        .into_router()
        .oneshot(delete(Some(&id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let collected = tokio::time::timeout(Duration::from_secs(2), stream.into_body().collect()).await;
    assert!(collected.is_ok());
}

// ============================================================================
// Termination
// ============================================================================

#[tokio::test]
async fn test_delete_removes_session() {
    let (router, _) = test_router(ScriptedPanel::new());
    let id = open_session(&router).await;

    let response = router
        .clone()
        .into_router()
        .oneshot(delete(Some(&id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(router.session_count().await, 0);

    let after = router
        .clone()
        .into_router()
        .oneshot(post(&json!({"jsonrpc": "2.0", "id": 9, "method": "ping"}), Some(&id)))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_unknown_session() {
    let (router, _) = test_router(ScriptedPanel::new());
    let id = open_session(&router).await;

    let response = router
        .clone()
        .into_router()
        .oneshot(delete(Some("nope")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid or missing session ID");
    assert!(router.lookup(&id).await.is_some());
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let (router, _) = test_router(ScriptedPanel::new());
    let keep = open_session(&router).await;
    let gone = open_session(&router).await;

    router.teardown(&gone).await;
    router.teardown(&gone).await;
    router.teardown("never-issued").await;

    assert_eq!(router.session_count().await, 1);
    assert!(router.lookup(&keep).await.is_some());
}
