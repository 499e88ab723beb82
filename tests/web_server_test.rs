mod common;

use axum::http::StatusCode;
use axum_test::{TestServer, TestServerConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use common::{orchestrator, FakeCompletion, FakeLogger};
use shopbot::catalog::{GREETINGS, HOW_CAN_I_HELP};
use shopbot::web_server::{router, AppState, ChatEvent, SessionView, TurnResponse};
use shopbot::{Role, ShopBotError};

fn server(completion: Arc<FakeCompletion>) -> TestServer {
    let bot = orchestrator(completion, Arc::new(FakeLogger::default()));
    let state = AppState::new(Arc::new(bot), None).unwrap();
    TestServer::new(router(state)).unwrap()
}

// WebSocket upgrades need a real HTTP listener.
fn ws_server(completion: Arc<FakeCompletion>) -> TestServer {
    let bot = orchestrator(completion, Arc::new(FakeLogger::default()));
    let state = AppState::new(Arc::new(bot), None).unwrap();
    let config = TestServerConfig::builder().http_transport().build();
    TestServer::new_with_config(router(state), config).unwrap()
}

async fn new_session(server: &TestServer) -> SessionView {
    server.post("/api/sessions").await.json::<SessionView>()
}

#[tokio::test]
async fn test_index_renders_widget() {
    let server = server(Arc::new(FakeCompletion::default()));
    let response = server.get("/").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("🛍️ Trendy Fashion 🛍️"));
    assert!(html.contains("AI 쇼핑 어시스턴트입니다."));
}

#[tokio::test]
async fn test_create_session_returns_greeting() {
    let server = server(Arc::new(FakeCompletion::default()));
    let view = new_session(&server).await;

    assert!(!view.has_greeted);
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].role, Role::Assistant);
    assert_eq!(view.messages[0].content, GREETINGS);
}

#[tokio::test]
async fn test_turns_and_history_round_trip() {
    let completion = Arc::new(FakeCompletion::default());
    let server = server(completion.clone());
    let view = new_session(&server).await;
    let base = format!("/api/sessions/{}", view.session_id);

    let first = server
        .post(&format!("{}/turns", base))
        .json(&json!({"text": "안녕하세요"}))
        .await
        .json::<TurnResponse>();
    let second = server
        .post(&format!("{}/turns", base))
        .json(&json!({"text": "hello"}))
        .await
        .json::<TurnResponse>();

    assert_eq!(first.reply, "model reply #1");
    assert_eq!(second.reply, HOW_CAN_I_HELP);
    assert_eq!(completion.calls(), 1);

    let history = server.get(&format!("{}/messages", base)).await.json::<SessionView>();
    let contents: Vec<&str> = history.messages.iter().map(|m| m.content.as_str()).collect();
    assert!(history.has_greeted);
    assert_eq!(contents, vec![GREETINGS, "안녕하세요", "model reply #1", "hello", HOW_CAN_I_HELP]);
}

#[tokio::test]
async fn test_sessions_do_not_share_greeting_flag() {
    let completion = Arc::new(FakeCompletion::default());
    let server = server(completion.clone());
    let a = new_session(&server).await;
    let b = new_session(&server).await;

    for id in [a.session_id, b.session_id] {
        let reply = server
            .post(&format!("/api/sessions/{}/turns", id))
            .json(&json!({"text": "hi"}))
            .await
            .json::<TurnResponse>();
        assert_ne!(reply.reply, HOW_CAN_I_HELP);
    }
    assert_eq!(completion.calls(), 2);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let server = server(Arc::new(FakeCompletion::default()));
    let response = server
        .post(&format!("/api/sessions/{}/turns", Uuid::new_v4()))
        .json(&json!({"text": "hi"}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_text_is_bad_request() {
    let server = server(Arc::new(FakeCompletion::default()));
    let view = new_session(&server).await;
    let response = server
        .post(&format!("/api/sessions/{}/turns", view.session_id))
        .json(&json!({"text": "   "}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_completion_failure_is_bad_gateway_with_generic_message() {
    let server = server(Arc::new(FakeCompletion::failing()));
    let view = new_session(&server).await;
    let response = server
        .post(&format!("/api/sessions/{}/turns", view.session_id))
        .json(&json!({"text": "드레스 있나요?"}))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body = response.json::<serde_json::Value>();
    assert!(!body["error"].as_str().unwrap().contains("service unavailable"));

    let history = server
        .get(&format!("/api/sessions/{}/messages", view.session_id))
        .await
        .json::<SessionView>();
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[1].role, Role::User);
}

#[tokio::test]
async fn test_idle_session_expires() {
    let bot = orchestrator(Arc::new(FakeCompletion::default()), Arc::new(FakeLogger::default()));
    let state = AppState::new(Arc::new(bot), Some(Duration::from_millis(50))).unwrap();
    let server = TestServer::new(router(state.clone())).unwrap();
    let view = new_session(&server).await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    server
        .post(&format!("/api/sessions/{}/turns", view.session_id))
        .json(&json!({"text": "hi"}))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/sessions/{}/messages", view.session_id))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert!(state.sessions().is_empty().await);
}

#[tokio::test]
async fn test_page_loads_do_not_accumulate_expired_sessions() {
    let bot = orchestrator(Arc::new(FakeCompletion::default()), Arc::new(FakeLogger::default()));
    let state = AppState::new(Arc::new(bot), Some(Duration::from_millis(50))).unwrap();
    let server = TestServer::new(router(state.clone())).unwrap();

    for _ in 0..20 {
        new_session(&server).await;
    }
    tokio::time::sleep(Duration::from_millis(150)).await;
    new_session(&server).await;

    assert_eq!(state.sessions().len().await, 1);
}

#[tokio::test]
async fn test_websocket_pending_then_reply() {
    let completion = Arc::new(FakeCompletion::default());
    let server = ws_server(completion.clone());
    let view = new_session(&server).await;

    let mut socket = server
        .get_websocket(&format!("/ws/{}", view.session_id))
        .await
        .into_websocket()
        .await;

    socket.send_json(&json!({"text": "hi"})).await;
    assert_eq!(socket.receive_json::<ChatEvent>().await, ChatEvent::Pending);
    assert_eq!(
        socket.receive_json::<ChatEvent>().await,
        ChatEvent::Reply { content: "model reply #1".to_string() }
    );

    socket.send_json(&json!({"text": "hello"})).await;
    assert_eq!(socket.receive_json::<ChatEvent>().await, ChatEvent::Pending);
    assert_eq!(
        socket.receive_json::<ChatEvent>().await,
        ChatEvent::Reply { content: HOW_CAN_I_HELP.to_string() }
    );
    assert_eq!(completion.calls(), 1);

    let history = server
        .get(&format!("/api/sessions/{}/messages", view.session_id))
        .await
        .json::<SessionView>();
    assert_eq!(history.messages.len(), 5);
}

#[tokio::test]
async fn test_websocket_reports_failed_turn() {
    let server = ws_server(Arc::new(FakeCompletion::failing()));
    let view = new_session(&server).await;

    let mut socket = server
        .get_websocket(&format!("/ws/{}", view.session_id))
        .await
        .into_websocket()
        .await;

    socket.send_json(&json!({"text": "드레스 있나요?"})).await;
    assert_eq!(socket.receive_json::<ChatEvent>().await, ChatEvent::Pending);
    match socket.receive_json::<ChatEvent>().await {
        ChatEvent::Error { message } => assert!(!message.contains("service unavailable")),
        other => panic!("expected an error event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_websocket_malformed_frame() {
    let completion = Arc::new(FakeCompletion::default());
    let server = ws_server(completion.clone());
    let view = new_session(&server).await;

    let mut socket = server
        .get_websocket(&format!("/ws/{}", view.session_id))
        .await
        .into_websocket()
        .await;

    socket.send_json(&json!({"txt": "hi"})).await;
    match socket.receive_json::<ChatEvent>().await {
        ChatEvent::Error { message } => {
            assert_eq!(message, ShopBotError::MalformedRequest(String::new()).user_message());
        }
        other => panic!("expected an error event, got {:?}", other),
    }
    assert_eq!(completion.calls(), 0);
}

#[tokio::test]
async fn test_websocket_unknown_session_is_not_found() {
    let server = ws_server(Arc::new(FakeCompletion::default()));

    server
        .get_websocket(&format!("/ws/{}", Uuid::new_v4()))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
