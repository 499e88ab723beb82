use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router, serve,
};
use futures::{sink::SinkExt, stream::StreamExt};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::{BOT_NAME, SHOP_NAME};
use crate::constants;
use crate::conversation::Message;
use crate::error::ShopBotError;
use crate::orchestrator::TurnOrchestrator;
use crate::session::{spawn_sweeper, SessionStore};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

#[derive(Clone)]
pub struct AppState {
    templates: Arc<Environment<'static>>,
    orchestrator: Arc<TurnOrchestrator>,
    sessions: Arc<SessionStore>,
}

impl AppState {
    /// `session_ttl` of `None` keeps sessions for the life of the process.
    pub fn new(orchestrator: Arc<TurnOrchestrator>, session_ttl: Option<Duration>) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)
            .context("Failed to load index template")?;
        let sessions = match session_ttl {
            Some(ttl) => SessionStore::with_ttl(ttl),
            None => SessionStore::new(),
        };
        Ok(Self {
            templates: Arc::new(env),
            orchestrator,
            sessions: Arc::new(sessions),
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub has_greeted: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: String,
}

/// Events pushed to the widget over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Pending,
    Reply { content: String },
    Error { message: String },
}

pub struct ApiError(ShopBotError);

impl From<ShopBotError> for ApiError {
    fn from(err: ShopBotError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ShopBotError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ShopBotError::EmptyInput | ShopBotError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ShopBotError::Completion(_) | ShopBotError::Logging(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.user_message() }))).into_response()
    }
}

async fn index_handler(State(state): State<AppState>) -> Response {
    render_index(&state.templates)
}

fn render_index(templates: &Environment<'_>) -> Response {
    templates
        .get_template("index.html")
        .and_then(|tmpl| {
            tmpl.render(minijinja::context! {
                title => format!("🛍️ {} 🛍️", SHOP_NAME),
                caption => "🤖 AI 쇼핑 어시스턴트입니다.",
                bot_name => BOT_NAME,
            })
        })
        .map(|html| Html(html).into_response())
        .unwrap_or_else(|e| {
            error!("Failed to render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("Internal Server Error: {}", e))).into_response()
        })
}

async fn create_session(State(state): State<AppState>) -> Json<SessionView> {
    let conversation = state.orchestrator.new_conversation();
    let view = SessionView {
        session_id: conversation.id,
        has_greeted: conversation.has_greeted(),
        messages: conversation.messages().to_vec(),
    };
    state.sessions.insert(conversation).await;
    info!(session = %view.session_id, "Session created");
    Json(view)
}

async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.get(id).await?;
    let conversation = session.lock().await;
    Ok(Json(SessionView {
        session_id: id,
        has_greeted: conversation.has_greeted(),
        messages: conversation.messages().to_vec(),
    }))
}

async fn run_turn(state: &AppState, id: Uuid, text: &str) -> Result<String, ShopBotError> {
    if text.trim().is_empty() {
        return Err(ShopBotError::EmptyInput);
    }
    let session = state.sessions.get(id).await?;
    let mut conversation = session.lock().await;
    state.orchestrator.handle_turn(text, &mut conversation).await
}

async fn post_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let reply = run_turn(&state, id, &request.text).await?;
    Ok(Json(TurnResponse { reply }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Reject unknown sessions before upgrading.
    state.sessions.get(id).await?;
    info!(session = %id, "WebSocket connection upgrade requested");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => {
                info!(session = %id, "Client requested WebSocket close");
                break;
            }
            WsMessage::Binary(_) => {
                warn!("Received unexpected binary message from client");
                continue;
            }
            // Axum answers pings itself
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
        };

        let event = match serde_json::from_str::<TurnRequest>(&text) {
            Ok(request) => {
                if send_event(&mut sender, &ChatEvent::Pending).await.is_err() {
                    break;
                }
                match run_turn(&state, id, &request.text).await {
                    Ok(content) => ChatEvent::Reply { content },
                    Err(e) => {
                        error!(session = %id, error = %e, "Turn failed");
                        ChatEvent::Error { message: e.user_message().to_string() }
                    }
                }
            }
            Err(e) => {
                warn!("Malformed WebSocket message: {}", e);
                ChatEvent::Error { message: ShopBotError::MalformedRequest(e.to_string()).user_message().to_string() }
            }
        };

        if send_event(&mut sender, &event).await.is_err() {
            warn!("WebSocket client disconnected or send error. Closing connection.");
            break;
        }
    }
    info!(session = %id, "WebSocket connection closed");
}

async fn send_event<S>(sender: &mut S, event: &ChatEvent) -> Result<()>
where
    S: futures::Sink<WsMessage> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let json = serde_json::to_string(event)?;
    sender.send(WsMessage::Text(json)).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id/messages", get(get_messages))
        .route("/api/sessions/:id/turns", post(post_turn))
        .route("/ws/:id", get(ws_handler))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

pub async fn start_web_server(
    port: u16,
    orchestrator: Arc<TurnOrchestrator>,
    session_ttl: Option<Duration>,
) -> Result<()> {
    let state = AppState::new(orchestrator, session_ttl)?;
    let sweeper = session_ttl.map(|_| {
        spawn_sweeper(
            state.sessions.clone(),
            Duration::from_secs(constants::SESSION_SWEEP_INTERVAL_SECS),
        )
    });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    let served = serve(listener, app.into_make_service())
        .await
        .context("Web server failed");

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    served
}
