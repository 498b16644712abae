//! REST endpoints driving registration sessions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::debug;
use uuid::Uuid;

use super::error::AppError;
use crate::api::RegistrationApi;
use crate::controller::{FlowView, RegistrationController};
use crate::flow::{Field, FlowConfig, LinkParams};
use crate::host::{CloseSignal, MiniAppHost};
use crate::sessions::{SessionHandle, SessionStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub api: Arc<dyn RegistrationApi>,
    pub flow: FlowConfig,
}

/// Body returned by every session endpoint.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub view: FlowView,
    /// The front-end should close the mini-app.
    pub close_requested: bool,
}

impl SessionResponse {
    fn new(session_id: Uuid, handle: &SessionHandle, view: FlowView) -> Self {
        Self {
            session_id,
            view,
            close_requested: handle.close_signal.is_requested(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EditFieldBody {
    field: Field,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ConsentBody {
    accepted: bool,
}

/// Build the signup router.
pub fn signup_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/fields", put(edit_field))
        .route("/api/sessions/{id}/consent", put(set_consent))
        .route("/api/sessions/{id}/submit", post(submit))
        .route("/api/sessions/{id}/back", post(back))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "signup-flow"
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

/// POST /api/sessions?chat_id=..&phone=..
///
/// Opens a flow from the entry link's query parameters. Runs the status
/// check before answering.
async fn open_session(
    State(state): State<AppState>,
    Query(params): Query<LinkParams>,
) -> impl IntoResponse {
    let close_signal = Arc::new(CloseSignal::new());
    let host: Arc<dyn MiniAppHost> = close_signal.clone();
    let controller =
        RegistrationController::open(state.flow, &params, Arc::clone(&state.api), Some(host)).await;

    let handle = SessionHandle {
        controller: Arc::new(controller),
        close_signal,
    };
    let view = handle.controller.view();
    let id = state.sessions.insert(handle.clone()).await;

    (StatusCode::CREATED, Json(SessionResponse::new(id, &handle, view)))
}

async fn session(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or(AppError::SessionNotFound(id))
}

/// GET /api/sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = session(&state, id).await?;
    let view = handle.controller.view();
    Ok(Json(SessionResponse::new(id, &handle, view)))
}

/// PUT /api/sessions/{id}/fields
async fn edit_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<EditFieldBody>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = session(&state, id).await?;
    debug!(session_id = %id, field = %body.field, "Field edited");
    let view = handle.controller.edit(body.field, body.value)?;
    Ok(Json(SessionResponse::new(id, &handle, view)))
}

/// PUT /api/sessions/{id}/consent
async fn set_consent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ConsentBody>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = session(&state, id).await?;
    let view = handle.controller.set_consent(body.accepted)?;
    Ok(Json(SessionResponse::new(id, &handle, view)))
}

/// POST /api/sessions/{id}/submit
async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = session(&state, id).await?;
    let view = handle.controller.submit().await?;
    Ok(Json(SessionResponse::new(id, &handle, view)))
}

/// POST /api/sessions/{id}/back
async fn back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = session(&state, id).await?;
    let view = handle.controller.back()?;
    Ok(Json(SessionResponse::new(id, &handle, view)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::api::{
        ApiReply, CheckCodeRequest, RegistrationRequest, RegistrationStatus, SendCodeRequest,
        StatusRequest,
    };
    use crate::error::ApiError;

    struct AcceptAll;

    #[async_trait]
    impl RegistrationApi for AcceptAll {
        async fn check_status(&self, _: &StatusRequest) -> Result<RegistrationStatus, ApiError> {
            Ok(RegistrationStatus::new_user())
        }
        async fn send_code(&self, _: &SendCodeRequest) -> Result<ApiReply<Option<String>>, ApiError> {
            Ok(ApiReply::Accepted(Some("r-1".into())))
        }
        async fn check_code(&self, _: &CheckCodeRequest) -> Result<ApiReply<()>, ApiError> {
            Ok(ApiReply::Accepted(()))
        }
        async fn register(&self, _: &RegistrationRequest) -> Result<ApiReply<()>, ApiError> {
            Ok(ApiReply::Accepted(()))
        }
    }

    fn app() -> Router {
        signup_routes(AppState {
            sessions: SessionStore::new(Duration::from_secs(60)),
            api: Arc::new(AcceptAll),
            flow: FlowConfig::verified(),
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, json) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn open_without_chat_id_is_invalid_link() {
        let (status, json) = call(&app(), Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["view"]["step"], "invalid_link");
        assert_eq!(json["view"]["can_submit"], false);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let uri = format!("/api/sessions/{}", Uuid::new_v4());
        let (status, json) = call(&app(), Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn email_step_round_trip() {
        let app = app();
        let (_, opened) = call(&app, Method::POST, "/api/sessions?chat_id=100", None).await;
        assert_eq!(opened["view"]["step"], "collecting_email");
        assert_eq!(opened["view"]["fields"][0]["name"], "email");
        let id = opened["session_id"].as_str().unwrap().to_string();

        let (status, edited) = call(
            &app,
            Method::PUT,
            &format!("/api/sessions/{id}/fields"),
            Some(json!({"field": "email", "value": "ivan@acme.kz"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["view"]["values"]["email"], "ivan@acme.kz");
        assert_eq!(edited["view"]["can_submit"], true);

        let (status, submitted) =
            call(&app, Method::POST, &format!("/api/sessions/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(submitted["view"]["step"], "collecting_code");
        assert_eq!(submitted["view"]["can_go_back"], true);

        let (status, back) = call(&app, Method::POST, &format!("/api/sessions/{id}/back"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(back["view"]["step"], "collecting_email");
    }

    #[tokio::test]
    async fn back_from_email_is_conflict() {
        let app = app();
        let (_, opened) = call(&app, Method::POST, "/api/sessions?chat_id=100", None).await;
        let id = opened["session_id"].as_str().unwrap().to_string();
        let (status, _) = call(&app, Method::POST, &format!("/api/sessions/{id}/back"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn editing_field_of_other_step_is_bad_request() {
        let app = app();
        let (_, opened) = call(&app, Method::POST, "/api/sessions?chat_id=100", None).await;
        let id = opened["session_id"].as_str().unwrap().to_string();
        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/api/sessions/{id}/fields"),
            Some(json!({"field": "username", "value": "ivan"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
