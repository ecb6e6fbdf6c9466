//! JSON endpoints for reservations, modal sessions and verification

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::server::AppState;
use crate::error::ReserveError;
use crate::reservation::{Availability, ReservationRequest};
use crate::verification::VerifyOutcome;
use crate::workflow::{FlowSnapshot, FormField, ReservationFlow};

/// Error body returned by every JSON endpoint
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub reason: String,
}

impl ApiError {
    fn session_not_found(id: &Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            reason: format!("Reservation session {} not found", id),
        }
    }
}

impl From<ReserveError> for ApiError {
    fn from(err: ReserveError) -> Self {
        let status = match &err {
            ReserveError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ReserveError::Conflict { .. } => StatusCode::CONFLICT,
            ReserveError::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            reason: err.user_message(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            other => other.status(),
        };
        Self {
            status,
            reason: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "reason": self.reason }))).into_response()
    }
}

#[derive(Serialize)]
pub struct ReservedBody {
    pub username: String,
}

#[derive(Deserialize)]
pub struct AvailabilityParams {
    #[serde(default)]
    pub username: String,
}

/// A flow snapshot tagged with its session id
#[derive(Serialize)]
pub struct SessionView {
    pub id: Uuid,
    #[serde(flatten)]
    pub snapshot: FlowSnapshot,
}

#[derive(Deserialize)]
pub struct FieldEdit {
    pub field: FormField,
    pub value: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub visitor_id: Option<Uuid>,
}

/// GET /health
pub async fn health() -> &'static str {
    "Reservation Server Running"
}

/// POST /reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservedBody>), ApiError> {
    let Json(request) = payload.map_err(|e| {
        debug!("Rejected reservation body: {}", e.body_text());
        ApiError::from(e)
    })?;
    match state.reservations.reserve(&request).await {
        Ok(reservation) => Ok((
            StatusCode::CREATED,
            Json(ReservedBody {
                username: reservation.username,
            }),
        )),
        Err(e) => {
            match &e {
                ReserveError::Transient { message } => {
                    error!("Reservation of '{}' failed: {}", request.username, message)
                }
                other => debug!("Reservation of '{}' refused: {}", request.username, other),
            }
            Err(e.into())
        }
    }
}

/// GET /reservations/availability?username=
pub async fn check_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Availability>, ApiError> {
    let availability = state
        .reservations
        .checker()
        .check(&params.username)
        .await
        .map_err(|e| {
            warn!("Availability check for '{}' failed: {}", params.username, e);
            ApiError::from(e)
        })?;
    Ok(Json(availability))
}

fn view(id: Uuid, flow: &ReservationFlow) -> Json<SessionView> {
    Json(SessionView {
        id,
        snapshot: flow.snapshot(),
    })
}

/// POST /sessions - open the reservation modal
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let (id, flow) = state.flows.create();
    (StatusCode::CREATED, view(id, &flow))
}

/// GET /sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let flow = state.flows.get(&id).ok_or_else(|| ApiError::session_not_found(&id))?;
    Ok(view(id, &flow))
}

/// POST /sessions/:id/open - reopen a closed modal, keeping entered values
pub async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let flow = state.flows.get(&id).ok_or_else(|| ApiError::session_not_found(&id))?;
    flow.open();
    Ok(view(id, &flow))
}

/// PATCH /sessions/:id - edit one field
pub async fn edit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<FieldEdit>, JsonRejection>,
) -> Result<Json<SessionView>, ApiError> {
    let Json(edit) = payload?;
    let flow = state.flows.get(&id).ok_or_else(|| ApiError::session_not_found(&id))?;
    if !flow.edit(edit.field, edit.value) {
        debug!("Ignored edit on session {} while locked", id);
    }
    Ok(view(id, &flow))
}

/// POST /sessions/:id/submit
pub async fn submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let flow = state.flows.get(&id).ok_or_else(|| ApiError::session_not_found(&id))?;
    let outcome = flow.submit().await;
    debug!("Session {} submit finished: {:?}", id, outcome);
    Ok(view(id, &flow))
}

/// DELETE /sessions/:id - close the modal
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let flow = state.flows.get(&id).ok_or_else(|| ApiError::session_not_found(&id))?;
    flow.close();
    Ok(view(id, &flow))
}

/// POST /verify
pub async fn verify(
    State(state): State<AppState>,
    body: Option<Json<VerifyRequest>>,
) -> Json<VerifyOutcome> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    Json(state.verification.verify(request.visitor_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::web::server::{build_state, router};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        router(build_state(AppConfig::default()))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn reservation(username: &str, email: &str) -> Value {
        json!({ "username": username, "discordHandle": "john#1234", "email": email })
    }

    #[tokio::test]
    async fn test_reservation_status_codes() {
        let app = app();

        let (status, body) = call(&app, Method::POST, "/reservations", Some(reservation("John_Doe", "john@example.com"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "John_Doe");

        let (status, body) = call(&app, Method::POST, "/reservations", Some(reservation("john_doe", "john@example.com"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["reason"], "This username is already taken.");

        let (status, body) = call(&app, Method::POST, "/reservations", Some(reservation("ab", "john@example.com"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["reason"], "Username must be at least 3 characters.");

        let (status, body) = call(&app, Method::POST, "/reservations", Some(reservation("new_name", "not-an-email"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["reason"], "Please enter a valid email address.");
    }

    #[tokio::test]
    async fn test_missing_fields_report_first_reason() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/reservations", Some(json!({ "username": "john_doe" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["reason"], "Discord username is required.");
    }

    async fn call_raw(app: &Router, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_bad_bodies_get_json_reason() {
        let app = app();

        let (status, body) = call_raw(&app, "/reservations", Some("application/json"), r#"{"username": 5}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["reason"].is_string());

        let (status, body) = call_raw(&app, "/reservations", Some("application/json"), "{bad").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["reason"].is_string());

        let (status, body) = call_raw(&app, "/reservations", None, r#"{"username": "john_doe"}"#).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["reason"].as_str().unwrap().contains("Content-Type"));
    }

    #[tokio::test]
    async fn test_bad_field_edit_gets_json_reason() {
        let app = app();
        let (_, body) = call(&app, Method::POST, "/sessions", None).await;
        let path = format!("/sessions/{}", body["id"].as_str().unwrap());

        let (status, body) = call(&app, Method::PATCH, &path, Some(json!({ "field": "nickname", "value": "x" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["reason"].is_string());
    }

    #[tokio::test]
    async fn test_availability_endpoint() {
        let app = app();

        let (status, body) = call(&app, Method::GET, "/reservations/availability?username=free_name", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], true);

        let (_, body) = call(&app, Method::GET, "/reservations/availability?username=a-b-c", None).await;
        assert_eq!(body["available"], false);
        assert_eq!(body["reason"], "Only letters, numbers, and underscores are allowed.");
    }

    #[tokio::test]
    async fn test_session_flow() {
        let app = app();

        let (status, body) = call(&app, Method::POST, "/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["open"], true);
        assert_eq!(body["state"]["status"], "idle");
        assert_eq!(body["canSubmit"], false);
        let id = body["id"].as_str().unwrap().to_string();
        let path = format!("/sessions/{}", id);

        for (field, value) in [("username", "john_doe"), ("discordUsername", "john#1234"), ("email", "nope")] {
            call(&app, Method::PATCH, &path, Some(json!({ "field": field, "value": value }))).await;
        }

        let (_, body) = call(&app, Method::POST, &format!("{}/submit", path), None).await;
        assert_eq!(body["state"]["status"], "failed");
        assert_eq!(body["state"]["reason"], "Please enter a valid email address.");

        let (_, body) = call(&app, Method::PATCH, &path, Some(json!({ "field": "email", "value": "john@example.com" }))).await;
        assert_eq!(body["state"]["status"], "idle");
        assert_eq!(body["form"]["discordHandle"], "john#1234");

        let (_, body) = call(&app, Method::POST, &format!("{}/submit", path), None).await;
        assert_eq!(body["state"]["status"], "secured");
        assert_eq!(body["state"]["username"], "john_doe");

        // The overlay cannot be dismissed during the success display
        let (_, body) = call(&app, Method::DELETE, &path, None).await;
        assert_eq!(body["open"], true);

        let (_, body) = call(&app, Method::GET, "/reservations/availability?username=JOHN_DOE", None).await;
        assert_eq!(body["reason"], "This username is already taken.");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = app();
        let (status, body) = call(&app, Method::GET, &format!("/sessions/{}", Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["reason"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_verify_endpoint() {
        let app = app();
        let visitor = Uuid::new_v4();

        let (status, body) = call(&app, Method::POST, "/verify", Some(json!({ "visitorId": visitor }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["visitorId"], visitor.to_string());
        assert_eq!(body["state"], "verified");
        assert_eq!(body["redirectTo"], "/");
        assert_eq!(body["redirectAfterMs"], 1000);

        let (status, body) = call(&app, Method::POST, "/verify", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["visitorId"].is_string());
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ReserveError::validation("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (ReserveError::Conflict { username: "x".to_string() }, StatusCode::CONFLICT),
            (ReserveError::Transient { message: "x".to_string() }, StatusCode::SERVICE_UNAVAILABLE),
            (ReserveError::ConfigValidation { message: "x".to_string() }, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }
}
