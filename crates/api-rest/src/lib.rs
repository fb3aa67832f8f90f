//! # API REST
//!
//! REST API for the citizen records service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI documentation
//! - REST-specific concerns (JSON bodies, header-based caller attestation, CORS)
//!
//! Invocations are forwarded unchanged to a [`citizen_core::Host`]; this crate adds no
//! business rules of its own.

#![warn(rust_2018_idioms)]

pub mod auth;

use axum::{
    extract::{Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use citizen_core::{CitizenError, ErrorKind, Host};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub host: Arc<dyn Host>,
    /// Resolved once at startup; `None` disables the gate.
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Positional arguments for one invocation.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct InvokeReq {
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvokeRes {
    /// Operation payload as text.
    pub payload: String,
    /// `ok`, or `not_unique` from `checkUnique`.
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    pub kind: String,
}

/// A failure returned to the client with a status derived from its kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorRes,
}

impl ApiError {
    fn unauthorised(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorRes {
                error: message.to_string(),
                kind: "unauthorised".into(),
            },
        }
    }

    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorRes {
                error: message,
                kind: ErrorKind::Store.as_str().into(),
            },
        }
    }
}

impl From<CitizenError> for ApiError {
    fn from(err: CitizenError) -> Self {
        let kind = err.kind();
        let status = if err.is_conflict() {
            StatusCode::CONFLICT
        } else {
            status_for(kind)
        };
        Self {
            status,
            body: ErrorRes {
                error: err.to_string(),
                kind: kind.as_str().into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Argument | ErrorKind::UnknownOperation => StatusCode::BAD_REQUEST,
        ErrorKind::Identity => StatusCode::UNAUTHORIZED,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::DuplicateId => StatusCode::CONFLICT,
        ErrorKind::CorruptRecord | ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, invoke, query),
    components(schemas(HealthRes, InvokeReq, InvokeRes, ErrorRes))
)]
pub struct ApiDoc;

/// Builds the REST router over `state`.
///
/// The OpenAPI document is served at `/api-docs/openapi.json`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/invoke/:operation", post(invoke))
        .route("/query/:operation", post(query))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Reports whether the service is up and which record variant it stores. Used by load
/// balancers; it does not touch the ledger.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: format!(
            "{} ({} records)",
            citizen_core::constants::HEARTBEAT_PAYLOAD,
            state.host.variant()
        ),
    })
}

#[utoipa::path(
    post,
    path = "/invoke/{operation}",
    request_body = InvokeReq,
    params(("operation" = String, Path, description = "Operation name, current or legacy")),
    responses(
        (status = 200, description = "Invocation committed", body = InvokeRes),
        (status = 400, description = "Bad arguments or unknown operation", body = ErrorRes),
        (status = 401, description = "Missing caller identity or API key", body = ErrorRes),
        (status = 403, description = "Permission denied", body = ErrorRes),
        (status = 404, description = "Citizen or sub-record not found", body = ErrorRes),
        (status = 409, description = "Duplicate ID or unresolved conflict", body = ErrorRes),
        (status = 500, description = "Corrupt record or ledger failure", body = ErrorRes)
    )
)]
/// Run a mutating operation in its own committed transaction.
#[axum::debug_handler]
async fn invoke(
    State(state): State<AppState>,
    AxumPath(operation): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<InvokeReq>,
) -> Result<Json<InvokeRes>, ApiError> {
    run(state, headers, operation, req.args, Entry::Invoke).await
}

#[utoipa::path(
    post,
    path = "/query/{operation}",
    request_body = InvokeReq,
    params(("operation" = String, Path, description = "Operation name, current or legacy")),
    responses(
        (status = 200, description = "Query result", body = InvokeRes),
        (status = 400, description = "Bad arguments or unknown operation", body = ErrorRes),
        (status = 401, description = "Missing caller identity or API key", body = ErrorRes),
        (status = 403, description = "Permission denied", body = ErrorRes),
        (status = 404, description = "Citizen or key not found", body = ErrorRes),
        (status = 500, description = "Corrupt record or ledger failure", body = ErrorRes)
    )
)]
/// Run a read-only operation; nothing it writes is kept.
#[axum::debug_handler]
async fn query(
    State(state): State<AppState>,
    AxumPath(operation): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<InvokeReq>,
) -> Result<Json<InvokeRes>, ApiError> {
    run(state, headers, operation, req.args, Entry::Query).await
}

#[derive(Clone, Copy)]
enum Entry {
    Invoke,
    Query,
}

async fn run(
    state: AppState,
    headers: HeaderMap,
    operation: String,
    args: Vec<String>,
    entry: Entry,
) -> Result<Json<InvokeRes>, ApiError> {
    auth::validate_api_key(state.api_key.as_deref(), &headers).map_err(ApiError::unauthorised)?;
    let caller = auth::caller_attributes(&headers);

    // Commit retries spin on the world-state lock, so keep them off the async workers.
    let host = Arc::clone(&state.host);
    let outcome = tokio::task::spawn_blocking(move || match entry {
        Entry::Invoke => host.invoke(&caller, &operation, &args),
        Entry::Query => host.query(&caller, &operation, &args),
    })
    .await
    .map_err(|e| {
        tracing::error!("invocation task failed: {:?}", e);
        ApiError::internal("Internal error".into())
    })?;

    match outcome {
        Ok(response) => Ok(Json(InvokeRes {
            payload: response.payload_text(),
            status: response.status.as_str().into(),
        })),
        Err(e) => {
            tracing::debug!(kind = e.kind().as_str(), "invocation failed: {e}");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use citizen_core::{host_for, InMemoryLedger, RecordVariant, ServiceConfig};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(api_key: Option<&str>) -> Router {
        let config = Arc::new(ServiceConfig::for_variant(RecordVariant::Health));
        let host = host_for(config, InMemoryLedger::new()).unwrap();
        router(AppState {
            host,
            api_key: api_key.map(str::to_string),
        })
    }

    fn call(path: &str, role: Option<&str>, args: &[&str]) -> Request<Body> {
        let mut builder = Request::post(path)
            .header("content-type", "application/json")
            .header(auth::USERNAME_HEADER, "tester");
        if let Some(role) = role {
            builder = builder.header(auth::ROLE_HEADER, role);
        }
        let body = serde_json::json!({ "args": args }).to_string();
        builder.body(Body::from(body)).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_variant() {
        let app = app(None);
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(body["message"].as_str().unwrap().contains("health"));
    }

    #[tokio::test]
    async fn create_then_read_round_trip() {
        let app = app(None);

        let (status, body) = send(
            &app,
            call(
                "/invoke/create",
                Some("govt_admin"),
                &["P1", "1990-01-01", "M"],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(
            &app,
            call("/query/getRedactedEntity", Some("person"), &["P1"]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let citizen: serde_json::Value =
            serde_json::from_str(body["payload"].as_str().unwrap()).unwrap();
        assert_eq!(citizen["personid"], "P1");
        assert_eq!(citizen["dob"], "1990-01-01");

        let (_, body) = send(&app, call("/query/checkUnique", Some("anyone"), &["P1"])).await;
        assert_eq!(body["status"], "not_unique");
        assert_eq!(body["payload"], "false");
    }

    #[tokio::test]
    async fn errors_map_to_status_by_kind() {
        let app = app(None);

        let (status, body) = send(
            &app,
            call("/invoke/create", Some("person"), &["P1", "d", "g"]),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "permission_denied");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Permission denied. create"));

        let (status, body) = send(&app, call("/invoke/create", None, &["P1", "d", "g"])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "identity");

        let (status, _) = send(&app, call("/query/getFullEntity", Some("person"), &["P9"])).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, call("/query/create", Some("govt_admin"), &[])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "unknown_operation");
    }

    #[tokio::test]
    async fn api_key_gate_applies_when_configured() {
        let app = app(Some("secret"));

        let (status, _) = send(&app, call("/query/heartbeat", Some("person"), &[])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut request = call("/query/heartbeat", Some("person"), &[]);
        request
            .headers_mut()
            .insert(auth::API_KEY_HEADER, "secret".parse().unwrap());
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payload"], "Alive!!!");
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let app = app(None);
        let request = Request::get("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/invoke/{operation}").is_some());
    }
}
