//! Route handlers. Each one decodes the request, makes a single engine or
//! store call, and serializes the result.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use gatehouse_core::store::DEFAULT_EVENT_LIMIT;
use gatehouse_core::{
    AccessEvent, ContactDetails, Decision, DecisionEngine, EnrolledIdentity, EnrollmentRequest,
    FailureKind, GatehouseError, IdentityId,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    engine: DecisionEngine,
}

/// Builds the router (separate from `main` so tests can drive it directly).
pub fn app(engine: DecisionEngine) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/access", post(decide_access))
        .route("/access-events", get(list_access_events))
        .route("/identities", get(list_identities).post(enroll_identity))
        .route("/identities/:identity_id/access", post(check_identity_access))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

#[derive(Serialize)]
struct HealthStatus {
    status: String,
}

async fn health_check() -> impl IntoResponse {
    let health = HealthStatus {
        status: "ok".to_string(),
    };
    (StatusCode::OK, Json(health))
}

/// Body of `POST /access`. A missing or empty encoding means no face was found.
#[derive(Deserialize)]
struct AccessRequest {
    #[serde(default)]
    encoding: Option<Vec<f64>>,
}

#[derive(Serialize)]
struct DecisionResponse {
    #[serde(flatten)]
    decision: Decision,
    message: String,
}

impl IntoResponse for DecisionResponse {
    fn into_response(self) -> Response {
        let status = match self.decision {
            Decision::Error {
                failure: FailureKind::InvalidProbe,
                ..
            } => StatusCode::UNPROCESSABLE_ENTITY,
            Decision::Error {
                failure: FailureKind::StorageUnavailable,
                ..
            } => StatusCode::SERVICE_UNAVAILABLE,
            Decision::Error {
                failure: FailureKind::Internal,
                ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        };
        (status, Json(self)).into_response()
    }
}

impl From<Decision> for DecisionResponse {
    fn from(decision: Decision) -> Self {
        let message = decision.summary();
        Self { decision, message }
    }
}

async fn decide_access(
    State(state): State<AppState>,
    Json(request): Json<AccessRequest>,
) -> DecisionResponse {
    state
        .engine
        .decide(request.encoding.as_deref())
        .await
        .into()
}

async fn check_identity_access(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
) -> DecisionResponse {
    state
        .engine
        .check_access(&IdentityId::from(identity_id))
        .await
        .into()
}

/// Listing view of an identity; the template itself is never returned.
#[derive(Serialize)]
struct IdentitySummary {
    identity_id: IdentityId,
    display_name: String,
    allowed_start: String,
    allowed_end: String,
    #[serde(flatten)]
    contact: ContactDetails,
    enrolled_at: DateTime<Utc>,
}

impl From<&EnrolledIdentity> for IdentitySummary {
    fn from(identity: &EnrolledIdentity) -> Self {
        Self {
            identity_id: identity.identity_id.clone(),
            display_name: identity.display_name.clone(),
            allowed_start: identity.window.start_str(),
            allowed_end: identity.window.end_str(),
            contact: identity.contact.clone(),
            enrolled_at: identity.enrolled_at,
        }
    }
}

async fn enroll_identity(
    State(state): State<AppState>,
    Json(request): Json<EnrollmentRequest>,
) -> Result<(StatusCode, Json<IdentitySummary>), ApiError> {
    let identity = state.engine.enroll(request).await?;
    Ok((StatusCode::CREATED, Json(IdentitySummary::from(&identity))))
}

async fn list_identities(
    State(state): State<AppState>,
) -> Result<Json<Vec<IdentitySummary>>, ApiError> {
    let identities = state.engine.templates().list_all().await?;
    Ok(Json(identities.iter().map(IdentitySummary::from).collect()))
}

/// Upper bound on `?limit=` for `GET /access-events`.
const MAX_EVENT_LIMIT: usize = 1000;

#[derive(Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

async fn list_access_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<AccessEvent>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);
    Ok(Json(state.engine.logger().list_events(limit).await?))
}

/// Maps engine errors onto HTTP status codes.
struct ApiError(GatehouseError);

impl From<GatehouseError> for ApiError {
    fn from(err: GatehouseError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatehouseError::DuplicateIdentity(_) => StatusCode::CONFLICT,
            GatehouseError::DimensionMismatch { .. }
            | GatehouseError::InvalidTimeWindow { .. }
            | GatehouseError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatehouseError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatehouseError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::warn!(error = %self.0, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
