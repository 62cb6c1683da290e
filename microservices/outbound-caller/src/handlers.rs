//! API Handlers for outbound call endpoints
//!
//! Uniform `ApiResponse` wrapper for every route.

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};
use voxpool_core::VoxpoolError;
use voxpool_telemetry::{Counter, CounterSnapshot};

use crate::initiator::{CallInitiator, CallOutcome, CallRequest};
use crate::redeployer::{FlowDeploymentState, FlowRedeployer};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(msg: impl Into<String>, code: &'static str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
            code: Some(code),
        }
    }
}

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn error_response(err: &VoxpoolError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::error(err.to_string(), err.error_code())))
}

/// Request counters exposed on `/stats`
#[derive(Clone)]
pub struct Metrics {
    pub calls_initiated: Counter,
    pub calls_failed: Counter,
    pub flows_deployed: Counter,
    pub deploys_failed: Counter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            calls_initiated: Counter::new("calls_initiated"),
            calls_failed: Counter::new("calls_failed"),
            flows_deployed: Counter::new("flows_deployed"),
            deploys_failed: Counter::new("deploys_failed"),
        }
    }
}

impl Metrics {
    fn snapshot(&self) -> Vec<CounterSnapshot> {
        vec![
            self.calls_initiated.snapshot(),
            self.calls_failed.snapshot(),
            self.flows_deployed.snapshot(),
            self.deploys_failed.snapshot(),
        ]
    }
}

#[derive(Clone)]
pub struct AppState {
    pub initiator: Arc<CallInitiator>,
    pub redeployer: Arc<FlowRedeployer>,
    pub metrics: Metrics,
    /// Platform credentials present; reported by `/ready`
    pub credentials_configured: bool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/stats", get(stats))
        // Call initiation
        .route("/initiate-outgoing-call", post(initiate_outgoing_call))
        // Utilities
        .route("/utilities/deploy-studio-flow", post(deploy_studio_flow))
        .with_state(state)
}

// =============================================================================
// Health Handlers
// =============================================================================

/// Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({
        "status": "healthy"
    })))
}

/// Readiness check
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.credentials_configured {
        (StatusCode::OK, Json(serde_json::json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "reason": "TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN not configured"
            })),
        )
    }
}

async fn stats(State(state): State<AppState>) -> Json<ApiResponse<Vec<CounterSnapshot>>> {
    Json(ApiResponse::success(state.metrics.snapshot()))
}

// =============================================================================
// Call Handlers
// =============================================================================

/// Call request from either a form post or a JSON body
pub struct CallRequestPayload(pub CallRequest);

impl<S> FromRequest<S> for CallRequestPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        let parsed = if is_json {
            Json::<CallRequest>::from_request(req, state)
                .await
                .map(|Json(body)| body)
                .map_err(|rejection| rejection.body_text())
        } else {
            Form::<CallRequest>::from_request(req, state)
                .await
                .map(|Form(body)| body)
                .map_err(|rejection| rejection.body_text())
        };

        parsed.map(Self).map_err(|reason| {
            error_response(&VoxpoolError::Validation(format!("Invalid call request: {}", reason)))
        })
    }
}

pub async fn initiate_outgoing_call(
    State(state): State<AppState>,
    CallRequestPayload(request): CallRequestPayload,
) -> Result<Json<ApiResponse<CallOutcome>>, ApiError> {
    match state.initiator.initiate(request).await {
        Ok(outcome) => {
            state.metrics.calls_initiated.inc();
            Ok(Json(ApiResponse::success(outcome)))
        }
        Err(e) => {
            state.metrics.calls_failed.inc();
            warn!(error = %e, "Outgoing call not initiated");
            Err(error_response(&e))
        }
    }
}

pub async fn deploy_studio_flow(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FlowDeploymentState>>, ApiError> {
    match state.redeployer.redeploy().await {
        Ok(deployment) => {
            state.metrics.flows_deployed.inc();
            Ok(Json(ApiResponse::success(deployment)))
        }
        Err(e) => {
            state.metrics.deploys_failed.inc();
            error!(error = %e, "Studio flow redeploy failed");
            Err(error_response(&e))
        }
    }
}
